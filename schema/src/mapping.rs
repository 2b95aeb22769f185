//! Scalar and wrapper correspondences between model types and protobuf.

use serde::{Deserialize, Serialize};

pub const TIMESTAMP: &str = "google.protobuf.Timestamp";
pub const EMPTY:     &str = "google.protobuf.Empty";

/// Scalar and constrained-numeric model types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Text,
    Int,
    Float,
    Double,
    Bool,
    Bytes,
    DateTime,
    Uint32,
    Uint64,
    Int32,
    Int64,
}

pub const SCALAR_TYPES: [(Scalar, &str); 11] = [
    (Scalar::Text,     "string"),
    (Scalar::Int,      "int32"),
    (Scalar::Float,    "float"),
    (Scalar::Bool,     "bool"),
    (Scalar::Bytes,    "bytes"),
    (Scalar::DateTime, TIMESTAMP),
    (Scalar::Uint32,   "uint32"),
    (Scalar::Uint64,   "uint64"),
    (Scalar::Int32,    "int32"),
    (Scalar::Int64,    "int64"),
    (Scalar::Double,   "double"),
];

pub const WRAPPER_TYPES: [(Scalar, &str); 9] = [
    (Scalar::Bool,   "google.protobuf.BoolValue"),
    (Scalar::Bytes,  "google.protobuf.BytesValue"),
    (Scalar::Double, "google.protobuf.DoubleValue"),
    (Scalar::Float,  "google.protobuf.FloatValue"),
    (Scalar::Int32,  "google.protobuf.Int32Value"),
    (Scalar::Int64,  "google.protobuf.Int64Value"),
    (Scalar::Text,   "google.protobuf.StringValue"),
    (Scalar::Uint32, "google.protobuf.UInt32Value"),
    (Scalar::Uint64, "google.protobuf.UInt64Value"),
];

/// Spelling of each scalar in `.pfm` model files.
const KEYWORDS: [(Scalar, &str); 11] = [
    (Scalar::Text,     "string"),
    (Scalar::Int,      "int"),
    (Scalar::Float,    "float"),
    (Scalar::Double,   "double"),
    (Scalar::Bool,     "bool"),
    (Scalar::Bytes,    "bytes"),
    (Scalar::DateTime, "datetime"),
    (Scalar::Uint32,   "uint32"),
    (Scalar::Uint64,   "uint64"),
    (Scalar::Int32,    "int32"),
    (Scalar::Int64,    "int64"),
];

impl Scalar {
    pub fn idl_name(self) -> &'static str {
        SCALAR_TYPES
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }

    /// Reverse lookup; `int32` maps back to the plain integer.
    pub fn from_idl_name(name: &str) -> Option<Scalar> {
        SCALAR_TYPES.iter().find(|(_, n)| *n == name).map(|(s, _)| *s)
    }

    /// Well-known wrapper used for an optional value of this scalar.
    pub fn wrapper_name(self) -> Option<&'static str> {
        WRAPPER_TYPES.iter().find(|(s, _)| *s == self).map(|(_, name)| *name)
    }

    pub fn keyword(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, kw)| *kw)
            .unwrap_or_default()
    }

    pub fn from_keyword(keyword: &str) -> Option<Scalar> {
        KEYWORDS.iter().find(|(_, kw)| *kw == keyword).map(|(s, _)| *s)
    }

    /// Whether protobuf accepts this scalar as a map key.
    pub fn is_map_key(self) -> bool {
        !matches!(self, Scalar::Float | Scalar::Double | Scalar::Bytes | Scalar::DateTime)
    }
}

/// Scalars whose optional form is spelled with a wrapper alias in model files.
pub fn wrapper_alias(alias: &str) -> Option<Scalar> {
    match alias {
        "BoolValue"   => Some(Scalar::Bool),
        "BytesValue"  => Some(Scalar::Bytes),
        "DoubleValue" => Some(Scalar::Double),
        "FloatValue"  => Some(Scalar::Float),
        "Int32Value"  => Some(Scalar::Int32),
        "Int64Value"  => Some(Scalar::Int64),
        "StringValue" => Some(Scalar::Text),
        "UInt32Value" => Some(Scalar::Uint32),
        "UInt64Value" => Some(Scalar::Uint64),
        _ => None,
    }
}

pub fn is_scalar_name(name: &str) -> bool {
    SCALAR_TYPES.iter().any(|(_, n)| *n == name)
}

pub fn is_well_known(name: &str) -> bool {
    name == TIMESTAMP || name == EMPTY || WRAPPER_TYPES.iter().any(|(_, n)| *n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names() {
        assert_eq!(Scalar::Text.idl_name(), "string");
        assert_eq!(Scalar::Int.idl_name(), "int32");
        assert_eq!(Scalar::Uint64.idl_name(), "uint64");
        assert_eq!(Scalar::DateTime.idl_name(), TIMESTAMP);
        assert_eq!(Scalar::from_idl_name("int32"), Some(Scalar::Int));
        assert_eq!(Scalar::from_idl_name("double"), Some(Scalar::Double));
        assert_eq!(Scalar::from_idl_name("sint32"), None);
    }

    #[test]
    fn wrappers_cover_nine_scalars() {
        assert_eq!(Scalar::Bool.wrapper_name(), Some("google.protobuf.BoolValue"));
        assert_eq!(Scalar::Uint32.wrapper_name(), Some("google.protobuf.UInt32Value"));
        assert_eq!(Scalar::Int.wrapper_name(), None);
        assert_eq!(Scalar::DateTime.wrapper_name(), None);
        for (scalar, name) in WRAPPER_TYPES {
            assert!(is_well_known(name));
            assert!(!is_scalar_name(name));
            assert!(scalar.wrapper_name().is_some());
        }
    }

    #[test]
    fn keywords_round_trip() {
        for (scalar, _) in SCALAR_TYPES {
            assert_eq!(Scalar::from_keyword(scalar.keyword()), Some(scalar));
        }
        assert_eq!(wrapper_alias("StringValue"), Some(Scalar::Text));
        assert_eq!(wrapper_alias("Timestamp"), None);
    }
}
