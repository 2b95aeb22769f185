use std::collections::HashSet;

use protofox_schema::{is_scalar_name, is_well_known, MessageDefinition, SchemaDefinition};

use crate::{error::SchemaError, utils::quote};

/// Checks field indices and enum ordinals. Message indices must be positive
/// and unique; enum ordinals must be unique.
pub fn verify_schema(schema: &SchemaDefinition) -> Result<(), SchemaError> {
    for message in schema.messages.values() {
        check_indices(message, true)?;
    }
    for definition in schema.enums.values() {
        check_indices(definition, false)?;
    }
    Ok(())
}

fn check_indices(definition: &MessageDefinition, positive: bool) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in &definition.fields {
        if positive && field.index <= 0 {
            return Err(SchemaError::VerifierError(format!(
                "The id for field {} must be positive",
                quote(&field.name)
            )));
        }
        if !seen.insert(field.index) {
            return Err(SchemaError::DuplicateIndexOrOrdinal {
                owner: definition.name.clone(),
                index: field.index,
            });
        }
    }
    Ok(())
}

/// Checks that every type named by a field or method of a protobuf schema
/// is a scalar, a well-known type, or a registered message or enum.
pub fn verify_references(schema: &SchemaDefinition) -> Result<(), SchemaError> {
    for message in schema.messages.values() {
        for field in &message.fields {
            check_type(schema, &field.type_name).map_err(|name| {
                SchemaError::VerifierError(format!(
                    "The type {} is not defined for field {}",
                    quote(&name),
                    quote(&field.name)
                ))
            })?;
        }
    }

    for service in &schema.services {
        for method in &service.methods {
            for type_name in [&method.request_type_name, &method.response_type_name] {
                check_type(schema, type_name).map_err(|name| {
                    SchemaError::VerifierError(format!(
                        "The type {} is not defined for method {}",
                        quote(&name),
                        quote(&method.name)
                    ))
                })?;
            }
        }
    }
    Ok(())
}

// Returns the first undefined name inside `type_name`.
fn check_type(schema: &SchemaDefinition, type_name: &str) -> Result<(), String> {
    let mut name = type_name.trim();
    for qualifier in ["stream ", "repeated ", "optional "] {
        if let Some(rest) = name.strip_prefix(qualifier) {
            name = rest.trim();
        }
    }

    if let Some(inner) = name.strip_prefix("map<").and_then(|rest| rest.strip_suffix('>')) {
        return match inner.split_once(',') {
            Some((key, value)) => {
                check_type(schema, key)?;
                check_type(schema, value)
            }
            None => Err(name.to_string()),
        };
    }

    if is_scalar_name(name) || is_well_known(name) || schema.defines(name) {
        Ok(())
    } else {
        Err(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protofox_schema::{FieldDefinition, MethodDefinition, ServiceDefinition, TypeId, TypeKey, Cardinality};

    fn message(name: &str, fields: Vec<FieldDefinition>) -> MessageDefinition {
        let mut m = MessageDefinition::new(name);
        m.fields = fields;
        m
    }

    #[test]
    fn accepts_well_formed_schema() {
        let mut schema = SchemaDefinition::new("shop");
        schema.messages.insert(TypeKey::Declared(TypeId(0)), message("Item", vec![
            FieldDefinition::new("id", 1, "uint32"),
            FieldDefinition::new("attrs", 2, "map<string, Status>"),
            FieldDefinition::new("seen", 3, "optional google.protobuf.Timestamp"),
            FieldDefinition::new("next", 4, "repeated Item"),
        ]));
        schema.enums.insert(TypeKey::Declared(TypeId(1)), message("Status", vec![
            FieldDefinition::member("UNKNOWN", 0),
        ]));
        let mut service = ServiceDefinition::new("Catalog");
        service.methods.push(MethodDefinition {
            name:               "Watch".into(),
            request_type_name:  "Item".into(),
            response_type_name: "stream Item".into(),
            cardinality:        Cardinality::UnaryStream,
            client_streaming:   false,
            server_streaming:   true,
        });
        schema.services.push(service);

        verify_schema(&schema).unwrap();
        verify_references(&schema).unwrap();
    }

    #[test]
    fn rejects_duplicate_and_zero_indices() {
        let mut schema = SchemaDefinition::new("shop");
        schema.messages.insert(TypeKey::Declared(TypeId(0)), message("Item", vec![
            FieldDefinition::new("a", 1, "string"),
            FieldDefinition::new("b", 1, "string"),
        ]));
        assert!(matches!(
            verify_schema(&schema),
            Err(SchemaError::DuplicateIndexOrOrdinal { index: 1, .. })
        ));

        let mut schema = SchemaDefinition::new("shop");
        schema.messages.insert(TypeKey::Declared(TypeId(0)), message("Item", vec![
            FieldDefinition::new("a", 0, "string"),
        ]));
        assert!(matches!(verify_schema(&schema), Err(SchemaError::VerifierError(_))));
    }

    #[test]
    fn rejects_undefined_references() {
        let mut schema = SchemaDefinition::new("shop");
        schema.messages.insert(TypeKey::Declared(TypeId(0)), message("Item", vec![
            FieldDefinition::new("attrs", 1, "map<string, Missing>"),
        ]));
        match verify_references(&schema) {
            Err(SchemaError::VerifierError(msg)) => {
                assert_eq!(msg, "The type \"Missing\" is not defined for field \"attrs\"");
            }
            other => panic!("expected verifier error, got {:?}", other),
        }
    }
}
