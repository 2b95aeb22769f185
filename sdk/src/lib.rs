//! protofox
//!
//! Facade over the schema translator.
//!
//! - Forward: `.pfm` model files or programmatic [`ModelSet`]s → protobuf IR
//!   → `.proto` text,
//! - Reverse: compiled descriptor trees → IR with Rust type names → client
//!   stubs,
//! - JSON dumps of any IR or descriptor tree.

use serde::Serialize;

pub use protofox_compiler::error::SchemaError;
pub use protofox_compiler::{
    assemble, compile_descriptors, compile_models, render_client, render_proto, ClientBuilder,
    DescriptorSource, JsonDescriptorSource, OutputDir, ProtoBuilder, Protoc,
};
pub use protofox_compiler::protoc::DEFAULT_PROGRAM as DEFAULT_PROTOC;
#[cfg(feature = "prost-reflect")]
pub use protofox_compiler::{descriptor_set_from_pool, FileDescriptorSetSource};
pub use protofox_schema::*;

/// Pretty-printed JSON for an IR or descriptor value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, SchemaError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Compiles a model file and renders one `.proto` text per package, as
/// `(package, text)` pairs.
pub fn models_to_proto(text: &str, default_package: &str) -> Result<Vec<(String, String)>, SchemaError> {
    Ok(compile_models(text, default_package)?
        .iter()
        .map(|schema| (schema.package.clone(), render_proto(schema)))
        .collect())
}

/// Loads the descriptors of `package` and renders the Rust client stubs.
pub fn descriptors_to_client(source: &dyn DescriptorSource, package: &str) -> Result<String, SchemaError> {
    let tree = source.load(package)?;
    let schema = compile_descriptors(&tree)?;
    Ok(render_client(&schema))
}

pub mod error {
    pub use protofox_compiler::error::SchemaError;
}

pub mod schema {
    pub use protofox_schema::{
        FieldDefinition, MessageDefinition, MethodDefinition, SchemaDefinition, ServiceDefinition,
    };
}
