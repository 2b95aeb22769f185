use protofox_schema::{DescriptorTree, SchemaDefinition};
use tracing::info;

use crate::{
    assemble::assemble,
    error::SchemaError,
    lower::lower_models,
    parser::parse_schema,
    reverse::ClientBuilder,
    tokenizer::tokenize_schema,
    verifier::{verify_references, verify_schema},
};

/// Compile a `.pfm` model file into one protobuf schema per package.
/// `default_package` applies when the file has no `package` line.
/// Returns `Err(SchemaError)` if tokenization, parsing, resolution or
/// verification fails.
pub fn compile_models(text: &str, default_package: &str) -> Result<Vec<SchemaDefinition>, SchemaError> {
    let tokens = tokenize_schema(text)?;
    let file = parse_schema(&tokens)?;
    let lowered = lower_models(&file, default_package)?;
    let schemas = assemble(&lowered.models, &lowered.services)?;
    for schema in &schemas {
        verify_schema(schema)?;
        verify_references(schema)?;
    }
    info!(package = %lowered.package, schemas = schemas.len(), "compiled models");
    Ok(schemas)
}

/// Resolve a compiled descriptor tree into a client schema.
pub fn compile_descriptors<T: DescriptorTree + ?Sized>(tree: &T) -> Result<SchemaDefinition, SchemaError> {
    let schema = ClientBuilder::new(tree).build()?;
    verify_schema(&schema)?;
    info!(
        package = %schema.package,
        services = schema.services.len(),
        messages = schema.messages.len(),
        "resolved descriptors"
    );
    Ok(schema)
}
