use protofox_schema::{Cardinality, MessageDefinition, MethodDefinition, SchemaDefinition, ServiceDefinition};

use crate::utils::{to_pascal_case, to_snake_case};

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "break", "const", "continue", "crate", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while", "async", "await", "dyn",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Flattened nested names (`Outer_Inner`) are not camel case.
fn allow_attribute(name: &str, rust_code: &mut Vec<String>) {
    if name.contains('_') {
        rust_code.push("#[allow(non_camel_case_types)]".to_string());
    }
}

/// Singular message fields have presence; a direct self reference is boxed.
fn field_type(schema: &SchemaDefinition, owner: &str, type_name: &str) -> String {
    if schema.message_named(type_name).is_none() {
        type_name.to_string()
    } else if type_name == owner {
        format!("Option<Box<{}>>", type_name)
    } else {
        format!("Option<{}>", type_name)
    }
}

fn compile_struct(schema: &SchemaDefinition, message: &MessageDefinition, rust_code: &mut Vec<String>) {
    rust_code.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    allow_attribute(&message.name, rust_code);
    if message.fields.is_empty() {
        rust_code.push(format!("pub struct {} {{}}", message.name));
        return;
    }

    rust_code.push(format!("pub struct {} {{", message.name));
    for field in &message.fields {
        rust_code.push(format!(
            "    pub {}: {},",
            escape_rust_keyword(&to_snake_case(&field.name)),
            field_type(schema, &message.name, &field.type_name)
        ));
    }
    rust_code.push("}".to_string());
}

fn compile_enum(definition: &MessageDefinition, rust_code: &mut Vec<String>) {
    rust_code.push("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]".to_string());
    rust_code.push("#[repr(i32)]".to_string());
    allow_attribute(&definition.name, rust_code);
    rust_code.push(format!("pub enum {} {{", definition.name));
    for member in &definition.fields {
        rust_code.push(format!(
            "    {} = {},",
            escape_rust_keyword(&to_pascal_case(&member.name)),
            member.index
        ));
    }
    rust_code.push("}".to_string());
}

fn method_signature(method: &MethodDefinition) -> String {
    let name = escape_rust_keyword(&to_snake_case(&method.name));
    let request = &method.request_type_name;
    let response = &method.response_type_name;
    match method.cardinality {
        Cardinality::UnaryUnary => format!(
            "fn {}(&mut self, request: {}) -> Result<{}, Self::Error>;",
            name, request, response
        ),
        Cardinality::UnaryStream => format!(
            "fn {}(&mut self, request: {}) -> Result<Box<dyn Iterator<Item = {}>>, Self::Error>;",
            name, request, response
        ),
        Cardinality::StreamUnary => format!(
            "fn {}(&mut self, requests: Box<dyn Iterator<Item = {}>>) -> Result<{}, Self::Error>;",
            name, request, response
        ),
        Cardinality::StreamStream => format!(
            "fn {}(&mut self, requests: Box<dyn Iterator<Item = {}>>) -> Result<Box<dyn Iterator<Item = {}>>, Self::Error>;",
            name, request, response
        ),
    }
}

fn compile_service(service: &ServiceDefinition, rust_code: &mut Vec<String>) {
    rust_code.push(format!("pub trait {}Client {{", to_pascal_case(&service.name)));
    rust_code.push("    type Error;".to_string());
    for method in &service.methods {
        rust_code.push("".to_string());
        rust_code.push(format!("    /// `{}`", method.cardinality.as_str()));
        rust_code.push(format!("    {}", method_signature(method)));
    }
    rust_code.push("}".to_string());
}

/// Renders a reverse schema as Rust client types: one struct per message,
/// one enum per enum and one client trait per service.
pub fn render_client(schema: &SchemaDefinition) -> String {
    let mut rust_code: Vec<String> = Vec::new();

    rust_code.push(format!("// Client types for package `{}`.", schema.package));
    let uses_map = schema
        .messages
        .values()
        .flat_map(|m| m.fields.iter())
        .any(|f| f.type_name.contains("HashMap<"));
    if uses_map {
        rust_code.push("".to_string());
        rust_code.push("use std::collections::HashMap;".to_string());
    }

    for message in schema.messages.values() {
        rust_code.push("".to_string());
        compile_struct(schema, message, &mut rust_code);
    }

    for definition in schema.enums.values() {
        rust_code.push("".to_string());
        compile_enum(definition, &mut rust_code);
    }

    for service in &schema.services {
        rust_code.push("".to_string());
        compile_service(service, &mut rust_code);
    }

    rust_code.join("\n") + "\n"
}
