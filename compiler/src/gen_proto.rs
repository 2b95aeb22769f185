use std::collections::BTreeSet;

use protofox_schema::{MessageDefinition, SchemaDefinition, TIMESTAMP, WRAPPER_TYPES};

/// Renders a forward schema as a proto3 source file.
pub fn render_proto(schema: &SchemaDefinition) -> String {
    let mut proto: Vec<String> = Vec::new();

    proto.push("syntax = \"proto3\";".to_string());
    proto.push("".to_string());
    if !schema.package.is_empty() {
        proto.push(format!("package {};", schema.package));
        proto.push("".to_string());
    }

    let imports = imports(schema);
    if !imports.is_empty() {
        for import in &imports {
            proto.push(format!("import \"{}\";", import));
        }
        proto.push("".to_string());
    }

    for service in &schema.services {
        proto.push(format!("service {} {{", service.name));
        for method in &service.methods {
            proto.push(format!(
                "  rpc {}({}) returns ({});",
                method.name, method.request_type_name, method.response_type_name
            ));
        }
        proto.push("}".to_string());
        proto.push("".to_string());
    }

    for message in schema.messages.values() {
        render_message(message, &mut proto);
        proto.push("".to_string());
    }

    for definition in schema.enums.values() {
        proto.push(format!("enum {} {{", definition.name));
        for member in &definition.fields {
            proto.push(format!("  {} = {};", member.name, member.index));
        }
        proto.push("}".to_string());
        proto.push("".to_string());
    }

    while proto.last().map_or(false, |line| line.is_empty()) {
        proto.pop();
    }
    proto.join("\n") + "\n"
}

fn render_message(message: &MessageDefinition, proto: &mut Vec<String>) {
    if message.fields.is_empty() {
        proto.push(format!("message {} {{}}", message.name));
        return;
    }

    proto.push(format!("message {} {{", message.name));
    let indent = match &message.one_of {
        Some(group) => {
            proto.push(format!("  oneof {} {{", group));
            "    "
        }
        None => "  ",
    };
    for field in &message.fields {
        proto.push(format!("{}{} {} = {};", indent, field.type_name, field.name, field.index));
    }
    if message.one_of.is_some() {
        proto.push("  }".to_string());
    }
    proto.push("}".to_string());
}

// Well-known files referenced by any field or method type.
fn imports(schema: &SchemaDefinition) -> BTreeSet<&'static str> {
    let mut names: Vec<&str> = Vec::new();
    for message in schema.messages.values() {
        names.extend(message.fields.iter().map(|f| f.type_name.as_str()));
    }
    for service in &schema.services {
        for method in &service.methods {
            names.push(&method.request_type_name);
            names.push(&method.response_type_name);
        }
    }

    let mut imports = BTreeSet::new();
    for name in names {
        if name.contains(TIMESTAMP) {
            imports.insert("google/protobuf/timestamp.proto");
        }
        if WRAPPER_TYPES.iter().any(|(_, wrapper)| name.contains(wrapper)) {
            imports.insert("google/protobuf/wrappers.proto");
        }
    }
    imports
}
