//! Reverse direction: compiled descriptors → IR with Rust type names.
//!
//! Type names are flattened relative to the package (`pkg.Outer.Inner` →
//! `Outer_Inner`). Scalar kinds are collapsed to one host integer and one
//! host float type, since the output feeds client type annotations rather
//! than wire encoding.

use protofox_schema::{
    Cardinality, DescriptorTree, FieldDefinition, FieldDescriptor, FieldKind, MessageDefinition,
    MethodDefinition, SchemaDefinition, ServiceDefinition, ServiceDescriptor, TypeId, TypeKey,
};
use tracing::debug;

use crate::{
    error::SchemaError,
    utils::{flatten_name, quote},
};

pub const HOST_INT:    &str = "i64";
pub const HOST_FLOAT:  &str = "f64";
pub const HOST_BOOL:   &str = "bool";
pub const HOST_STRING: &str = "String";
pub const HOST_BYTES:  &str = "Vec<u8>";

/// Host type for a scalar field kind; `None` for messages, enums and groups.
pub fn host_scalar(kind: FieldKind) -> Option<&'static str> {
    match kind {
        FieldKind::Double | FieldKind::Float => Some(HOST_FLOAT),
        FieldKind::Int64
        | FieldKind::Uint64
        | FieldKind::Int32
        | FieldKind::Fixed64
        | FieldKind::Fixed32
        | FieldKind::Uint32
        | FieldKind::Sfixed32
        | FieldKind::Sfixed64
        | FieldKind::Sint32
        | FieldKind::Sint64 => Some(HOST_INT),
        FieldKind::Bool => Some(HOST_BOOL),
        FieldKind::String => Some(HOST_STRING),
        FieldKind::Bytes => Some(HOST_BYTES),
        FieldKind::Group | FieldKind::Message(_) | FieldKind::Enum(_) => None,
    }
}

pub struct ClientBuilder<'t, T: DescriptorTree + ?Sized> {
    tree:   &'t T,
    schema: SchemaDefinition,
}

impl<'t, T: DescriptorTree + ?Sized> ClientBuilder<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        ClientBuilder {
            tree,
            schema: SchemaDefinition::new(tree.package()),
        }
    }

    /// Resolves every service in the tree, in order.
    pub fn build(mut self) -> Result<SchemaDefinition, SchemaError> {
        let tree = self.tree;
        for service in tree.services() {
            self.add_service(service)?;
        }
        Ok(self.schema)
    }

    pub fn add_service(&mut self, service: &ServiceDescriptor) -> Result<&mut Self, SchemaError> {
        let mut definition = ServiceDefinition::new(service.name.clone());
        for method in &service.methods {
            let request  = self.resolve_message(method.input)?.name.clone();
            let response = self.resolve_message(method.output)?.name.clone();
            definition.methods.push(MethodDefinition {
                name:               method.name.clone(),
                request_type_name:  request,
                response_type_name: response,
                cardinality:        Cardinality::from_streaming(method.client_streaming, method.server_streaming),
                client_streaming:   method.client_streaming,
                server_streaming:   method.server_streaming,
            });
        }
        self.schema.services.push(definition);
        Ok(self)
    }

    pub fn class_name(&self, full_name: &str) -> String {
        flatten_name(full_name, self.tree.package())
    }

    pub fn resolve_message(&mut self, id: TypeId) -> Result<&MessageDefinition, SchemaError> {
        let key = TypeKey::Declared(id);
        if !self.schema.messages.contains(&key) {
            // Roll back placeholders left by a failed walk
            let (messages, enums) = (self.schema.messages.len(), self.schema.enums.len());
            if let Err(err) = self.register_message(id) {
                self.schema.messages.truncate(messages);
                self.schema.enums.truncate(enums);
                return Err(err);
            }
        }
        self.schema
            .messages
            .get(&key)
            .ok_or_else(|| SchemaError::UnknownType(format!("message #{}", id.0)))
    }

    /// Enum members keep their declared numbers as indices.
    pub fn resolve_enum(&mut self, id: TypeId) -> Result<&MessageDefinition, SchemaError> {
        let key = TypeKey::Declared(id);
        if !self.schema.enums.contains(&key) {
            let tree = self.tree;
            let descriptor = tree
                .enumeration(id)
                .ok_or_else(|| SchemaError::UnknownType(format!("enum #{}", id.0)))?;

            let mut definition = MessageDefinition::new(self.class_name(&descriptor.full_name));
            for value in &descriptor.values {
                if definition.fields.iter().any(|f| f.index == value.number) {
                    return Err(SchemaError::DuplicateIndexOrOrdinal {
                        owner: descriptor.full_name.clone(),
                        index: value.number,
                    });
                }
                definition.fields.push(FieldDefinition::member(value.name.clone(), value.number));
            }

            debug!(name = %definition.name, "registered enum");
            self.schema.enums.insert(key, definition);
        }
        self.schema
            .enums
            .get(&key)
            .ok_or_else(|| SchemaError::UnknownType(format!("enum #{}", id.0)))
    }

    pub fn finish(self) -> SchemaDefinition {
        self.schema
    }

    fn register_message(&mut self, id: TypeId) -> Result<(), SchemaError> {
        let tree = self.tree;
        let descriptor = tree
            .message(id)
            .ok_or_else(|| SchemaError::UnknownType(format!("message #{}", id.0)))?;
        let key = TypeKey::Declared(id);
        let name = self.class_name(&descriptor.full_name);

        self.schema.messages.insert(key, MessageDefinition::new(name.clone()));
        debug!(name = %name, full_name = %descriptor.full_name, "registered message");

        let mut fields = Vec::with_capacity(descriptor.fields.len());
        for (i, field) in descriptor.fields.iter().enumerate() {
            let type_name = self.type_name(field, &descriptor.full_name)?;
            fields.push(FieldDefinition::new(field.name.clone(), i as i32 + 1, type_name));
        }

        if let Some(message) = self.schema.messages.get_mut(&key) {
            message.fields = fields;
        }
        Ok(())
    }

    fn type_name(&mut self, field: &FieldDescriptor, owner: &str) -> Result<String, SchemaError> {
        let tree = self.tree;

        if let FieldKind::Message(id) = field.kind {
            if let Some(entry) = tree.message(id).filter(|m| m.options.map_entry) {
                let key = entry
                    .field_named("key")
                    .ok_or_else(|| unsupported("map entry without key", field, owner))?;
                let value = entry
                    .field_named("value")
                    .ok_or_else(|| unsupported("map entry without value", field, owner))?;
                let key_name = self.type_name(key, &entry.full_name)?;
                let value_name = self.type_name(value, &entry.full_name)?;
                return Ok(format!("HashMap<{}, {}>", key_name, value_name));
            }
        }

        let base = match field.kind {
            FieldKind::Message(id) => self.resolve_message(id)?.name.clone(),
            FieldKind::Enum(id) => self.resolve_enum(id)?.name.clone(),
            kind => match host_scalar(kind) {
                Some(name) => name.to_string(),
                None => return Err(unsupported(&format!("{:?}", kind), field, owner)),
            },
        };

        if field.is_repeated() {
            Ok(format!("Vec<{}>", base))
        } else {
            Ok(base)
        }
    }
}

fn unsupported(what: &str, field: &FieldDescriptor, owner: &str) -> SchemaError {
    SchemaError::UnsupportedType(format!("{} (field {} of {})", what, quote(&field.name), quote(owner)))
}
