//! Read-only view of a compiled protobuf descriptor tree.
//!
//! [`DescriptorSet`] is a flat arena: message and enum types live in one
//! table and fields refer to them by [`TypeId`]. It deserializes from JSON
//! and can be built by hand or converted from another descriptor API.

use serde::{Deserialize, Serialize};

use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Bytes,
    Uint32,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
    Message(TypeId),
    Enum(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLabel {
    #[default]
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name:   String,
    pub number: i32,
    pub kind:   FieldKind,
    #[serde(default)]
    pub label:  FieldLabel,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, number: i32, kind: FieldKind) -> Self {
        FieldDescriptor {
            name: name.into(),
            number,
            kind,
            label: FieldLabel::Optional,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = FieldLabel::Repeated;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == FieldLabel::Repeated
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageOptions {
    #[serde(default)]
    pub map_entry: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub full_name: String,
    #[serde(default)]
    pub fields:    Vec<FieldDescriptor>,
    #[serde(default)]
    pub options:   MessageOptions,
}

impl MessageDescriptor {
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name:   String,
    pub number: i32,
}

impl EnumValueDescriptor {
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        EnumValueDescriptor {
            name: name.into(),
            number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub full_name: String,
    pub values:    Vec<EnumValueDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name:             String,
    pub input:            TypeId,
    pub output:           TypeId,
    #[serde(default)]
    pub client_streaming: bool,
    #[serde(default)]
    pub server_streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name:    String,
    pub methods: Vec<MethodDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DescriptorType {
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl DescriptorType {
    pub fn full_name(&self) -> &str {
        match self {
            DescriptorType::Message(m) => &m.full_name,
            DescriptorType::Enum(e) => &e.full_name,
        }
    }
}

/// The tree the reverse resolver walks.
pub trait DescriptorTree {
    /// Package every full name in the tree is qualified with.
    fn package(&self) -> &str;
    fn services(&self) -> &[ServiceDescriptor];
    fn message(&self, id: TypeId) -> Option<&MessageDescriptor>;
    fn enumeration(&self, id: TypeId) -> Option<&EnumDescriptor>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    pub package:  String,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
    #[serde(default)]
    types:        Vec<DescriptorType>,
}

impl DescriptorSet {
    pub fn new(package: impl Into<String>) -> Self {
        DescriptorSet {
            package:  package.into(),
            services: Vec::new(),
            types:    Vec::new(),
        }
    }

    pub fn add_message(&mut self, full_name: impl Into<String>) -> TypeId {
        self.push(DescriptorType::Message(MessageDescriptor {
            full_name: full_name.into(),
            fields:    Vec::new(),
            options:   MessageOptions::default(),
        }))
    }

    /// Adds the synthetic `key`/`value` entry message of a map field.
    pub fn add_map_entry(
        &mut self,
        full_name: impl Into<String>,
        key: FieldKind,
        value: FieldKind,
    ) -> TypeId {
        self.push(DescriptorType::Message(MessageDescriptor {
            full_name: full_name.into(),
            fields:    vec![
                FieldDescriptor::new("key", 1, key),
                FieldDescriptor::new("value", 2, value),
            ],
            options:   MessageOptions { map_entry: true },
        }))
    }

    pub fn add_enum(&mut self, full_name: impl Into<String>, values: Vec<EnumValueDescriptor>) -> TypeId {
        self.push(DescriptorType::Enum(EnumDescriptor {
            full_name: full_name.into(),
            values,
        }))
    }

    fn push(&mut self, ty: DescriptorType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn message_mut(&mut self, id: TypeId) -> Option<&mut MessageDescriptor> {
        match self.types.get_mut(id.index()) {
            Some(DescriptorType::Message(m)) => Some(m),
            _ => None,
        }
    }

    /// Appends a field to a message; returns `false` if `id` is not a message.
    pub fn push_field(&mut self, id: TypeId, field: FieldDescriptor) -> bool {
        match self.message_mut(id) {
            Some(m) => {
                m.fields.push(field);
                true
            }
            None => false,
        }
    }

    pub fn add_service(&mut self, service: ServiceDescriptor) {
        self.services.push(service);
    }

    pub fn find(&self, full_name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.full_name() == full_name)
            .map(|i| TypeId(i as u32))
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &DescriptorType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }
}

impl DescriptorTree for DescriptorSet {
    fn package(&self) -> &str {
        &self.package
    }

    fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    fn message(&self, id: TypeId) -> Option<&MessageDescriptor> {
        match self.types.get(id.index()) {
            Some(DescriptorType::Message(m)) => Some(m),
            _ => None,
        }
    }

    fn enumeration(&self, id: TypeId) -> Option<&EnumDescriptor> {
        match self.types.get(id.index()) {
            Some(DescriptorType::Enum(e)) => Some(e),
            _ => None,
        }
    }
}
