//! Forward direction: data models → protobuf IR.
//!
//! [`ProtoBuilder`] walks record fields, classifies each annotation once
//! (see [`crate::classify`]) and turns it into a protobuf type name,
//! registering every record, enum and synthesized one-of container it meets
//! along the way. Registration is keyed by the model's [`TypeId`], and a
//! record's entry is created before its fields are resolved so that
//! self-referential and mutually recursive models terminate.

use protofox_schema::{
    Annotation, FieldDefinition, MessageDefinition, MethodDefinition, ModelSet, SchemaDefinition,
    ServiceDefinition, ServiceSpec, TypeId, TypeKey,
};
use tracing::debug;

use crate::{
    classify::{classify, Shape},
    error::SchemaError,
    utils::{message_name, quote, to_pascal_case, to_snake_case},
};

/// Name of the message used for methods that declare no payload.
pub const EMPTY_MESSAGE: &str = "Empty";

/// Name of the `oneof` group inside a union container.
pub const ONE_OF_GROUP: &str = "value";

pub struct ProtoBuilder<'m> {
    models: &'m ModelSet,
    schema: SchemaDefinition,
}

impl<'m> ProtoBuilder<'m> {
    pub fn new(package: impl Into<String>, models: &'m ModelSet) -> Self {
        ProtoBuilder {
            models,
            schema: SchemaDefinition::new(package),
        }
    }

    /// Resolves `spec` and appends it to the schema. Methods of a spec whose
    /// service name is already present are appended to that service; a
    /// method name may appear only once per service.
    pub fn add_service(&mut self, spec: &ServiceSpec) -> Result<&mut Self, SchemaError> {
        let existing = self.schema.services.iter().find(|s| s.name == spec.name);
        for (i, (name, _)) in spec.methods.iter().enumerate() {
            let declared = existing.map_or(false, |s| s.method(name).is_some())
                || spec.methods[..i].iter().any(|(other, _)| other == name);
            if declared {
                return Err(SchemaError::VerifierError(format!(
                    "The method {} is declared twice in {}",
                    quote(name),
                    quote(&spec.name)
                )));
            }
        }

        let service = self.resolve_service(spec)?;
        match self.schema.services.iter_mut().find(|s| s.name == service.name) {
            Some(existing) => existing.methods.extend(service.methods),
            None => self.schema.services.push(service),
        }
        Ok(self)
    }

    pub fn resolve_service(&mut self, spec: &ServiceSpec) -> Result<ServiceDefinition, SchemaError> {
        let mut service = ServiceDefinition::new(spec.name.clone());

        for (name, method) in &spec.methods {
            let request = match method.request {
                Some(id) => self.resolve_message(id)?.name.clone(),
                None => self.empty_message(),
            };
            let response = match method.response {
                Some(id) => self.resolve_message(id)?.name.clone(),
                None => self.empty_message(),
            };

            let client_streaming = method.mode.client_streaming();
            let server_streaming = method.mode.server_streaming();
            service.methods.push(MethodDefinition {
                name:               name.clone(),
                request_type_name:  stream_qualified(request, client_streaming),
                response_type_name: stream_qualified(response, server_streaming),
                cardinality:        method.mode,
                client_streaming,
                server_streaming,
            });
        }

        Ok(service)
    }

    /// Registers the record `id` (once) and returns its message.
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
            .ok_or_else(|| SchemaError::UnknownType(format!("#{}", id.0)))
    }

    /// Registers the enum `id` (once) and returns its definition. Member
    /// indices are the declared ordinals.
    pub fn resolve_enum(&mut self, id: TypeId) -> Result<&MessageDefinition, SchemaError> {
        let key = TypeKey::Declared(id);
        if !self.schema.enums.contains(&key) {
            let models = self.models;
            let def = models.enumeration(id).ok_or_else(|| self.not_a(id, "an enum"))?;

            let mut definition = MessageDefinition::new(message_name(&def.name));
            for member in &def.members {
                if definition.fields.iter().any(|f| f.index == member.value) {
                    return Err(SchemaError::DuplicateIndexOrOrdinal {
                        owner: def.name.clone(),
                        index: member.value,
                    });
                }
                definition.fields.push(FieldDefinition::member(member.name.clone(), member.value));
            }

            debug!(name = %definition.name, members = definition.fields.len(), "registered enum");
            self.schema.enums.insert(key, definition);
        }
        self.schema
            .enums
            .get(&key)
            .ok_or_else(|| SchemaError::UnknownType(format!("#{}", id.0)))
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    pub fn finish(self) -> SchemaDefinition {
        self.schema
    }

    fn register_message(&mut self, id: TypeId) -> Result<(), SchemaError> {
        let models = self.models;
        let record = models.record(id).ok_or_else(|| self.not_a(id, "a record"))?;
        let key = TypeKey::Declared(id);
        let name = message_name(&record.name);

        // Placeholder first: fields may lead back here
        self.schema.messages.insert(key, MessageDefinition::new(name.clone()));
        debug!(name = %name, "registered message");

        let mut fields = Vec::with_capacity(record.fields.len());
        for (i, field) in record.fields.iter().enumerate() {
            let index = i as i32 + 1;
            let site = FieldSite {
                owner:      id,
                owner_name: &name,
                field_name: &field.name,
                index,
            };
            let type_name = self.type_name(&site, &field.annotation)?;
            fields.push(FieldDefinition::new(field.name.clone(), index, type_name));
        }

        if let Some(message) = self.schema.messages.get_mut(&key) {
            message.fields = fields;
        }
        Ok(())
    }

    fn type_name(&mut self, site: &FieldSite<'_>, annotation: &Annotation) -> Result<String, SchemaError> {
        let models = self.models;
        match classify(annotation, models) {
            Shape::Scalar(scalar) => Ok(scalar.idl_name().to_string()),

            Shape::Optional(inner) => match classify(inner, models) {
                Shape::Scalar(scalar) => Ok(match scalar.wrapper_name() {
                    Some(wrapper) => wrapper.to_string(),
                    None => format!("optional {}", scalar.idl_name()),
                }),
                // Collections have no presence bit; empty means absent
                Shape::Sequence(_) | Shape::Mapping(..) => self.type_name(site, inner),
                Shape::NestedRecord(_) | Shape::Enum(_) => {
                    Ok(format!("optional {}", self.type_name(site, inner)?))
                }
                Shape::Optional(_) | Shape::Union(_) | Shape::Unsupported => Err(self.unsupported(site, inner)),
            },

            Shape::Union(members) => self.one_of(site, &members),

            Shape::Sequence(element) => {
                let element_name = self.type_name(site, element)?;
                if !is_plain(&element_name) {
                    return Err(self.unsupported(site, annotation));
                }
                Ok(format!("repeated {}", element_name))
            }

            Shape::Mapping(key, value) => {
                match classify(key, models) {
                    Shape::Scalar(scalar) if scalar.is_map_key() => {}
                    _ => return Err(self.unsupported(site, key)),
                }
                let key_name = self.type_name(site, key)?;
                let value_name = self.type_name(site, value)?;
                if !is_plain(&value_name) {
                    return Err(self.unsupported(site, annotation));
                }
                Ok(format!("map<{}, {}>", key_name, value_name))
            }

            Shape::NestedRecord(id) => Ok(self.resolve_message(id)?.name.clone()),

            Shape::Enum(id) => Ok(self.resolve_enum(id)?.name.clone()),

            Shape::Unsupported => Err(self.unsupported(site, annotation)),
        }
    }

    /// Synthesizes the container message for a union-typed field and returns its name.
    fn one_of(&mut self, site: &FieldSite<'_>, members: &[&Annotation]) -> Result<String, SchemaError> {
        let key = TypeKey::OneOf {
            owner: site.owner,
            field: site.index as u32,
        };
        let name = format!("{}_{}", site.owner_name, to_pascal_case(site.field_name));
        if self.schema.messages.contains(&key) {
            return Ok(name);
        }

        let mut container = MessageDefinition::new(name.clone());
        container.one_of = Some(ONE_OF_GROUP.to_string());
        self.schema.messages.insert(key, container);
        debug!(name = %name, members = members.len(), "registered one-of container");

        let mut fields: Vec<FieldDefinition> = Vec::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            let type_name = self.type_name(site, member)?;
            if !is_plain(&type_name) {
                return Err(self.unsupported(site, member));
            }
            let mut field_name = format!("{}_value", member_stem(&type_name));
            if fields.iter().any(|f| f.name == field_name) {
                field_name = format!("{}_{}", field_name, i + 1);
            }
            fields.push(FieldDefinition::new(field_name, i as i32 + 1, type_name));
        }

        if let Some(container) = self.schema.messages.get_mut(&key) {
            container.fields = fields;
        }
        Ok(name)
    }

    fn empty_message(&mut self) -> String {
        self.schema
            .messages
            .insert(TypeKey::Empty, MessageDefinition::new(EMPTY_MESSAGE));
        EMPTY_MESSAGE.to_string()
    }

    fn unsupported(&self, site: &FieldSite<'_>, annotation: &Annotation) -> SchemaError {
        SchemaError::UnsupportedType(format!(
            "{} (field {} of {})",
            self.models.describe(annotation),
            quote(site.field_name),
            quote(site.owner_name),
        ))
    }

    fn not_a(&self, id: TypeId, what: &str) -> SchemaError {
        SchemaError::UnsupportedType(format!(
            "{} is not {}",
            self.models.describe(&Annotation::Named(id)),
            what
        ))
    }
}

struct FieldSite<'a> {
    owner:      TypeId,
    owner_name: &'a str,
    field_name: &'a str,
    index:      i32,
}

fn stream_qualified(type_name: String, streaming: bool) -> String {
    if streaming {
        format!("stream {}", type_name)
    } else {
        type_name
    }
}

/// A type name that may appear as a map value, list element or one-of member.
fn is_plain(type_name: &str) -> bool {
    !(type_name.starts_with("repeated ")
        || type_name.starts_with("optional ")
        || type_name.starts_with("map<"))
}

fn member_stem(type_name: &str) -> String {
    let last = type_name.rsplit('.').next().unwrap_or(type_name);
    to_snake_case(last)
}
