//! Where compiled descriptor trees come from.
//!
//! The reverse resolver only needs a [`DescriptorTree`]; a
//! [`DescriptorSource`] finds the tree for a package on disk. JSON
//! descriptor sets are always supported. Binary `FileDescriptorSet` files
//! produced by `protoc --descriptor_set_out` need the `prost-reflect`
//! feature.
//!
//! [`DescriptorTree`]: protofox_schema::DescriptorTree

use std::{
    fs,
    path::{Path, PathBuf},
};

use protofox_schema::DescriptorSet;
use tracing::debug;

use crate::error::SchemaError;

pub trait DescriptorSource {
    /// Loads the descriptor tree of `package`.
    fn load(&self, package: &str) -> Result<DescriptorSet, SchemaError>;
}

/// Reads `<root>/<package>.json`.
#[derive(Debug, Clone)]
pub struct JsonDescriptorSource {
    root: PathBuf,
}

impl JsonDescriptorSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDescriptorSource { root: root.into() }
    }

    pub fn path(&self, package: &str) -> PathBuf {
        self.root.join(format!("{}.json", package))
    }
}

impl DescriptorSource for JsonDescriptorSource {
    fn load(&self, package: &str) -> Result<DescriptorSet, SchemaError> {
        let text = read_source(&self.path(package))?;
        let set: DescriptorSet =
            serde_json::from_str(&text).map_err(|e| SchemaError::DecodeError(e.to_string()))?;
        if set.package != package {
            return Err(SchemaError::DecodeError(format!(
                "expected package {:?}, found {:?}",
                package, set.package
            )));
        }
        debug!(package, types = set.types().count(), "loaded JSON descriptors");
        Ok(set)
    }
}

fn read_source(path: &Path) -> Result<String, SchemaError> {
    if !path.exists() {
        return Err(SchemaError::MissingSource(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(feature = "prost-reflect")]
pub use self::binary::{descriptor_set_from_pool, FileDescriptorSetSource};

#[cfg(feature = "prost-reflect")]
mod binary {
    use std::{collections::HashMap, fs, path::PathBuf};

    use prost_reflect::{DescriptorPool, Kind};
    use protofox_schema::{
        DescriptorSet, EnumValueDescriptor, FieldDescriptor, FieldKind, FieldLabel,
        MethodDescriptor, ServiceDescriptor, TypeId,
    };
    use tracing::debug;

    use super::DescriptorSource;
    use crate::error::SchemaError;

    /// Reads `<root>/<package>.bin`, a serialized `FileDescriptorSet`.
    #[derive(Debug, Clone)]
    pub struct FileDescriptorSetSource {
        root: PathBuf,
    }

    impl FileDescriptorSetSource {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            FileDescriptorSetSource { root: root.into() }
        }

        pub fn path(&self, package: &str) -> PathBuf {
            self.root.join(format!("{}.bin", package))
        }
    }

    impl DescriptorSource for FileDescriptorSetSource {
        fn load(&self, package: &str) -> Result<DescriptorSet, SchemaError> {
            let path = self.path(package);
            if !path.exists() {
                return Err(SchemaError::MissingSource(path));
            }
            let bytes = fs::read(&path)?;
            let pool = DescriptorPool::decode(bytes.as_slice())
                .map_err(|e| SchemaError::DecodeError(e.to_string()))?;
            descriptor_set_from_pool(&pool, package)
        }
    }

    /// Copies the services of `package` and every message and enum in the
    /// pool into a [`DescriptorSet`].
    pub fn descriptor_set_from_pool(pool: &DescriptorPool, package: &str) -> Result<DescriptorSet, SchemaError> {
        let mut set = DescriptorSet::new(package);
        let mut ids: HashMap<String, TypeId> = HashMap::new();

        for message in pool.all_messages() {
            let id = set.add_message(message.full_name());
            if message.is_map_entry() {
                if let Some(m) = set.message_mut(id) {
                    m.options.map_entry = true;
                }
            }
            ids.insert(message.full_name().to_string(), id);
        }
        for enumeration in pool.all_enums() {
            let values = enumeration
                .values()
                .map(|v| EnumValueDescriptor::new(v.name(), v.number()))
                .collect();
            let id = set.add_enum(enumeration.full_name(), values);
            ids.insert(enumeration.full_name().to_string(), id);
        }

        let lookup = |full_name: &str| {
            ids.get(full_name)
                .copied()
                .ok_or_else(|| SchemaError::UnknownType(full_name.to_string()))
        };

        for message in pool.all_messages() {
            let id = lookup(message.full_name())?;
            for field in message.fields() {
                let kind = match field.kind() {
                    _ if field.is_group() => FieldKind::Group,
                    Kind::Double => FieldKind::Double,
                    Kind::Float => FieldKind::Float,
                    Kind::Int64 => FieldKind::Int64,
                    Kind::Uint64 => FieldKind::Uint64,
                    Kind::Int32 => FieldKind::Int32,
                    Kind::Fixed64 => FieldKind::Fixed64,
                    Kind::Fixed32 => FieldKind::Fixed32,
                    Kind::Bool => FieldKind::Bool,
                    Kind::String => FieldKind::String,
                    Kind::Bytes => FieldKind::Bytes,
                    Kind::Uint32 => FieldKind::Uint32,
                    Kind::Sfixed32 => FieldKind::Sfixed32,
                    Kind::Sfixed64 => FieldKind::Sfixed64,
                    Kind::Sint32 => FieldKind::Sint32,
                    Kind::Sint64 => FieldKind::Sint64,
                    Kind::Message(m) => FieldKind::Message(lookup(m.full_name())?),
                    Kind::Enum(e) => FieldKind::Enum(lookup(e.full_name())?),
                };
                let mut descriptor = FieldDescriptor::new(field.name(), field.number() as i32, kind);
                if field.is_list() || field.is_map() {
                    descriptor.label = FieldLabel::Repeated;
                }
                set.push_field(id, descriptor);
            }
        }

        for service in pool.services().filter(|s| s.package_name() == package) {
            let mut methods = Vec::new();
            for method in service.methods() {
                methods.push(MethodDescriptor {
                    name:             method.name().to_string(),
                    input:            lookup(method.input().full_name())?,
                    output:           lookup(method.output().full_name())?,
                    client_streaming: method.is_client_streaming(),
                    server_streaming: method.is_server_streaming(),
                });
            }
            set.add_service(ServiceDescriptor {
                name: service.name().to_string(),
                methods,
            });
        }

        debug!(package, services = set.services.len(), "converted descriptor pool");
        Ok(set)
    }
}
