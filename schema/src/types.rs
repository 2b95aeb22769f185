use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

/// Identity token of a declared source type (a model record/enum or a
/// descriptor message/enum). Minted once by the arena that owns the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Key of a registered IR entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKey {
    /// A type declared in the source graph.
    Declared(TypeId),
    /// The one-of container synthesized for a union-typed field.
    OneOf { owner: TypeId, field: u32 },
    /// The canonical empty payload used by methods without a request or response.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    UnaryUnary,
    UnaryStream,
    StreamUnary,
    StreamStream,
}

impl Cardinality {
    /// Derives the cardinality from the raw streaming flags of a method.
    pub fn from_streaming(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => Cardinality::UnaryUnary,
            (true,  false) => Cardinality::StreamUnary,
            (false, true)  => Cardinality::UnaryStream,
            (true,  true)  => Cardinality::StreamStream,
        }
    }

    pub fn client_streaming(self) -> bool {
        matches!(self, Cardinality::StreamUnary | Cardinality::StreamStream)
    }

    pub fn server_streaming(self) -> bool {
        matches!(self, Cardinality::UnaryStream | Cardinality::StreamStream)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::UnaryUnary   => "unary_unary",
            Cardinality::UnaryStream  => "unary_stream",
            Cardinality::StreamUnary  => "stream_unary",
            Cardinality::StreamStream => "stream_stream",
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::UnaryUnary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name:      String,
    pub index:     i32,
    /// Empty for enum members.
    pub type_name: String,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, index: i32, type_name: impl Into<String>) -> Self {
        FieldDefinition {
            name:      name.into(),
            index,
            type_name: type_name.into(),
        }
    }

    /// An enum member: name and ordinal, no type.
    pub fn member(name: impl Into<String>, index: i32) -> Self {
        FieldDefinition::new(name, index, "")
    }
}

/// A message, an enum, or a synthesized one-of container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDefinition {
    pub name:   String,
    pub fields: Vec<FieldDefinition>,
    /// Name of the one-of group when this message is a union container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<String>,
}

impl MessageDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        MessageDefinition {
            name:   name.into(),
            fields: Vec::new(),
            one_of: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDefinition {
    pub name:               String,
    pub request_type_name:  String,
    pub response_type_name: String,
    pub cardinality:        Cardinality,
    pub client_streaming:   bool,
    pub server_streaming:   bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDefinition {
    pub name:    String,
    pub methods: Vec<MethodDefinition>,
}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        ServiceDefinition {
            name:    name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Identity-keyed store that remembers first-seen insertion order.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<(TypeKey, T)>,
    index:   HashMap<TypeKey, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: Vec::new(),
            index:   HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &TypeKey) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &TypeKey) -> Option<&mut T> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Registers `value` under `key`. An existing entry is kept and `false`
    /// is returned.
    pub fn insert(&mut self, key: TypeKey, value: T) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push((key, value));
        true
    }

    /// Drops every entry registered after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.entries.len() {
            return;
        }
        for (key, _) in self.entries.drain(len..) {
            self.index.remove(&key);
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }
}

// Keys are process-local identities, so only the ordered values are serialized.
impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.values())
    }
}

/// Root of the intermediate representation for one package.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDefinition {
    pub package:  String,
    pub services: Vec<ServiceDefinition>,
    pub messages: Registry<MessageDefinition>,
    pub enums:    Registry<MessageDefinition>,
}

impl SchemaDefinition {
    pub fn new(package: impl Into<String>) -> Self {
        SchemaDefinition {
            package:  package.into(),
            services: Vec::new(),
            messages: Registry::new(),
            enums:    Registry::new(),
        }
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    /// First registered message with the given rendered name.
    pub fn message_named(&self, name: &str) -> Option<&MessageDefinition> {
        self.messages.values().find(|m| m.name == name)
    }

    /// First registered enum with the given rendered name.
    pub fn enum_named(&self, name: &str) -> Option<&MessageDefinition> {
        self.enums.values().find(|e| e.name == name)
    }

    /// Whether `name` is the rendered name of any registered message or enum.
    pub fn defines(&self, name: &str) -> bool {
        self.message_named(name).is_some() || self.enum_named(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_table_is_total() {
        let cases = [
            ((false, false), Cardinality::UnaryUnary),
            ((true,  false), Cardinality::StreamUnary),
            ((false, true),  Cardinality::UnaryStream),
            ((true,  true),  Cardinality::StreamStream),
        ];
        for ((client, server), expected) in cases {
            let got = Cardinality::from_streaming(client, server);
            assert_eq!(got, expected);
            assert_eq!(got.client_streaming(), client);
            assert_eq!(got.server_streaming(), server);
        }
    }

    #[test]
    fn registry_keeps_first_insertion() {
        let mut registry = Registry::new();
        assert!(registry.insert(TypeKey::Declared(TypeId(4)), "first"));
        assert!(registry.insert(TypeKey::Empty, "empty"));
        assert!(!registry.insert(TypeKey::Declared(TypeId(4)), "second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&TypeKey::Declared(TypeId(4))), Some(&"first"));
        assert_eq!(registry.values().copied().collect::<Vec<_>>(), vec!["first", "empty"]);
    }

    #[test]
    fn registry_truncate_forgets_later_keys() {
        let mut registry = Registry::new();
        registry.insert(TypeKey::Declared(TypeId(0)), "kept");
        registry.insert(TypeKey::Declared(TypeId(1)), "dropped");
        registry.insert(TypeKey::Empty, "dropped too");

        registry.truncate(1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&TypeKey::Declared(TypeId(1))));
        assert!(!registry.contains(&TypeKey::Empty));

        assert!(registry.insert(TypeKey::Empty, "again"));
        assert_eq!(registry.get(&TypeKey::Empty), Some(&"again"));
        registry.truncate(5);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_serializes_values_in_order() {
        let mut registry = Registry::new();
        registry.insert(TypeKey::Declared(TypeId(9)), MessageDefinition::new("B"));
        registry.insert(TypeKey::Declared(TypeId(1)), MessageDefinition::new("A"));
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"[{"name":"B","fields":[]},{"name":"A","fields":[]}]"#);
    }
}
