//! Data-model definitions consumed by the forward resolver.
//!
//! A [`ModelSet`] is an arena of records and enums. Declaring a type mints
//! its [`TypeId`] up front, so records may refer to themselves or to each
//! other before their fields are filled in.

use serde::Serialize;

use crate::mapping::Scalar;
use crate::types::{Cardinality, TypeId};

/// A field's declared type, as written in the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Annotation {
    Scalar(Scalar),
    /// The null type; only meaningful inside a union.
    Null,
    Union(Vec<Annotation>),
    /// `None` for a bare sequence without an element type.
    Sequence(Option<Box<Annotation>>),
    /// `None` for a bare mapping without key/value types.
    Mapping(Option<Box<(Annotation, Annotation)>>),
    /// A record or enum declared in the same [`ModelSet`].
    Named(TypeId),
    /// Anything the model language could not place.
    Opaque(String),
}

impl Annotation {
    pub fn optional(inner: Annotation) -> Self {
        Annotation::Union(vec![inner, Annotation::Null])
    }

    pub fn sequence(element: Annotation) -> Self {
        Annotation::Sequence(Some(Box::new(element)))
    }

    pub fn mapping(key: Annotation, value: Annotation) -> Self {
        Annotation::Mapping(Some(Box::new((key, value))))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordField {
    pub name:       String,
    pub annotation: Annotation,
}

impl RecordField {
    pub fn new(name: impl Into<String>, annotation: Annotation) -> Self {
        RecordField {
            name: name.into(),
            annotation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDef {
    pub name:   String,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name:  String,
    pub value: i32,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        EnumMember {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    pub name:    String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ModelType {
    Record(RecordDef),
    Enum(EnumDef),
}

impl ModelType {
    pub fn name(&self) -> &str {
        match self {
            ModelType::Record(r) => &r.name,
            ModelType::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelSet {
    types: Vec<ModelType>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declares a record with no fields yet.
    pub fn declare_record(&mut self, name: impl Into<String>) -> TypeId {
        self.push(ModelType::Record(RecordDef {
            name:   name.into(),
            fields: Vec::new(),
        }))
    }

    pub fn add_record(&mut self, name: impl Into<String>, fields: Vec<RecordField>) -> TypeId {
        self.push(ModelType::Record(RecordDef {
            name: name.into(),
            fields,
        }))
    }

    pub fn add_enum(&mut self, name: impl Into<String>, members: Vec<EnumMember>) -> TypeId {
        self.push(ModelType::Enum(EnumDef {
            name: name.into(),
            members,
        }))
    }

    fn push(&mut self, ty: ModelType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&ModelType> {
        self.types.get(id.index())
    }

    pub fn record(&self, id: TypeId) -> Option<&RecordDef> {
        match self.get(id) {
            Some(ModelType::Record(r)) => Some(r),
            _ => None,
        }
    }

    pub fn record_mut(&mut self, id: TypeId) -> Option<&mut RecordDef> {
        match self.types.get_mut(id.index()) {
            Some(ModelType::Record(r)) => Some(r),
            _ => None,
        }
    }

    pub fn enumeration(&self, id: TypeId) -> Option<&EnumDef> {
        match self.get(id) {
            Some(ModelType::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// First type declared under `name`.
    pub fn find(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.name() == name)
            .map(|i| TypeId(i as u32))
    }

    /// Renders an annotation the way it would be written in a model file.
    pub fn describe(&self, annotation: &Annotation) -> String {
        match annotation {
            Annotation::Scalar(s) => s.keyword().to_string(),
            Annotation::Null => "null".to_string(),
            Annotation::Union(members) => members
                .iter()
                .map(|m| self.describe(m))
                .collect::<Vec<_>>()
                .join(" | "),
            Annotation::Sequence(None) => "Vec".to_string(),
            Annotation::Sequence(Some(e)) => format!("Vec<{}>", self.describe(e)),
            Annotation::Mapping(None) => "Map".to_string(),
            Annotation::Mapping(Some(kv)) => {
                format!("Map<{}, {}>", self.describe(&kv.0), self.describe(&kv.1))
            }
            Annotation::Named(id) => match self.get(*id) {
                Some(t) => t.name().to_string(),
                None => format!("#{}", id.0),
            },
            Annotation::Opaque(text) => text.clone(),
        }
    }
}

/// One RPC method of a model-based service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSpec {
    pub request:  Option<TypeId>,
    pub response: Option<TypeId>,
    pub mode:     Cardinality,
}

impl MethodSpec {
    pub fn new(request: Option<TypeId>, response: Option<TypeId>, mode: Cardinality) -> Self {
        MethodSpec {
            request,
            response,
            mode,
        }
    }

    pub fn unary(request: TypeId, response: TypeId) -> Self {
        MethodSpec::new(Some(request), Some(response), Cardinality::UnaryUnary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSpec {
    pub package: String,
    pub name:    String,
    /// Ordered by declaration.
    pub methods: Vec<(String, MethodSpec)>,
}

impl ServiceSpec {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        ServiceSpec {
            package: package.into(),
            name:    name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, name: impl Into<String>, spec: MethodSpec) -> Self {
        self.methods.push((name.into(), spec));
        self
    }
}
