//! One-step classification of a field annotation into the shapes the
//! forward resolver knows how to translate.

use protofox_schema::{Annotation, ModelSet, ModelType, Scalar, TypeId};

#[derive(Debug, Clone, PartialEq)]
pub enum Shape<'a> {
    Scalar(Scalar),
    /// Exactly one non-null alternative alongside null.
    Optional(&'a Annotation),
    /// Two or more non-null alternatives; a null member is dropped.
    Union(Vec<&'a Annotation>),
    Sequence(&'a Annotation),
    Mapping(&'a Annotation, &'a Annotation),
    NestedRecord(TypeId),
    Enum(TypeId),
    Unsupported,
}

pub fn classify<'a>(annotation: &'a Annotation, models: &ModelSet) -> Shape<'a> {
    match annotation {
        Annotation::Scalar(s) => Shape::Scalar(*s),
        Annotation::Sequence(Some(element)) => Shape::Sequence(element),
        Annotation::Mapping(Some(kv)) => Shape::Mapping(&kv.0, &kv.1),
        Annotation::Named(id) => match models.get(*id) {
            Some(ModelType::Record(_)) => Shape::NestedRecord(*id),
            Some(ModelType::Enum(_)) => Shape::Enum(*id),
            None => Shape::Unsupported,
        },
        Annotation::Union(members) => {
            let mut alternatives = Vec::new();
            let mut nullable = false;
            flatten_union(members, &mut alternatives, &mut nullable);
            match alternatives.len() {
                0 => Shape::Unsupported,
                1 if nullable => Shape::Optional(alternatives[0]),
                1 => classify(alternatives[0], models),
                _ => Shape::Union(alternatives),
            }
        }
        Annotation::Null
        | Annotation::Sequence(None)
        | Annotation::Mapping(None)
        | Annotation::Opaque(_) => Shape::Unsupported,
    }
}

// Nested unions collapse into one level; repeated alternatives are kept once.
fn flatten_union<'a>(members: &'a [Annotation], out: &mut Vec<&'a Annotation>, nullable: &mut bool) {
    for member in members {
        match member {
            Annotation::Null => *nullable = true,
            Annotation::Union(inner) => flatten_union(inner, out, nullable),
            other => {
                if !out.contains(&other) {
                    out.push(other);
                }
            }
        }
    }
}
