//! Resolves the names of a parsed model file into a [`ModelSet`] and
//! service specifications.

use std::collections::HashMap;

use protofox_schema::{
    wrapper_alias, Annotation, Cardinality, EnumMember, MethodSpec, ModelSet, RecordField, Scalar,
    ServiceSpec, TypeId,
};

use crate::{
    error::SchemaError,
    parser::{Item, ModelFile, Payload, TypeExpr},
    utils::{error, quote},
};

/// Names that cannot be used for a model or enum.
pub const RESERVED_NAMES: [&str; 6] = ["Option", "Vec", "Map", "null", "Empty", "package"];

/// Output of lowering one model file.
#[derive(Debug, Clone)]
pub struct LoweredModels {
    pub package:  String,
    pub models:   ModelSet,
    pub services: Vec<ServiceSpec>,
}

/// Lowers `file`; `default_package` is used when the file has no `package` line.
pub fn lower_models(file: &ModelFile, default_package: &str) -> Result<LoweredModels, SchemaError> {
    let package = file
        .package
        .clone()
        .unwrap_or_else(|| default_package.to_string());

    let mut models = ModelSet::new();
    let mut names: HashMap<String, TypeId> = HashMap::new();

    // 1) Declare every type first so fields may refer forward
    for item in &file.items {
        let (name, line, column) = match item {
            Item::Enum(e) => (&e.name, e.line, e.column),
            Item::Model(m) => (&m.name, m.line, m.column),
            Item::Service(_) => continue,
        };
        if names.contains_key(name) || is_builtin(name) {
            return Err(error(&format!("The type {} is defined twice", quote(name)), line, column));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(error(&format!("The type name {} is reserved", quote(name)), line, column));
        }
        let id = match item {
            Item::Enum(e) => models.add_enum(
                e.name.clone(),
                e.members
                    .iter()
                    .map(|(member, value)| EnumMember::new(member.clone(), *value))
                    .collect(),
            ),
            _ => models.declare_record(name.clone()),
        };
        names.insert(name.clone(), id);
    }

    // 2) Fill in record fields
    for item in &file.items {
        let Item::Model(model) = item else { continue };
        let id = names[&model.name];

        let mut fields = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            if fields.iter().any(|f: &RecordField| f.name == field.name) {
                return Err(error(
                    &format!("The field {} is declared twice in {}", quote(&field.name), quote(&model.name)),
                    field.line,
                    field.column,
                ));
            }
            fields.push(RecordField::new(field.name.clone(), lower_type(&field.ty, &names, &models)?));
        }

        if let Some(record) = models.record_mut(id) {
            record.fields = fields;
        }
    }

    // 3) Services, in declaration order
    let mut services = Vec::new();
    for item in &file.items {
        let Item::Service(service) = item else { continue };

        let mut spec = ServiceSpec::new(package.clone(), service.name.clone());
        for rpc in &service.methods {
            if spec.methods.iter().any(|(name, _)| *name == rpc.name) {
                return Err(error(
                    &format!("The method {} is declared twice in {}", quote(&rpc.name), quote(&service.name)),
                    rpc.line,
                    rpc.column,
                ));
            }
            let request  = payload_type(&rpc.request, &names)?;
            let response = payload_type(&rpc.response, &names)?;
            let mode = Cardinality::from_streaming(rpc.request.stream, rpc.response.stream);
            spec = spec.method(rpc.name.clone(), MethodSpec::new(request, response, mode));
        }
        services.push(spec);
    }

    Ok(LoweredModels { package, models, services })
}

fn is_builtin(name: &str) -> bool {
    Scalar::from_keyword(name).is_some() || wrapper_alias(name).is_some()
}

fn payload_type(payload: &Payload, names: &HashMap<String, TypeId>) -> Result<Option<TypeId>, SchemaError> {
    match &payload.type_ {
        None => Ok(None),
        Some((name, line, column)) => match names.get(name) {
            Some(id) => Ok(Some(*id)),
            None => Err(unknown(name, *line, *column)),
        },
    }
}

fn unknown(name: &str, line: usize, column: usize) -> SchemaError {
    SchemaError::UnknownType(format!("{} at line {}, column {}", quote(name), line, column))
}

fn lower_type(
    ty: &TypeExpr,
    names: &HashMap<String, TypeId>,
    models: &ModelSet,
) -> Result<Annotation, SchemaError> {
    let (name, args, line, column) = match ty {
        TypeExpr::Union(members) => {
            return members
                .iter()
                .map(|m| lower_type(m, names, models))
                .collect::<Result<Vec<_>, _>>()
                .map(Annotation::Union);
        }
        TypeExpr::Path { name, args, line, column } => (name.as_str(), args, *line, *column),
    };

    let arity = |expected: usize| -> Result<(), SchemaError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(error(
                &format!("{} takes {} type argument(s) but {} were given", quote(name), expected, args.len()),
                line,
                column,
            ))
        }
    };

    if let Some(scalar) = Scalar::from_keyword(name) {
        arity(0)?;
        return Ok(Annotation::Scalar(scalar));
    }
    if let Some(scalar) = wrapper_alias(name) {
        arity(0)?;
        return Ok(Annotation::optional(Annotation::Scalar(scalar)));
    }

    match name {
        "null" => {
            arity(0)?;
            Ok(Annotation::Null)
        }
        "Option" => {
            arity(1)?;
            Ok(Annotation::optional(lower_type(&args[0], names, models)?))
        }
        "Vec" if args.is_empty() => Ok(Annotation::Sequence(None)),
        "Vec" => {
            arity(1)?;
            Ok(Annotation::sequence(lower_type(&args[0], names, models)?))
        }
        "Map" if args.is_empty() => Ok(Annotation::Mapping(None)),
        "Map" => {
            arity(2)?;
            Ok(Annotation::mapping(
                lower_type(&args[0], names, models)?,
                lower_type(&args[1], names, models)?,
            ))
        }
        _ => match names.get(name) {
            Some(id) if args.is_empty() => Ok(Annotation::Named(*id)),
            // Generic instantiation of a declared model is not resolvable
            Some(_) => {
                let args = args
                    .iter()
                    .map(|a| lower_type(a, names, models).map(|a| models.describe(&a)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Annotation::Opaque(format!("{}<{}>", name, args.join(", "))))
            }
            None => Err(unknown(name, line, column)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::parse_schema, tokenizer::tokenize_schema};

    fn lower(text: &str) -> Result<LoweredModels, SchemaError> {
        let file = parse_schema(&tokenize_schema(text)?)?;
        lower_models(&file, "fallback")
    }

    #[test]
    fn resolves_forward_references_and_builtins() {
        let lowered = lower(
            r#"
            model Order {
              item: Item;
              note: StringValue;
              tags: Vec<string>;
              raw: Vec;
            }
            model Item { id: uint32; }
            "#,
        )
        .unwrap();

        assert_eq!(lowered.package, "fallback");
        let order = lowered.models.find("Order").unwrap();
        let item  = lowered.models.find("Item").unwrap();
        let fields = &lowered.models.record(order).unwrap().fields;
        assert_eq!(fields[0].annotation, Annotation::Named(item));
        assert_eq!(fields[1].annotation, Annotation::optional(Annotation::Scalar(Scalar::Text)));
        assert_eq!(fields[2].annotation, Annotation::sequence(Annotation::Scalar(Scalar::Text)));
        assert_eq!(fields[3].annotation, Annotation::Sequence(None));
    }

    #[test]
    fn services_carry_streaming_mode() {
        let lowered = lower(
            r#"
            package shop;
            model Item { id: int; }
            service Catalog {
              rpc Get(Item) returns (Item);
              rpc Upload(stream Item) returns ();
              rpc Chat(stream Item) returns (stream Item);
            }
            "#,
        )
        .unwrap();

        let spec = &lowered.services[0];
        assert_eq!(spec.package, "shop");
        assert_eq!(spec.methods[0].1.mode, Cardinality::UnaryUnary);
        assert_eq!(spec.methods[1].1.mode, Cardinality::StreamUnary);
        assert_eq!(spec.methods[1].1.response, None);
        assert_eq!(spec.methods[2].1.mode, Cardinality::StreamStream);
    }

    #[test]
    fn generic_instantiation_is_opaque() {
        let lowered = lower("model Page { n: int; } model Holder { p: Page<int>; }").unwrap();
        let holder = lowered.models.find("Holder").unwrap();
        assert_eq!(
            lowered.models.record(holder).unwrap().fields[0].annotation,
            Annotation::Opaque("Page<int>".to_string())
        );
    }

    #[test]
    fn rejects_duplicates_and_unknown_names() {
        assert!(matches!(
            lower("model A { x: int; } enum A { X = 1; }"),
            Err(SchemaError::ParseError { .. })
        ));
        assert!(matches!(
            lower("model A { x: int; x: string; }"),
            Err(SchemaError::ParseError { .. })
        ));
        assert!(matches!(lower("model A { x: Missing; }"), Err(SchemaError::UnknownType(_))));
        assert!(matches!(lower("model Empty { }"), Err(SchemaError::ParseError { .. })));
        assert!(matches!(
            lower("model A { x: Option<int, string>; }"),
            Err(SchemaError::ParseError { .. })
        ));
    }
}
