//! Groups service specifications by package and resolves each group into
//! one schema.

use protofox_schema::{ModelSet, SchemaDefinition, ServiceSpec};
use tracing::info;

use crate::{error::SchemaError, forward::ProtoBuilder};

/// Resolves `specs` into one [`SchemaDefinition`] per package, in the order
/// packages are first seen. Specs that share a package and a service name
/// are merged into one service.
pub fn assemble(models: &ModelSet, specs: &[ServiceSpec]) -> Result<Vec<SchemaDefinition>, SchemaError> {
    let mut builders: Vec<ProtoBuilder<'_>> = Vec::new();

    for spec in specs {
        if spec.methods.is_empty() {
            continue;
        }
        let position = match builders.iter().position(|b| b.schema().package == spec.package) {
            Some(position) => position,
            None => {
                builders.push(ProtoBuilder::new(spec.package.clone(), models));
                builders.len() - 1
            }
        };
        builders[position].add_service(spec)?;
    }

    let schemas: Vec<SchemaDefinition> = builders.into_iter().map(ProtoBuilder::finish).collect();
    for schema in &schemas {
        info!(
            package = %schema.package,
            services = schema.services.len(),
            messages = schema.messages.len(),
            enums = schema.enums.len(),
            "assembled schema"
        );
    }
    Ok(schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protofox_schema::{Annotation, MethodSpec, RecordField, Scalar};

    #[test]
    fn groups_by_package_and_merges_services() {
        let mut models = ModelSet::new();
        let a = models.add_record("A", vec![RecordField::new("x", Annotation::Scalar(Scalar::Int))]);
        let b = models.add_record("B", vec![RecordField::new("y", Annotation::Scalar(Scalar::Text))]);

        let specs = vec![
            ServiceSpec::new("one", "Alpha").method("GetA", MethodSpec::unary(a, a)),
            ServiceSpec::new("two", "Beta").method("GetB", MethodSpec::unary(b, b)),
            ServiceSpec::new("one", "Alpha").method("GetB", MethodSpec::unary(b, b)),
            ServiceSpec::new("one", "Idle"),
        ];

        let schemas = assemble(&models, &specs).unwrap();
        assert_eq!(schemas.len(), 2);

        let one = &schemas[0];
        assert_eq!(one.package, "one");
        assert_eq!(one.services.len(), 1);
        let methods: Vec<&str> = one.services[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["GetA", "GetB"]);
        let messages: Vec<&str> = one.messages.values().map(|m| m.name.as_str()).collect();
        assert_eq!(messages, vec!["A", "B"]);

        assert_eq!(schemas[1].package, "two");
        assert_eq!(schemas[1].messages.len(), 1);
    }

    #[test]
    fn assembly_is_deterministic() {
        let mut models = ModelSet::new();
        let a = models.add_record("A", vec![RecordField::new("x", Annotation::Scalar(Scalar::Int))]);
        let specs = vec![ServiceSpec::new("p", "S").method("M", MethodSpec::new(Some(a), None, Default::default()))];

        let first = serde_json::to_string(&assemble(&models, &specs).unwrap()).unwrap();
        let second = serde_json::to_string(&assemble(&models, &specs).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
