// example/src/main.rs

use protofox::*;

fn main() -> Result<(), SchemaError> {
    // Forward: declare the models in code
    let mut models = ModelSet::new();
    let color = models.add_enum("Color", vec![
        EnumMember::new("FLAT", 0),
        EnumMember::new("ROUND", 1),
    ]);
    let shape = models.declare_record("Shape");
    if let Some(record) = models.record_mut(shape) {
        record.fields = vec![
            RecordField::new("client_id", Annotation::Scalar(Scalar::Uint32)),
            RecordField::new("color", Annotation::Named(color)),
            RecordField::new("label", Annotation::optional(Annotation::Scalar(Scalar::Text))),
            RecordField::new("children", Annotation::sequence(Annotation::Named(shape))),
            RecordField::new("size", Annotation::Union(vec![
                Annotation::Scalar(Scalar::Double),
                Annotation::Scalar(Scalar::Text),
            ])),
        ];
    }

    let spec = ServiceSpec::new("shapes", "Shapes")
        .method("Get", MethodSpec::unary(shape, shape))
        .method("Watch", MethodSpec::new(None, Some(shape), Cardinality::UnaryStream));

    let schemas = assemble(&models, &[spec])?;
    for schema in &schemas {
        println!("{}", render_proto(schema));
    }

    // Reverse: the same service as a compiled descriptor tree
    let mut set = DescriptorSet::new("shapes");
    let message = set.add_message("shapes.Shape");
    set.push_field(message, FieldDescriptor::new("client_id", 1, FieldKind::Uint32));
    set.push_field(message, FieldDescriptor::new("children", 2, FieldKind::Message(message)).repeated());
    set.add_service(ServiceDescriptor {
        name:    "Shapes".into(),
        methods: vec![MethodDescriptor {
            name:             "Get".into(),
            input:            message,
            output:           message,
            client_streaming: false,
            server_streaming: false,
        }],
    });

    let client = compile_descriptors(&set)?;
    println!("{}", render_client(&client));
    println!("{}", serde_json::to_string_pretty(&client)?);

    Ok(())
}
