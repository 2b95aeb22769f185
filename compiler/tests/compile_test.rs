#![cfg(test)]

use pretty_assertions::assert_eq;
use protofox_compiler::{
    compile_descriptors, compile_models, render_client, render_proto, ClientBuilder, ProtoBuilder,
    SchemaError,
};
use protofox_schema::{
    Annotation, Cardinality, DescriptorSet, EnumMember, EnumValueDescriptor, FieldDescriptor,
    FieldKind, MethodDescriptor, MethodSpec, ModelSet, RecordField, Scalar, ServiceDescriptor,
    ServiceSpec,
};

fn fields(schema: &protofox_schema::SchemaDefinition, message: &str) -> Vec<(String, i32, String)> {
    schema
        .message_named(message)
        .expect("message is registered")
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.index, f.type_name.clone()))
        .collect()
}

#[test]
fn test_compile_model_file() {
    let input = r#"
    package shop;

    // Stock state
    enum Status {
      ACTIVE = 1;
      RETIRED = 2;
    }

    model Item {
      id: uint32;
      tags: Vec<string>;
      created: datetime;
      note: Option<string>;
      count: Option<int>;
      price: float | int;
      attrs: Map<string, int64>;
      status: Status;
      parent: Option<Item>;
    }

    service Catalog {
      rpc Get(Item) returns (Item);
      rpc Upload(stream Item) returns ();
    }
    "#;

    let schemas = compile_models(input, "ignored").expect("compile_models failed");
    assert_eq!(schemas.len(), 1);
    let schema = &schemas[0];
    assert_eq!(schema.package, "shop");

    let to_owned = |v: Vec<(&str, i32, &str)>| {
        v.into_iter()
            .map(|(n, i, t)| (n.to_string(), i, t.to_string()))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        fields(schema, "Item"),
        to_owned(vec![
            ("id", 1, "uint32"),
            ("tags", 2, "repeated string"),
            ("created", 3, "google.protobuf.Timestamp"),
            ("note", 4, "google.protobuf.StringValue"),
            ("count", 5, "optional int32"),
            ("price", 6, "Item_Price"),
            ("attrs", 7, "map<string, int64>"),
            ("status", 8, "Status"),
            ("parent", 9, "optional Item"),
        ])
    );
    assert_eq!(
        fields(schema, "Item_Price"),
        to_owned(vec![("float_value", 1, "float"), ("int32_value", 2, "int32")])
    );

    let service = schema.service("Catalog").expect("service is registered");
    let upload = service.method("Upload").expect("method is registered");
    assert_eq!(upload.cardinality, Cardinality::StreamUnary);
    assert_eq!(upload.request_type_name, "stream Item");
    assert_eq!(upload.response_type_name, "Empty");

    let status = schema.enum_named("Status").expect("enum is registered");
    let members: Vec<(&str, i32)> = status.fields.iter().map(|f| (f.name.as_str(), f.index)).collect();
    assert_eq!(members, vec![("ACTIVE", 1), ("RETIRED", 2)]);
}

#[test]
fn test_render_model_file() {
    let input = r#"
    model Point { x: double; y: double; }
    service Geo { rpc Nearest(Point) returns (stream Point); }
    "#;

    let schemas = compile_models(input, "geo").expect("compile_models failed");
    let expected = r#"syntax = "proto3";

package geo;

service Geo {
  rpc Nearest(Point) returns (stream Point);
}

message Point {
  double x = 1;
  double y = 2;
}
"#;
    assert_eq!(render_proto(&schemas[0]), expected);
}

#[test]
fn test_model_errors() {
    let unknown = compile_models("model A { b: Missing; } service S { rpc M(A) returns (A); }", "p");
    assert!(matches!(unknown, Err(SchemaError::UnknownType(_))));

    let float_key = compile_models(
        "model A { m: Map<float, string>; } service S { rpc M(A) returns (A); }",
        "p",
    );
    assert!(matches!(float_key, Err(SchemaError::UnsupportedType(_))));

    let duplicate = compile_models(
        "enum E { A = 1; B = 1; } model M { e: E; } service S { rpc X(M) returns (M); }",
        "p",
    );
    assert!(matches!(
        duplicate,
        Err(SchemaError::DuplicateIndexOrOrdinal { index: 1, .. })
    ));

    match compile_models("model A {\n  b int;\n}", "p") {
        Err(SchemaError::ParseError { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_programmatic_models_resolve_cycles() {
    let mut models = ModelSet::new();
    let node = models.declare_record("Node");
    let color = models.add_enum("Color", vec![EnumMember::new("RED", 0), EnumMember::new("BLUE", 1)]);
    if let Some(record) = models.record_mut(node) {
        record.fields = vec![
            RecordField::new("children", Annotation::sequence(Annotation::Named(node))),
            RecordField::new("color", Annotation::Named(color)),
            RecordField::new("weight", Annotation::optional(Annotation::Scalar(Scalar::Double))),
        ];
    }

    let spec = ServiceSpec::new("tree", "Trees").method("Walk", MethodSpec::new(Some(node), Some(node), Cardinality::StreamStream));
    let more = ServiceSpec::new("tree", "Trees").method("Prune", MethodSpec::unary(node, node));
    let mut builder = ProtoBuilder::new("tree", &models);
    builder.add_service(&spec).expect("resolution succeeds");
    builder.add_service(&more).expect("repeat resolution succeeds");
    assert!(matches!(builder.add_service(&spec), Err(SchemaError::VerifierError(_))));
    let schema = builder.finish();

    assert_eq!(schema.messages.len(), 1);
    assert_eq!(schema.enums.len(), 1);
    assert_eq!(schema.services.len(), 1);
    assert_eq!(schema.services[0].methods.len(), 2);
    assert_eq!(
        fields(&schema, "Node")[0],
        ("children".to_string(), 1, "repeated Node".to_string())
    );
    assert_eq!(
        fields(&schema, "Node")[2],
        ("weight".to_string(), 3, "google.protobuf.DoubleValue".to_string())
    );
}

fn catalog_descriptors() -> DescriptorSet {
    let mut set = DescriptorSet::new("shop.v1");
    let item = set.add_message("shop.v1.Item");
    let detail = set.add_message("shop.v1.Item.Detail");
    let kind = set.add_enum("shop.v1.Kind", vec![
        EnumValueDescriptor::new("KIND_UNSPECIFIED", 0),
        EnumValueDescriptor::new("KIND_BOOK", 1),
    ]);
    let entry = set.add_map_entry("shop.v1.Item.LabelsEntry", FieldKind::String, FieldKind::Int32);

    set.push_field(item, FieldDescriptor::new("id", 1, FieldKind::Uint64));
    set.push_field(item, FieldDescriptor::new("labels", 2, FieldKind::Message(entry)).repeated());
    set.push_field(item, FieldDescriptor::new("detail", 3, FieldKind::Message(detail)));
    set.push_field(item, FieldDescriptor::new("kind", 4, FieldKind::Enum(kind)));
    set.push_field(detail, FieldDescriptor::new("score", 1, FieldKind::Double));
    set.push_field(detail, FieldDescriptor::new("blobs", 2, FieldKind::Bytes).repeated());

    set.add_service(ServiceDescriptor {
        name:    "Catalog".into(),
        methods: vec![MethodDescriptor {
            name:             "Sync".into(),
            input:            item,
            output:           detail,
            client_streaming: true,
            server_streaming: true,
        }],
    });
    set
}

#[test]
fn test_compile_descriptors() {
    let set = catalog_descriptors();
    let schema = compile_descriptors(&set).expect("compile_descriptors failed");

    let to_owned = |v: Vec<(&str, i32, &str)>| {
        v.into_iter()
            .map(|(n, i, t)| (n.to_string(), i, t.to_string()))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        fields(&schema, "Item"),
        to_owned(vec![
            ("id", 1, "i64"),
            ("labels", 2, "HashMap<String, i64>"),
            ("detail", 3, "Item_Detail"),
            ("kind", 4, "Kind"),
        ])
    );
    assert_eq!(
        fields(&schema, "Item_Detail"),
        to_owned(vec![("score", 1, "f64"), ("blobs", 2, "Vec<Vec<u8>>")])
    );
    assert!(schema.message_named("Item_LabelsEntry").is_none());

    let sync = schema.service("Catalog").and_then(|s| s.method("Sync")).expect("method");
    assert_eq!(sync.cardinality, Cardinality::StreamStream);
    assert_eq!(sync.request_type_name, "Item");

    let client = render_client(&schema);
    assert!(client.contains("pub trait CatalogClient {"));
    assert!(client.contains("pub detail: Option<Item_Detail>,"));
    assert!(client.contains("    KindBook = 1,"));
}

#[test]
fn test_descriptor_json_round_trip_through_builder() {
    let set = catalog_descriptors();
    let json = serde_json::to_string(&set).expect("serialize");
    let decoded: DescriptorSet = serde_json::from_str(&json).expect("deserialize");

    let first = ClientBuilder::new(&set).build().expect("build");
    let second = ClientBuilder::new(&decoded).build().expect("build");
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn test_group_fields_are_unsupported() {
    let mut set = DescriptorSet::new("legacy");
    let m = set.add_message("legacy.Old");
    set.push_field(m, FieldDescriptor::new("g", 1, FieldKind::Group));
    set.add_service(ServiceDescriptor {
        name:    "S".into(),
        methods: vec![MethodDescriptor {
            name:             "M".into(),
            input:            m,
            output:           m,
            client_streaming: false,
            server_streaming: false,
        }],
    });
    assert!(matches!(compile_descriptors(&set), Err(SchemaError::UnsupportedType(_))));
}

#[test]
fn test_split_service_blocks_cannot_repeat_methods() {
    let merged = compile_models(
        "model A { x: int; } service S { rpc Get(A) returns (A); } service S { rpc Put(A) returns (); }",
        "p",
    )
    .expect("compile_models failed");
    let methods: Vec<&str> = merged[0].services[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["Get", "Put"]);

    let repeated = compile_models(
        "model A { x: int; } service S { rpc Get(A) returns (A); } service S { rpc Get(A) returns (); }",
        "p",
    );
    assert!(matches!(repeated, Err(SchemaError::VerifierError(_))));
}

#[test]
fn test_mutually_recursive_models() {
    let mut models = ModelSet::new();
    let a = models.declare_record("A");
    let b = models.declare_record("B");
    if let Some(record) = models.record_mut(a) {
        record.fields = vec![RecordField::new("b", Annotation::optional(Annotation::Named(b)))];
    }
    if let Some(record) = models.record_mut(b) {
        record.fields = vec![RecordField::new("a", Annotation::sequence(Annotation::Named(a)))];
    }

    let spec = ServiceSpec::new("graph", "Graph").method("Visit", MethodSpec::unary(a, b));
    let mut builder = ProtoBuilder::new("graph", &models);
    builder.add_service(&spec).expect("resolution succeeds");
    let schema = builder.finish();

    let names: Vec<&str> = schema.messages.values().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(fields(&schema, "A"), vec![("b".to_string(), 1, "optional B".to_string())]);
    assert_eq!(fields(&schema, "B"), vec![("a".to_string(), 1, "repeated A".to_string())]);
}

#[test]
fn test_duplicate_descriptor_enum_numbers() {
    let mut set = DescriptorSet::new("legacy");
    let level = set.add_enum("legacy.Level", vec![
        EnumValueDescriptor::new("LOW", 1),
        EnumValueDescriptor::new("MINIMAL", 1),
    ]);
    let m = set.add_message("legacy.Reading");
    set.push_field(m, FieldDescriptor::new("level", 1, FieldKind::Enum(level)));
    set.add_service(ServiceDescriptor {
        name:    "Meter".into(),
        methods: vec![MethodDescriptor {
            name:             "Read".into(),
            input:            m,
            output:           m,
            client_streaming: false,
            server_streaming: false,
        }],
    });

    match compile_descriptors(&set) {
        Err(SchemaError::DuplicateIndexOrOrdinal { owner, index }) => {
            assert_eq!(owner, "legacy.Level");
            assert_eq!(index, 1);
        }
        other => panic!("expected duplicate ordinal, got {:?}", other),
    }
}
