//! Description DSL tests: syntax (parse success/failure) and semantics
//! (resolution, shapes, views, response items).

use svcdsl::model::{Constraint, Primitive, ResultType};
use svcdsl::{parse, ResolvedDesign};

#[test]
fn parse_empty_design() {
    let d = parse("").expect("empty design can parse");
    assert!(d.types.is_empty());
    assert!(d.services.is_empty());
}

#[test]
fn parse_minimal_service() {
    let src = r#"
service Storage {
  method Show {
  }
}
"#;
    let d = parse(src).expect("parse");
    assert_eq!(d.services.len(), 1);
    assert_eq!(d.services[0].name, "Storage");
    assert_eq!(d.services[0].methods.len(), 1);
    let m = &d.services[0].methods[0];
    assert_eq!(m.name, "Show");
    assert!(m.result.is_empty());
    // A method with no declared response still has the default 200.
    assert_eq!(m.responses.len(), 1);
    assert_eq!(m.responses[0].status_code, 200);
}

#[test]
fn parse_primitive_result() {
    let src = r#"
service S {
  method M {
    result string;
  }
}
"#;
    let d = parse(src).expect("parse");
    let m = &d.services[0].methods[0];
    assert_eq!(m.result, ResultType::Primitive(Primitive::String));
}

#[test]
fn parse_object_result_with_views() {
    let src = r#"
service S {
  method M {
    result {
      name: string required;
      id: int [0..100];
      tags: list<string>;
      view tiny { name; }
    }
  }
}
"#;
    let d = parse(src).expect("parse");
    let m = &d.services[0].methods[0];
    let attrs = m.result.attributes().expect("object result");
    assert_eq!(attrs.len(), 3);
    assert!(attrs[0].required);
    assert!(!attrs[1].required);
    assert_eq!(attrs[1].constraint, Some(Constraint::Range { min: 0, max: 100 }));
    assert_eq!(
        attrs[2].ty,
        ResultType::Array(Box::new(ResultType::Primitive(Primitive::String)))
    );
    assert_eq!(m.views.views.len(), 1);
    assert_eq!(m.views.views[0].name, "tiny");
    assert_eq!(m.views.views[0].attribute_names, vec!["name".to_string()]);
}

#[test]
fn parse_map_and_user_type() {
    let src = r#"
type Account {
  name: string;
}
service S {
  method M {
    result {
      counts: map<string, int>;
      owner: Account;
    }
  }
}
"#;
    let d = parse(src).expect("parse");
    assert_eq!(d.types.len(), 1);
    let attrs = d.services[0].methods[0].result.attributes().unwrap();
    assert_eq!(
        attrs[0].ty,
        ResultType::Map(
            Box::new(ResultType::Primitive(Primitive::String)),
            Box::new(ResultType::Primitive(Primitive::Int)),
        )
    );
    assert_eq!(attrs[1].ty, ResultType::UserTypeRef("Account".into()));
}

#[test]
fn parse_response_items() {
    let src = r#"
service S {
  method M {
    result {
      foo: string;
      bar: string;
    }
    response 201 {
      content_type "text/plain";
      header "foo:Location";
      header "bar";
      skip_body;
      grpc;
    }
    response 404
  }
}
"#;
    let d = parse(src).expect("parse");
    let m = &d.services[0].methods[0];
    assert_eq!(m.responses.len(), 2);
    let r = &m.responses[0];
    assert_eq!(r.status_code, 201);
    assert_eq!(r.content_type.as_deref(), Some("text/plain"));
    assert_eq!(r.headers.len(), 2);
    assert_eq!(r.headers[0].attribute_name, "foo");
    assert_eq!(r.headers[0].wire_name, "Location");
    assert_eq!(r.headers[1].attribute_name, "bar");
    assert_eq!(r.headers[1].wire_name, "bar");
    assert!(r.skip_body_coding);
    assert!(r.has_grpc_transport);
    assert_eq!(m.responses[1].status_code, 404);
}

#[test]
fn parse_with_comments() {
    let src = r#"
// a service
service S {
  method M {
    result {
      id: int; /* inline */
    }
  }
}
"#;
    let d = parse(src).expect("parse");
    assert_eq!(d.services[0].methods[0].result.attributes().unwrap().len(), 1);
}

#[test]
fn parse_enum_and_length_constraints() {
    let src = r#"
service S {
  method M {
    result {
      kind: string [in("a", "b")];
      name: string [len(1..10)];
    }
  }
}
"#;
    let d = parse(src).expect("parse");
    let attrs = d.services[0].methods[0].result.attributes().unwrap();
    assert!(matches!(attrs[0].constraint, Some(Constraint::Enum(_))));
    assert_eq!(
        attrs[1].constraint,
        Some(Constraint::Length { min: 1, max: 10 })
    );
}

#[test]
fn negative_length_bound_is_rejected() {
    let src = r#"
service S {
  method M {
    result {
      name: string [len(-1..10)];
    }
  }
}
"#;
    let err = parse(src).unwrap_err();
    assert!(err.contains("length bound"), "got: {}", err);
}

#[test]
fn parse_rejects_garbage() {
    assert!(parse("service {").is_err());
    assert!(parse("method M {}").is_err());
    assert!(parse("service S { method M { result ; } }").is_err());
}

#[test]
fn resolve_rejects_duplicate_services() {
    let src = r#"
service S {
}
service S {
}
"#;
    let d = parse(src).expect("parse");
    assert!(ResolvedDesign::resolve(d).is_err());
}

#[test]
fn resolve_provides_type_lookup() {
    let src = r#"
type Account {
  name: string;
}
service S {
  method M {
    result Account;
  }
}
"#;
    let d = parse(src).expect("parse");
    let resolved = ResolvedDesign::resolve(d).expect("resolve");
    let result = &resolved.get_service("S").unwrap().methods[0].result;
    let shape = resolved.deref(result);
    assert_eq!(shape.attribute_names(), vec!["name".to_string()]);
}
