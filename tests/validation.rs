//! Projection validation rules: one case per rule, asserting the exact
//! aggregated diagnostic text (attribution included).

use svcdsl::{parse, validate_design, ResolvedDesign};

fn check(src: &str) -> Result<(), String> {
    let design = parse(src).expect("parse");
    let resolved = ResolvedDesign::resolve(design).expect("resolve");
    validate_design(&resolved).map_err(|e| e.detail)
}

#[test]
fn response_validation_rules() {
    let cases: Vec<(&str, &str, &str)> = vec![
        (
            "empty result, empty response",
            r#"
service EmptyResultEmptyResponse {
  method Method {
  }
}
"#,
            "",
        ),
        (
            "non empty result, empty response",
            r#"
service NonEmptyResultEmptyResponse {
  method Method {
    result string;
  }
}
"#,
            "",
        ),
        (
            "empty result, non empty response",
            r#"
service EmptyResultNonEmptyResponse {
  method Method {
    response 200
  }
}
"#,
            "",
        ),
        (
            "string result with headers",
            r#"
service StringResultResponseWithHeaders {
  method Method {
    result string;
    response 200 {
      header "Location";
    }
  }
}
"#,
            "",
        ),
        (
            "string result with text content type",
            r#"
service StringResultResponseWithHeaders {
  method Method {
    result string;
    response 200 {
      content_type "text/plain";
    }
  }
}
"#,
            "",
        ),
        (
            "object result with headers",
            r#"
service ObjectResultResponseWithHeaders {
  method Method {
    result {
      foo: string;
    }
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "",
        ),
        (
            "array attribute in header",
            r#"
service ArrayResultResponseWithHeaders {
  method Method {
    result {
      foo: list<string>;
    }
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "",
        ),
        (
            "map attribute in header",
            r#"
service MapResultResponseWithHeaders {
  method Method {
    result {
      foo: map<string, string>;
    }
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "service \"MapResultResponseWithHeaders\" HTTP endpoint \"Method\": attribute \"foo\" used in HTTP headers must be a primitive type or an array of primitive types.",
        ),
        (
            "empty result with headers",
            r#"
service EmptyResultResponseWithHeaders {
  method Method {
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "HTTP response of service \"EmptyResultResponseWithHeaders\" HTTP endpoint \"Method\": response defines headers but result is empty",
        ),
        (
            "object attribute in header",
            r#"
type Obj {
  bar: string;
  baz: string;
}
service ArrayObjectResultResponseWithHeaders {
  method Method {
    result {
      foo: Obj;
    }
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "service \"ArrayObjectResultResponseWithHeaders\" HTTP endpoint \"Method\": attribute \"foo\" used in HTTP headers must be a primitive type or an array of primitive types.",
        ),
        (
            "array of object result in header",
            r#"
type Obj {
  foo: string;
}
service ArrayObjectResultResponseWithHeaders {
  method Method {
    result list<Obj>;
    response 200 {
      header "foo:Location";
    }
  }
}
"#,
            "service \"ArrayObjectResultResponseWithHeaders\" HTTP endpoint \"Method\": Array result is mapped to an HTTP header but is not an array of primitive types.",
        ),
        (
            "not string or bytes with text content type",
            r#"
service StringResultResponseWithHeaders {
  method Method {
    result int;
    response 200 {
      content_type "text/plain";
    }
  }
}
"#,
            "HTTP response of service \"StringResultResponseWithHeaders\" HTTP endpoint \"Method\": Result type must be String or Bytes when ContentType is 'text/plain'",
        ),
        (
            "missing header result attribute",
            r#"
service MissingHeaderResultAttribute {
  method Method {
    result {
      foo: string;
    }
    response 200 {
      header "bar";
    }
  }
}
"#,
            "HTTP response of service \"MissingHeaderResultAttribute\" HTTP endpoint \"Method\": header \"bar\" has no equivalent attribute in result type, use notation 'attribute_name:header_name' to identify corresponding result type attribute.\nservice \"MissingHeaderResultAttribute\" HTTP endpoint \"Method\": attribute \"bar\" used in HTTP headers must be a primitive type or an array of primitive types.",
        ),
        (
            "skip encode and gRPC",
            r#"
service SkipEncodeAndGRPC {
  method Method {
    result {
      foo: string;
    }
    response 200 {
      header "foo";
      skip_body;
      grpc;
    }
  }
}
"#,
            "service \"SkipEncodeAndGRPC\" HTTP endpoint \"Method\": Endpoint response cannot use SkipResponseBodyEncodeDecode and define a gRPC transport.",
        ),
    ];

    for (name, src, expected) in cases {
        match check(src) {
            Ok(()) => assert_eq!(expected, "", "case {:?}: expected error {:?}", name, expected),
            Err(got) => assert_eq!(got, expected, "case {:?}", name),
        }
    }
}

#[test]
fn bytes_result_with_text_content_type_is_valid() {
    let src = r#"
service S {
  method M {
    result bytes;
    response 200 {
      content_type "text/plain";
    }
  }
}
"#;
    assert_eq!(check(src), Ok(()));
}

#[test]
fn text_content_type_ignored_when_headers_consume_result() {
    // The whole string result travels in the header; there is no body to
    // constrain.
    let src = r#"
service S {
  method M {
    result string;
    response 200 {
      content_type "text/plain";
      header "Location";
    }
  }
}
"#;
    assert_eq!(check(src), Ok(()));
}

#[test]
fn view_referencing_unknown_attribute_fails() {
    let src = r#"
service S {
  method M {
    result {
      foo: string;
      view tiny { bogus; }
    }
  }
}
"#;
    let err = check(src).unwrap_err();
    assert_eq!(
        err,
        "service \"S\" HTTP endpoint \"M\": view \"tiny\" references unknown attribute \"bogus\" in result type"
    );
}

#[test]
fn failures_aggregate_across_methods() {
    let src = r#"
service S {
  method A {
    response 200 {
      header "foo:Location";
    }
  }
  method B {
    result int;
    response 200 {
      content_type "text/plain";
    }
  }
}
"#;
    let err = check(src).unwrap_err();
    // Both methods report; merge joins the two units with "; ".
    assert!(err.contains("response defines headers but result is empty"));
    assert!(err.contains("Result type must be String or Bytes when ContentType is 'text/plain'"));
}

#[test]
fn multiple_bad_headers_yield_one_diagnostic_each() {
    let src = r#"
service S {
  method M {
    result {
      a: map<string, int>;
      b: map<string, int>;
    }
    response 200 {
      header "a:X-A";
      header "b:X-B";
    }
  }
}
"#;
    let err = check(src).unwrap_err();
    let lines: Vec<&str> = err.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("attribute \"a\""));
    assert!(lines[1].contains("attribute \"b\""));
}
