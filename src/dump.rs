//! Render decode plans and decoded values as stable text.
//!
//! Rendering is deterministic: identical plans produce byte-identical text,
//! which is what the determinism tests and the CLI `--plan` output rely on.

use crate::model::{Constraint, Primitive, ResultType};
use crate::plan::DecodePlan;
use crate::value::Value;

/// One-line rendering of a result type.
pub fn type_to_string(ty: &ResultType) -> String {
    match ty {
        ResultType::Empty => "empty".to_string(),
        ResultType::Primitive(p) => primitive_to_string(*p).to_string(),
        ResultType::Object(attrs) => {
            let fields: Vec<String> = attrs
                .iter()
                .map(|a| {
                    let mut s = format!("{}: {}", a.name, type_to_string(&a.ty));
                    if a.required {
                        s.push_str(" required");
                    }
                    if let Some(c) = &a.constraint {
                        s.push_str(&format!(" {}", constraint_to_string(c)));
                    }
                    s
                })
                .collect();
            format!("{{ {} }}", fields.join("; "))
        }
        ResultType::Array(elem) => format!("list<{}>", type_to_string(elem)),
        ResultType::Map(key, elem) => {
            format!("map<{}, {}>", type_to_string(key), type_to_string(elem))
        }
        ResultType::UserTypeRef(name) => name.clone(),
    }
}

fn primitive_to_string(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "string",
        Primitive::Bytes => "bytes",
        Primitive::Int => "int",
        Primitive::Float => "float",
        Primitive::Bool => "bool",
    }
}

fn constraint_to_string(c: &Constraint) -> String {
    match c {
        Constraint::Range { min, max } => format!("[{}..{}]", min, max),
        Constraint::Length { min, max } => format!("[len({}..{})]", min, max),
        Constraint::Enum(values) => {
            let elems: Vec<String> = values
                .iter()
                .map(|l| match l {
                    crate::model::Literal::Int(i) => i.to_string(),
                    crate::model::Literal::Bool(b) => b.to_string(),
                    crate::model::Literal::String(s) => format!("{:?}", s),
                })
                .collect();
            format!("[in({})]", elems.join(", "))
        }
    }
}

/// Multi-line rendering of a decode plan.
pub fn plan_to_dump(plan: &DecodePlan) -> String {
    let mut lines = vec![format!(
        "plan {:?} {:?} status {} {{",
        plan.service, plan.endpoint, plan.status_code
    )];
    if let Some(view) = &plan.view {
        let names: Vec<&str> = view.views.iter().map(|v| v.name.as_str()).collect();
        lines.push(format!(
            "  view header {:?} [{}]",
            view.header,
            names.join(", ")
        ));
    }
    for step in &plan.headers {
        let target = step.attribute.as_deref().unwrap_or("<result>");
        let required = if step.required { ", required" } else { "" };
        lines.push(format!(
            "  header {:?} -> {} ({}{})",
            step.wire_name,
            target,
            type_to_string(&step.ty),
            required
        ));
    }
    match &plan.body {
        Some(body) => {
            let ct = body.content_type.as_deref().unwrap_or("application/json");
            lines.push(format!(
                "  body {} as {:?}",
                type_to_string(&body.shape),
                ct
            ));
        }
        None => lines.push("  no body".to_string()),
    }
    lines.push("}".to_string());
    lines.join("\n")
}

/// Multi-line rendering of a decoded value.
pub fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::Null => format!("{}null", pad),
        Value::Bool(b) => format!("{}{}", pad, b),
        Value::Int(i) => format!("{}{}", pad, i),
        Value::Float(f) => format!("{}{}", pad, f),
        Value::String(s) => format!("{}{:?}", pad, s),
        Value::Bytes(b) => format!("{}hex({})", pad, hex_string(b)),
        Value::Array(items) => {
            if items.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines = vec![format!("{}[", pad)];
            for item in items {
                lines.push(value_to_dump(item, indent + 1));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        Value::Map(pairs) => {
            if pairs.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut lines = vec![format!("{}{{", pad)];
            for (k, val) in pairs {
                let key = value_to_dump(k, 0);
                lines.push(format!(
                    "{}  {}: {}",
                    pad,
                    key,
                    value_to_dump(val, 0)
                ));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        Value::Object(fields) => {
            if fields.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut lines = vec![format!("{}{{", pad)];
            for (name, val) in fields {
                lines.push(format!(
                    "{}  {}: {}",
                    pad,
                    name,
                    value_to_dump(val, 0)
                ));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
    }
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeSpec;

    #[test]
    fn type_rendering() {
        let ty = ResultType::Object(vec![AttributeSpec {
            name: "foo".into(),
            ty: ResultType::Array(Box::new(ResultType::Primitive(Primitive::Int))),
            required: true,
            constraint: Some(Constraint::Range { min: 0, max: 9 }),
        }]);
        assert_eq!(type_to_string(&ty), "{ foo: list<int> required [0..9] }");
    }

    #[test]
    fn value_rendering_is_stable() {
        let v = Value::Object(vec![
            ("a".into(), Value::Int(1)),
            ("b".into(), Value::String("x".into())),
        ]);
        let once = value_to_dump(&v, 0);
        assert_eq!(once, value_to_dump(&v, 0));
        assert!(once.contains("a: 1"));
    }
}
