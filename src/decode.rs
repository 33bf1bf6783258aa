//! Execute decode plans against concrete wire responses.
//!
//! This is the contract generated decoders must honor, in executable form:
//! body decoding for the planned shape, header text conversion, view
//! selection through the reserved discriminator header, header overlay onto
//! the projected result, and post-decode re-validation of the assembled
//! value.

use crate::error::{
    merge_errors, Error, DECODING_ERROR, INVALID_RESPONSE, MISSING_HEADER,
    VALIDATION_ERROR,
};
use crate::model::{Constraint, Literal, Primitive, ResolvedDesign, ResultType, DEFAULT_VIEW};
use crate::plan::{BodyStep, DecodePlan};
use crate::value::Value;
use tracing::trace;

/// A concrete HTTP response as handed over by the transport layer, body
/// already read to completion.
#[derive(Debug, Clone, Default)]
pub struct WireResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl WireResponse {
    /// First header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A reconstructed typed result and the view it was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedResult {
    pub view: String,
    pub value: Value,
}

/// Decode a wire response against the plans of a method. The plan matching
/// the response status is selected; an uncovered status is an
/// `invalid_response` error carrying the raw body.
pub fn decode_response(
    design: &ResolvedDesign,
    plans: &[DecodePlan],
    resp: &WireResponse,
) -> Result<DecodedResult, Error> {
    let plan = plans
        .iter()
        .find(|p| p.status_code == resp.status)
        .ok_or_else(|| {
            let (service, endpoint) = plans
                .first()
                .map(|p| (p.service.as_str(), p.endpoint.as_str()))
                .unwrap_or(("", ""));
            INVALID_RESPONSE.error(format!(
                "service {:?} endpoint {:?}: unexpected HTTP response status {} ({})",
                service,
                endpoint,
                resp.status,
                String::from_utf8_lossy(&resp.body)
            ))
        })?;
    decode_with_plan(design, plan, resp)
}

/// Decode a wire response with one specific plan.
pub fn decode_with_plan(
    design: &ResolvedDesign,
    plan: &DecodePlan,
    resp: &WireResponse,
) -> Result<DecodedResult, Error> {
    trace!(
        service = %plan.service,
        endpoint = %plan.endpoint,
        status = resp.status,
        "decoding response"
    );

    let mut value = match &plan.body {
        Some(step) => decode_body(design, plan, step, resp)?,
        None => match &plan.result {
            ResultType::Object(_) => Value::Object(Vec::new()),
            _ => Value::Null,
        },
    };

    // View selection restricts body attributes only; header-sourced
    // attributes are overlaid afterwards, whatever the view.
    let view_name = match &plan.view {
        Some(step) => {
            let raw = resp.header(&step.header).unwrap_or("");
            let name = if raw.is_empty() { DEFAULT_VIEW } else { raw };
            let view = step
                .views
                .iter()
                .find(|v| v.name == name)
                .ok_or_else(|| {
                    VALIDATION_ERROR.error(format!(
                        "service {:?} endpoint {:?}: unknown view {:?} in header {:?}",
                        plan.service, plan.endpoint, raw, step.header
                    ))
                })?;
            if let Value::Object(fields) = &mut value {
                fields.retain(|(n, _)| view.attribute_names.contains(n));
            }
            view.name.clone()
        }
        None => DEFAULT_VIEW.to_string(),
    };

    let mut err = None;
    for step in &plan.headers {
        match resp.header(&step.wire_name) {
            None => {
                if step.required {
                    err = merge_errors(
                        err,
                        Some(MISSING_HEADER.error(format!(
                            "missing required HTTP header {:?}",
                            step.wire_name
                        ))),
                    );
                }
            }
            Some(raw) => match convert_header(design, &step.ty, &step.wire_name, raw) {
                Ok(v) => match &step.attribute {
                    Some(name) => value.set(name, v),
                    None => value = v,
                },
                Err(e) => err = merge_errors(err, Some(e)),
            },
        }
    }
    if let Some(e) = err {
        return Err(e);
    }

    if let Some(e) = validate_value(design, plan, &value, &view_name) {
        return Err(e);
    }

    Ok(DecodedResult {
        view: view_name,
        value,
    })
}

fn decode_body(
    design: &ResolvedDesign,
    plan: &DecodePlan,
    step: &BodyStep,
    resp: &WireResponse,
) -> Result<Value, Error> {
    if step.content_type.as_deref() == Some("text/plain") {
        return match design.deref(&step.shape) {
            ResultType::Primitive(Primitive::Bytes) => Ok(Value::Bytes(resp.body.clone())),
            _ => String::from_utf8(resp.body.clone()).map(Value::String).map_err(|e| {
                DECODING_ERROR.error(format!(
                    "service {:?} endpoint {:?}: body is not valid UTF-8: {}",
                    plan.service, plan.endpoint, e
                ))
            }),
        };
    }
    let json: serde_json::Value = serde_json::from_slice(&resp.body).map_err(|e| {
        DECODING_ERROR.error(format!(
            "service {:?} endpoint {:?}: {}",
            plan.service, plan.endpoint, e
        ))
    })?;
    decode_json(design, &step.shape, json, "body")
}

/// Shape-directed conversion of a JSON document into a typed value.
fn decode_json(
    design: &ResolvedDesign,
    shape: &ResultType,
    json: serde_json::Value,
    ctx: &str,
) -> Result<Value, Error> {
    let mismatch = |expected: &str, got: &serde_json::Value| {
        DECODING_ERROR.error(format!(
            "type of {} must be {} but got value {}",
            ctx, expected, got
        ))
    };
    match design.deref(shape) {
        ResultType::Empty => Ok(Value::Null),
        ResultType::Primitive(p) => match (*p, json) {
            (Primitive::String, serde_json::Value::String(s)) => Ok(Value::String(s)),
            (Primitive::Bytes, serde_json::Value::String(s)) => {
                Ok(Value::Bytes(s.into_bytes()))
            }
            (Primitive::Int, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| mismatch("an integer", &serde_json::Value::Number(n.clone()))),
            (Primitive::Float, serde_json::Value::Number(n)) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| mismatch("a number", &serde_json::Value::Number(n.clone()))),
            (Primitive::Bool, serde_json::Value::Bool(b)) => Ok(Value::Bool(b)),
            (p, other) => Err(mismatch(primitive_name(p), &other)),
        },
        ResultType::Object(attrs) => match json {
            serde_json::Value::Object(mut map) => {
                let mut fields = Vec::new();
                for attr in attrs {
                    // Requiredness is checked after assembly, not here.
                    if let Some(v) = map.remove(&attr.name) {
                        if v.is_null() {
                            continue;
                        }
                        let sub = decode_json(
                            design,
                            &attr.ty,
                            v,
                            &format!("{}.{}", ctx, attr.name),
                        )?;
                        fields.push((attr.name.clone(), sub));
                    }
                }
                Ok(Value::Object(fields))
            }
            other => Err(mismatch("an object", &other)),
        },
        ResultType::Array(elem) => match json {
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    out.push(decode_json(
                        design,
                        elem,
                        item,
                        &format!("{}[{}]", ctx, i),
                    )?);
                }
                Ok(Value::Array(out))
            }
            other => Err(mismatch("an array", &other)),
        },
        ResultType::Map(key, elem) => match json {
            serde_json::Value::Object(map) => {
                let mut out = Vec::with_capacity(map.len());
                for (k, v) in map {
                    let kv = decode_map_key(design, key, &k, ctx)?;
                    let ev =
                        decode_json(design, elem, v, &format!("{}[{:?}]", ctx, k))?;
                    out.push((kv, ev));
                }
                Ok(Value::Map(out))
            }
            other => Err(mismatch("a map", &other)),
        },
        // Unresolvable reference: carry the payload through untyped.
        ResultType::UserTypeRef(_) => Ok(Value::from(json)),
    }
}

fn decode_map_key(
    design: &ResolvedDesign,
    key: &ResultType,
    raw: &str,
    ctx: &str,
) -> Result<Value, Error> {
    match design.deref(key) {
        ResultType::Primitive(Primitive::Int) => raw.parse::<i64>().map(Value::Int).map_err(|_| {
            DECODING_ERROR.error(format!(
                "key {:?} of {} must be an integer",
                raw, ctx
            ))
        }),
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Convert header text into the planned primitive (or array-of-primitive,
/// comma-separated) type.
fn convert_header(
    design: &ResolvedDesign,
    ty: &ResultType,
    wire_name: &str,
    raw: &str,
) -> Result<Value, Error> {
    match design.deref(ty) {
        ResultType::Primitive(p) => convert_scalar(*p, wire_name, raw),
        ResultType::Array(elem) => {
            let p = match design.deref(elem) {
                ResultType::Primitive(p) => *p,
                // Validation guarantees array-of-primitive; anything else
                // means the plan was built from an unvalidated design.
                _ => {
                    return Err(DECODING_ERROR.error(format!(
                        "header {:?} is planned with a non-primitive element type",
                        wire_name
                    )))
                }
            };
            let mut out = Vec::new();
            for part in raw.split(',') {
                out.push(convert_scalar(p, wire_name, part.trim())?);
            }
            Ok(Value::Array(out))
        }
        _ => Err(DECODING_ERROR.error(format!(
            "header {:?} is planned with a non-primitive type",
            wire_name
        ))),
    }
}

fn convert_scalar(p: Primitive, wire_name: &str, raw: &str) -> Result<Value, Error> {
    match p {
        Primitive::String => Ok(Value::String(raw.to_string())),
        Primitive::Bytes => Ok(Value::Bytes(raw.as_bytes().to_vec())),
        Primitive::Int => raw.parse::<i64>().map(Value::Int).map_err(|_| {
            DECODING_ERROR.error(format!(
                "invalid value {:?} for header {:?}, must be an integer",
                raw, wire_name
            ))
        }),
        Primitive::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| {
            DECODING_ERROR.error(format!(
                "invalid value {:?} for header {:?}, must be a number",
                raw, wire_name
            ))
        }),
        Primitive::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(DECODING_ERROR.error(format!(
                "invalid value {:?} for header {:?}, must be a boolean",
                raw, wire_name
            ))),
        },
    }
}

fn primitive_name(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "a string",
        Primitive::Bytes => "a string",
        Primitive::Int => "an integer",
        Primitive::Float => "a number",
        Primitive::Bool => "a boolean",
    }
}

/// Re-validate the assembled value against the result type's own rules.
/// Requiredness applies to the attributes visible in the selected view plus
/// header-bound attributes.
fn validate_value(
    design: &ResolvedDesign,
    plan: &DecodePlan,
    value: &Value,
    view_name: &str,
) -> Option<Error> {
    let attrs = plan.result.attributes()?;
    let view_attrs: Option<&[String]> = plan
        .view
        .as_ref()
        .and_then(|s| s.views.iter().find(|v| v.name == view_name))
        .map(|v| v.attribute_names.as_slice());
    let visible: Vec<String> = attrs
        .iter()
        .filter(|attr| {
            let header_bound = plan
                .headers
                .iter()
                .any(|h| h.attribute.as_deref() == Some(attr.name.as_str()));
            header_bound
                || view_attrs.map_or(true, |names| names.contains(&attr.name))
        })
        .map(|attr| attr.name.clone())
        .collect();
    let scope = design.restrict(&plan.result, &visible);
    let mut err = None;
    for attr in scope.attributes().unwrap_or(&[]) {
        match value.get(&attr.name) {
            None | Some(Value::Null) => {
                if attr.required {
                    err = merge_errors(
                        err,
                        Some(VALIDATION_ERROR.error(format!(
                            "attribute {:?} of result is missing and required",
                            attr.name
                        ))),
                    );
                }
            }
            Some(v) => {
                if let Some(c) = &attr.constraint {
                    err = merge_errors(err, check_constraint(&attr.name, v, c));
                }
            }
        }
    }
    err
}

fn check_constraint(name: &str, value: &Value, constraint: &Constraint) -> Option<Error> {
    // Range and enum apply per element on arrays; length applies to the
    // container itself.
    if let Value::Array(items) = value {
        if !matches!(constraint, Constraint::Length { .. }) {
            let mut err = None;
            for item in items {
                err = merge_errors(err, check_constraint(name, item, constraint));
            }
            return err;
        }
    }
    match constraint {
        Constraint::Range { min, max } => {
            let n = value.as_i64()?;
            if n < *min || n > *max {
                return Some(VALIDATION_ERROR.error(format!(
                    "value of attribute {:?} must be between {} and {} but got value {}",
                    name, min, max, n
                )));
            }
            None
        }
        Constraint::Enum(allowed) => {
            let matches_literal = |lit: &Literal| match (lit, value) {
                (Literal::Int(i), Value::Int(v)) => i == v,
                (Literal::Bool(b), Value::Bool(v)) => b == v,
                (Literal::String(s), Value::String(v)) => s == v,
                _ => false,
            };
            if allowed.iter().any(matches_literal) {
                None
            } else {
                let elems: Vec<String> = allowed
                    .iter()
                    .map(|l| match l {
                        Literal::Int(i) => i.to_string(),
                        Literal::Bool(b) => b.to_string(),
                        Literal::String(s) => format!("{:?}", s),
                    })
                    .collect();
                Some(VALIDATION_ERROR.error(format!(
                    "value of attribute {:?} must be one of {}",
                    name,
                    elems.join(", ")
                )))
            }
        }
        Constraint::Length { min, max } => {
            let len = match value {
                Value::String(s) => s.chars().count() as u64,
                Value::Bytes(b) => b.len() as u64,
                Value::Array(a) => a.len() as u64,
                _ => return None,
            };
            if len < *min || len > *max {
                return Some(VALIDATION_ERROR.error(format!(
                    "length of attribute {:?} must be between {} and {} but got length {}",
                    name, min, max, len
                )));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Design;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = WireResponse {
            status: 200,
            headers: vec![("LOCATION".into(), "here".into())],
            body: Vec::new(),
        };
        assert_eq!(resp.header("location"), Some("here"));
        assert_eq!(resp.header("Other"), None);
    }

    #[test]
    fn scalar_conversions() {
        assert_eq!(
            convert_scalar(Primitive::Int, "h", "42"),
            Ok(Value::Int(42))
        );
        assert_eq!(
            convert_scalar(Primitive::Bool, "h", "true"),
            Ok(Value::Bool(true))
        );
        assert!(convert_scalar(Primitive::Int, "h", "nope").is_err());
    }

    #[test]
    fn array_header_splits_on_comma() {
        let design = ResolvedDesign::resolve(Design::default()).unwrap();
        let ty = ResultType::Array(Box::new(ResultType::Primitive(Primitive::Int)));
        let v = convert_header(&design, &ty, "h", "1, 2,3").unwrap();
        assert_eq!(
            v,
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn range_constraint_applies_per_array_element() {
        let c = Constraint::Range { min: 0, max: 10 };
        let ok = Value::Array(vec![Value::Int(1), Value::Int(9)]);
        assert!(check_constraint("a", &ok, &c).is_none());
        let bad = Value::Array(vec![Value::Int(1), Value::Int(99)]);
        assert!(check_constraint("a", &bad, &c).is_some());
    }
}
