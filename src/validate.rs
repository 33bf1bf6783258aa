//! Projection validator: decides whether the mapping between a method result
//! and one HTTP response descriptor is well-formed.
//!
//! Validation is a pure function over the frozen design. All violated rules
//! are reported together (no short-circuit on the first failure); the
//! diagnostics for one response are newline-joined into a single failure.

use crate::error::{merge_errors, Error, INVALID_DESIGN};
use crate::model::{
    Method, ResolvedDesign, ResponseDescriptor, ResultType, ViewModel,
};
use std::fmt;
use tracing::debug;

/// Where a diagnostic is attributed: the endpoint itself or one of its HTTP
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticScope {
    Endpoint,
    Response,
}

/// One structured validation failure, attributable to a service, endpoint
/// and violated rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub service: String,
    pub endpoint: String,
    pub scope: DiagnosticScope,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            DiagnosticScope::Endpoint => write!(
                f,
                "service {:?} HTTP endpoint {:?}: {}",
                self.service, self.endpoint, self.message
            ),
            DiagnosticScope::Response => write!(
                f,
                "HTTP response of service {:?} HTTP endpoint {:?}: {}",
                self.service, self.endpoint, self.message
            ),
        }
    }
}

/// Names the (service, endpoint) pair diagnostics attribute to.
#[derive(Debug, Clone, Copy)]
pub struct EndpointRef<'a> {
    pub service: &'a str,
    pub endpoint: &'a str,
}

impl<'a> EndpointRef<'a> {
    fn endpoint_diag(&self, message: String) -> Diagnostic {
        Diagnostic {
            service: self.service.to_string(),
            endpoint: self.endpoint.to_string(),
            scope: DiagnosticScope::Endpoint,
            message,
        }
    }

    fn response_diag(&self, message: String) -> Diagnostic {
        Diagnostic {
            service: self.service.to_string(),
            endpoint: self.endpoint.to_string(),
            scope: DiagnosticScope::Response,
            message,
        }
    }
}

fn header_type_message(attribute: &str) -> String {
    format!(
        "attribute {:?} used in HTTP headers must be a primitive type or an array of primitive types.",
        attribute
    )
}

/// Validate one (result, response) pair. Returns all violated rules in
/// detection order; an empty vector means the response is well-formed.
pub fn validate_response(
    design: &ResolvedDesign,
    ep: EndpointRef<'_>,
    result: &ResultType,
    resp: &ResponseDescriptor,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let shape = design.deref(result);

    if shape.is_empty() {
        if !resp.headers.is_empty() {
            diags.push(ep.response_diag(
                "response defines headers but result is empty".to_string(),
            ));
        }
    } else {
        for binding in &resp.headers {
            match shape {
                ResultType::Object(_) => {
                    match design.attribute(shape, &binding.attribute_name) {
                        Some(attr) => {
                            if !design.legal_header_type(&attr.ty) {
                                diags.push(ep.endpoint_diag(header_type_message(
                                    &binding.attribute_name,
                                )));
                            }
                        }
                        None => {
                            diags.push(ep.response_diag(format!(
                                "header {:?} has no equivalent attribute in result type, use notation 'attribute_name:header_name' to identify corresponding result type attribute.",
                                binding.wire_name
                            )));
                            diags.push(ep.endpoint_diag(header_type_message(
                                &binding.attribute_name,
                            )));
                        }
                    }
                }
                ResultType::Array(elem) => {
                    // Whole array result carried by the header.
                    if !design.is_primitive(elem) {
                        diags.push(ep.endpoint_diag(
                            "Array result is mapped to an HTTP header but is not an array of primitive types.".to_string(),
                        ));
                    }
                }
                ResultType::Primitive(_) => {
                    // Whole primitive result carried by the header; always legal.
                }
                _ => {
                    diags.push(
                        ep.endpoint_diag(header_type_message(&binding.attribute_name)),
                    );
                }
            }
        }
    }

    if resp.content_type.as_deref() == Some("text/plain") {
        if let Some(body) = design.body_shape(result, resp) {
            let ok = matches!(
                design.deref(&body),
                ResultType::Primitive(crate::model::Primitive::String)
                    | ResultType::Primitive(crate::model::Primitive::Bytes)
            );
            if !ok {
                diags.push(ep.response_diag(
                    "Result type must be String or Bytes when ContentType is 'text/plain'"
                        .to_string(),
                ));
            }
        }
    }

    if resp.skip_body_coding && resp.has_grpc_transport {
        diags.push(ep.endpoint_diag(
            "Endpoint response cannot use SkipResponseBodyEncodeDecode and define a gRPC transport."
                .to_string(),
        ));
    }

    diags
}

/// Check that every declared view references only attributes present in the
/// result type.
pub fn validate_views(
    design: &ResolvedDesign,
    ep: EndpointRef<'_>,
    result: &ResultType,
    views: &ViewModel,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let shape = design.deref(result);
    for view in &views.views {
        for name in &view.attribute_names {
            if design.attribute(shape, name).is_none() {
                diags.push(ep.endpoint_diag(format!(
                    "view {:?} references unknown attribute {:?} in result type",
                    view.name, name
                )));
            }
        }
    }
    diags
}

/// Validate a method: its views and every HTTP response.
pub fn validate_method(
    design: &ResolvedDesign,
    service: &str,
    method: &Method,
) -> Vec<Diagnostic> {
    let ep = EndpointRef {
        service,
        endpoint: &method.name,
    };
    let mut diags = validate_views(design, ep, &method.result, &method.views);
    for resp in &method.responses {
        diags.extend(validate_response(design, ep, &method.result, resp));
    }
    diags
}

/// Validate the whole design. All diagnostics are joined into a single
/// `invalid_design` error, one per line, in detection order.
pub fn validate_design(design: &ResolvedDesign) -> Result<(), Error> {
    let mut err = None;
    for service in &design.design.services {
        for method in &service.methods {
            let diags = validate_method(design, &service.name, method);
            if !diags.is_empty() {
                debug!(
                    service = %service.name,
                    method = %method.name,
                    count = diags.len(),
                    "projection validation failed"
                );
            }
            err = merge_errors(err, diagnostics_to_error(&diags));
        }
    }
    match err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Aggregate the diagnostics of one validation unit into a single error,
/// newline-joined in detection order. `None` when there are none.
pub fn diagnostics_to_error(diags: &[Diagnostic]) -> Option<Error> {
    if diags.is_empty() {
        return None;
    }
    let detail = diags
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Some(INVALID_DESIGN.error(detail))
}
