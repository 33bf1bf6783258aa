//! Response decode planner: turns a validated response descriptor into a
//! deterministic plan for reconstructing the typed result from a wire
//! response.
//!
//! Planning is a pure function: for a fixed (result, views, response) triple
//! the plan is structurally identical on every call. Only ordered containers
//! are used, so rendering a plan is byte-stable too.

use crate::model::{
    ResolvedDesign, ResponseDescriptor, ResultType, View, ViewModel,
};
use crate::validate::EndpointRef;

/// Reserved transport header carrying the selected view identifier on
/// multi-view responses. Absent or empty selects the default view.
pub const VIEW_HEADER: &str = "X-Result-View";

/// Extract one attribute (or the whole non-object result) from a named
/// wire header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderStep {
    pub wire_name: String,
    /// `None` when the whole (non-object) result is carried by this header.
    pub attribute: Option<String>,
    pub required: bool,
    /// Resolved primitive or array-of-primitive type the header text is
    /// converted to.
    pub ty: ResultType,
}

/// Decode the remaining response body into the given shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyStep {
    /// The object restricted to body attributes, or the literal
    /// primitive/array/map type.
    pub shape: ResultType,
    /// Content type the emitter selects a decoder for; JSON when absent.
    pub content_type: Option<String>,
}

/// Read the view discriminator header and project the decoded body onto the
/// selected view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStep {
    pub header: String,
    /// Known views, default first, in declaration order.
    pub views: Vec<View>,
}

/// Ordered extraction/assembly steps for one (method, response) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodePlan {
    pub service: String,
    pub endpoint: String,
    pub status_code: u16,
    /// Full result type the assembled value is re-validated against.
    pub result: ResultType,
    pub headers: Vec<HeaderStep>,
    pub body: Option<BodyStep>,
    pub view: Option<ViewStep>,
}

/// Build the decode plan for a validated response.
pub fn plan(
    design: &ResolvedDesign,
    ep: EndpointRef<'_>,
    result: &ResultType,
    views: &ViewModel,
    resp: &ResponseDescriptor,
) -> DecodePlan {
    let shape = design.deref(result);

    let headers = resp
        .headers
        .iter()
        .map(|binding| match design.attribute(shape, &binding.attribute_name) {
            Some(attr) => HeaderStep {
                wire_name: binding.wire_name.clone(),
                attribute: Some(attr.name.clone()),
                required: attr.required,
                ty: design.deref(&attr.ty).clone(),
            },
            // Whole non-object result carried by the header.
            None => HeaderStep {
                wire_name: binding.wire_name.clone(),
                attribute: None,
                required: true,
                ty: shape.clone(),
            },
        })
        .collect();

    let body = if resp.skip_body_coding {
        None
    } else {
        design.body_shape(result, resp).map(|shape| BodyStep {
            shape,
            content_type: resp.content_type.clone(),
        })
    };

    let view = if views.is_multi_view() {
        Some(ViewStep {
            header: VIEW_HEADER.to_string(),
            views: views.materialize(shape),
        })
    } else {
        None
    };

    DecodePlan {
        service: ep.service.to_string(),
        endpoint: ep.endpoint.to_string(),
        status_code: resp.status_code,
        result: shape.clone(),
        headers,
        body,
        view,
    }
}

/// Plans for every response of a method, in declaration order.
pub fn plan_method(
    design: &ResolvedDesign,
    ep: EndpointRef<'_>,
    result: &ResultType,
    views: &ViewModel,
    responses: &[ResponseDescriptor],
) -> Vec<DecodePlan> {
    responses
        .iter()
        .map(|resp| plan(design, ep, result, views, resp))
        .collect()
}
