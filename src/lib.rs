//! # svcdsl: Service Contract DSL, Response Projection and Decode Planning
//!
//! A design-by-contract toolkit for network services: service methods, their
//! result types (with named views) and HTTP response bindings are described
//! declaratively; the toolkit validates the description for internal
//! consistency and plans the decoding of wire responses back into typed
//! results.
//!
//! ## Description structure
//!
//! - **Types**: reusable named object types
//! - **Services**: named services with methods
//! - **Methods**: a result type (primitive, object with views, `list<T>`,
//!   `map<K, V>`, or a named type) and one or more `response` blocks
//! - **Responses**: status code, `content_type`, `header` bindings
//!   (`"attribute:Wire-Name"` notation), `skip_body`, `grpc`
//!
//! ## Example description
//!
//! ```text
//! service Storage {
//!   method Show {
//!     result {
//!       name: string required;
//!       id: int;
//!       view tiny { name; }
//!     }
//!     response 200 {
//!       header "id:Account-Id";
//!     }
//!   }
//! }
//! ```
//!
//! ## Pipeline
//!
//! description → [`parse`] → [`ResolvedDesign`] → [`validate_design`]
//! (exhaustive, attributable diagnostics) → [`plan_method`] →
//! [`decode_response`] (or a generated decoder honoring the same contract).

pub mod decode;
pub mod dump;
pub mod error;
pub mod model;
pub mod parser;
pub mod plan;
pub mod validate;
pub mod value;

pub use decode::{decode_response, decode_with_plan, DecodedResult, WireResponse};
pub use error::{merge_errors, Error, ErrorClass};
pub use model::{
    Design, HeaderBinding, Method, ResolvedDesign, ResponseDescriptor, ResultType,
    Service, View, ViewModel, DEFAULT_VIEW,
};
pub use parser::parse;
pub use plan::{plan, plan_method, DecodePlan, VIEW_HEADER};
pub use validate::{
    diagnostics_to_error, validate_design, validate_method, validate_response,
    Diagnostic, DiagnosticScope, EndpointRef,
};
