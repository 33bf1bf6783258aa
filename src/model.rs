//! In-memory service design model: result types, views, HTTP response bindings.

use std::collections::{HashMap, HashSet};

/// Scalar types that can travel in an HTTP header or a text body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Bytes,
    Int,
    Float,
    Bool,
}

/// Shape of a method result or of any nested attribute type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    Empty,
    Primitive(Primitive),
    /// Named attributes in declaration order.
    Object(Vec<AttributeSpec>),
    Array(Box<ResultType>),
    /// Key type, element type.
    Map(Box<ResultType>, Box<ResultType>),
    /// Reference into the design's named type definitions.
    UserTypeRef(String),
}

impl ResultType {
    pub fn is_empty(&self) -> bool {
        matches!(self, ResultType::Empty)
    }

    pub fn attributes(&self) -> Option<&[AttributeSpec]> {
        match self {
            ResultType::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// All attribute names in declaration order (empty for non-objects).
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes()
            .map(|attrs| attrs.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub ty: ResultType,
    pub required: bool,
    pub constraint: Option<Constraint>,
}

/// Validation rules re-checked against decoded values.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Range { min: i64, max: i64 },
    Enum(Vec<Literal>),
    Length { min: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    String(String),
}

/// Name of the implicit view covering all attributes.
pub const DEFAULT_VIEW: &str = "default";

/// A named projection of an object result onto a subset of its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub attribute_names: Vec<String>,
}

/// Declared views of a method result. The `default` view is implicit when
/// not declared and covers every attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub views: Vec<View>,
}

impl ViewModel {
    /// True when a view other than the implicit default exists, which forces
    /// a view-selection step at decode time.
    pub fn is_multi_view(&self) -> bool {
        self.views.iter().any(|v| v.name != DEFAULT_VIEW)
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Materialize all views for a result type: `default` first (declared or
    /// implicit over all attributes), then declared views in order.
    pub fn materialize(&self, result: &ResultType) -> Vec<View> {
        let mut out = Vec::with_capacity(self.views.len() + 1);
        match self.get(DEFAULT_VIEW) {
            Some(v) => out.push(v.clone()),
            None => out.push(View {
                name: DEFAULT_VIEW.to_string(),
                attribute_names: result.attribute_names(),
            }),
        }
        for v in &self.views {
            if v.name != DEFAULT_VIEW {
                out.push(v.clone());
            }
        }
        out
    }
}

/// Association between a wire header name and a result attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBinding {
    pub wire_name: String,
    pub attribute_name: String,
}

impl HeaderBinding {
    /// Parse `"attribute:Wire-Name"` notation; a bare name binds both sides.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((attr, wire)) => HeaderBinding {
                wire_name: wire.trim().to_string(),
                attribute_name: attr.trim().to_string(),
            },
            None => HeaderBinding {
                wire_name: spec.trim().to_string(),
                attribute_name: spec.trim().to_string(),
            },
        }
    }
}

/// One HTTP response alternative of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub headers: Vec<HeaderBinding>,
    pub skip_body_coding: bool,
    pub has_grpc_transport: bool,
}

impl Default for ResponseDescriptor {
    fn default() -> Self {
        ResponseDescriptor {
            status_code: 200,
            content_type: None,
            headers: Vec::new(),
            skip_body_coding: false,
            has_grpc_transport: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub result: ResultType,
    pub views: ViewModel,
    pub responses: Vec<ResponseDescriptor>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub ty: ResultType,
}

/// Root of a parsed description: named types and services.
#[derive(Debug, Clone, Default)]
pub struct Design {
    pub types: Vec<TypeDef>,
    pub services: Vec<Service>,
}

/// Frozen build context: the design plus name lookup for user types. No
/// mutable registry survives into validation or planning.
#[derive(Debug, Clone)]
pub struct ResolvedDesign {
    pub design: Design,
    types_by_name: HashMap<String, usize>,
    services_by_name: HashMap<String, usize>,
}

impl ResolvedDesign {
    pub fn resolve(design: Design) -> Result<Self, String> {
        let mut types_by_name = HashMap::new();
        let mut services_by_name = HashMap::new();
        for (i, t) in design.types.iter().enumerate() {
            if types_by_name.insert(t.name.clone(), i).is_some() {
                return Err(format!("Duplicate type name: {}", t.name));
            }
        }
        for (i, s) in design.services.iter().enumerate() {
            if services_by_name.insert(s.name.clone(), i).is_some() {
                return Err(format!("Duplicate service name: {}", s.name));
            }
        }
        Ok(ResolvedDesign {
            design,
            types_by_name,
            services_by_name,
        })
    }

    pub fn get_type(&self, name: &str) -> Option<&ResultType> {
        self.types_by_name
            .get(name)
            .map(|&i| &self.design.types[i].ty)
    }

    pub fn get_service(&self, name: &str) -> Option<&Service> {
        self.services_by_name
            .get(name)
            .map(|&i| &self.design.services[i])
    }

    /// Follow user-type references until a structural shape. A visited set
    /// tolerates reference cycles; an unresolvable or cyclic reference is
    /// returned as-is.
    pub fn deref<'a>(&'a self, ty: &'a ResultType) -> &'a ResultType {
        let mut seen = HashSet::new();
        let mut cur = ty;
        while let ResultType::UserTypeRef(name) = cur {
            if !seen.insert(name.clone()) {
                return cur;
            }
            match self.get_type(name) {
                Some(t) => cur = t,
                None => return cur,
            }
        }
        cur
    }

    pub fn is_primitive(&self, ty: &ResultType) -> bool {
        matches!(self.deref(ty), ResultType::Primitive(_))
    }

    /// Legal as an HTTP header value: a primitive or an array of primitives.
    /// Objects, maps and arrays of objects are not.
    pub fn legal_header_type(&self, ty: &ResultType) -> bool {
        match self.deref(ty) {
            ResultType::Primitive(_) => true,
            ResultType::Array(elem) => self.is_primitive(elem),
            _ => false,
        }
    }

    /// Look up an attribute by name, dereferencing user types first.
    pub fn attribute<'a>(
        &'a self,
        ty: &'a ResultType,
        name: &str,
    ) -> Option<&'a AttributeSpec> {
        self.deref(ty)
            .attributes()
            .and_then(|attrs| attrs.iter().find(|a| a.name == name))
    }

    /// Restrict an object type to a subset of attribute names, preserving
    /// declaration order. Non-objects are returned unchanged.
    pub fn restrict(&self, ty: &ResultType, keep: &[String]) -> ResultType {
        match self.deref(ty) {
            ResultType::Object(attrs) => ResultType::Object(
                attrs
                    .iter()
                    .filter(|a| keep.contains(&a.name))
                    .cloned()
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Body shape of a response after header-bound attributes are removed.
    /// `None` when nothing is carried in the body: an empty result, an object
    /// fully covered by headers, or a non-object result bound wholesale to a
    /// header.
    pub fn body_shape(
        &self,
        result: &ResultType,
        resp: &ResponseDescriptor,
    ) -> Option<ResultType> {
        match self.deref(result) {
            ResultType::Empty => None,
            shape @ ResultType::Object(attrs) => {
                let keep: Vec<String> = attrs
                    .iter()
                    .filter(|a| {
                        !resp.headers.iter().any(|h| h.attribute_name == a.name)
                    })
                    .map(|a| a.name.clone())
                    .collect();
                if keep.is_empty() {
                    None
                } else {
                    Some(self.restrict(shape, &keep))
                }
            }
            other => {
                if resp.headers.is_empty() {
                    Some(other.clone())
                } else {
                    None
                }
            }
        }
    }
}
