//! Parse description source into the design model using PEST.

use crate::model::*;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct DesignParser;

/// Parse description source into a [`Design`].
pub fn parse(source: &str) -> Result<Design, String> {
    let pairs = DesignParser::parse(Rule::design, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_design(pair)
}

fn build_design(pair: pest::iterators::Pair<Rule>) -> Result<Design, String> {
    let mut types = Vec::new();
    let mut services = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_def => types.push(build_type_def(inner)?),
            Rule::service_def => services.push(build_service(inner)?),
            _ => {}
        }
    }
    Ok(Design { types, services })
}

fn build_type_def(pair: pest::iterators::Pair<Rule>) -> Result<TypeDef, String> {
    let mut name = String::new();
    let mut attrs = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::attribute => attrs.push(build_attribute(inner)?),
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("type: missing name".to_string());
    }
    Ok(TypeDef {
        name,
        ty: ResultType::Object(attrs),
    })
}

fn build_service(pair: pest::iterators::Pair<Rule>) -> Result<Service, String> {
    let mut name = String::new();
    let mut methods = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::method_def => methods.push(build_method(inner)?),
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("service: missing name".to_string());
    }
    Ok(Service { name, methods })
}

fn build_method(pair: pest::iterators::Pair<Rule>) -> Result<Method, String> {
    let mut name = String::new();
    let mut result = ResultType::Empty;
    let mut views = ViewModel::default();
    let mut responses = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::result_def => {
                let (r, v) = build_result(inner)?;
                result = r;
                views = v;
            }
            Rule::response_def => responses.push(build_response(inner)?),
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("method: missing name".to_string());
    }
    // A method with no declared response still has the default 200.
    if responses.is_empty() {
        responses.push(ResponseDescriptor::default());
    }
    Ok(Method {
        name,
        result,
        views,
        responses,
    })
}

fn build_result(
    pair: pest::iterators::Pair<Rule>,
) -> Result<(ResultType, ViewModel), String> {
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::result_object => {
                let mut attrs = Vec::new();
                let mut views = Vec::new();
                for item in inner.into_inner() {
                    match item.as_rule() {
                        Rule::attribute => attrs.push(build_attribute(item)?),
                        Rule::view_def => views.push(build_view(item)?),
                        _ => {}
                    }
                }
                return Ok((ResultType::Object(attrs), ViewModel { views }));
            }
            Rule::type_expr => {
                return Ok((build_type_expr(inner)?, ViewModel::default()));
            }
            _ => {}
        }
    }
    Err("result: missing type".to_string())
}

fn build_view(pair: pest::iterators::Pair<Rule>) -> Result<View, String> {
    let mut name = String::new();
    let mut attribute_names = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::view_attr => {
                let attr = inner
                    .into_inner()
                    .next()
                    .ok_or("view attribute: missing name")?;
                attribute_names.push(attr.as_str().to_string());
            }
            _ => {}
        }
    }
    if name.is_empty() {
        return Err("view: missing name".to_string());
    }
    Ok(View {
        name,
        attribute_names,
    })
}

fn build_attribute(pair: pest::iterators::Pair<Rule>) -> Result<AttributeSpec, String> {
    let mut name = String::new();
    let mut ty = None;
    let mut required = false;
    let mut constraint = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::type_expr => ty = Some(build_type_expr(inner)?),
            Rule::required_flag => required = true,
            Rule::constraint => constraint = Some(build_constraint(inner)?),
            _ => {}
        }
    }
    Ok(AttributeSpec {
        name,
        ty: ty.ok_or("attribute: missing type")?,
        required,
        constraint,
    })
}

fn build_type_expr(pair: pest::iterators::Pair<Rule>) -> Result<ResultType, String> {
    let inner = pair.into_inner().next().ok_or("empty type expression")?;
    match inner.as_rule() {
        Rule::base_type => Ok(ResultType::Primitive(match inner.as_str() {
            "string" => Primitive::String,
            "bytes" => Primitive::Bytes,
            "int" => Primitive::Int,
            "float" => Primitive::Float,
            "bool" => Primitive::Bool,
            other => return Err(format!("unknown base type: {}", other)),
        })),
        Rule::list_type => {
            let elem = inner.into_inner().next().ok_or("list: missing element type")?;
            Ok(ResultType::Array(Box::new(build_type_expr(elem)?)))
        }
        Rule::map_type => {
            let mut it = inner.into_inner();
            let key = it.next().ok_or("map: missing key type")?;
            let elem = it.next().ok_or("map: missing element type")?;
            Ok(ResultType::Map(
                Box::new(build_type_expr(key)?),
                Box::new(build_type_expr(elem)?),
            ))
        }
        Rule::ident => Ok(ResultType::UserTypeRef(inner.as_str().to_string())),
        other => Err(format!("unexpected type expression: {:?}", other)),
    }
}

fn build_constraint(pair: pest::iterators::Pair<Rule>) -> Result<Constraint, String> {
    let inner = pair.into_inner().next().ok_or("empty constraint")?;
    match inner.as_rule() {
        Rule::range_constraint => {
            let mut it = inner.into_inner();
            let min = parse_int(it.next().ok_or("range: missing min")?.as_str())?;
            let max = parse_int(it.next().ok_or("range: missing max")?.as_str())?;
            Ok(Constraint::Range { min, max })
        }
        Rule::length_constraint => {
            let mut it = inner.into_inner();
            // Lengths are unsigned; a negative bound is rejected here rather
            // than wrapping.
            let min = parse_uint(it.next().ok_or("len: missing min")?.as_str())?;
            let max = parse_uint(it.next().ok_or("len: missing max")?.as_str())?;
            Ok(Constraint::Length { min, max })
        }
        Rule::enum_constraint => {
            let mut values = Vec::new();
            for lit in inner.into_inner() {
                if lit.as_rule() == Rule::literal {
                    values.push(build_literal(lit)?);
                }
            }
            Ok(Constraint::Enum(values))
        }
        other => Err(format!("unexpected constraint: {:?}", other)),
    }
}

fn build_literal(pair: pest::iterators::Pair<Rule>) -> Result<Literal, String> {
    let inner = pair.into_inner().next().ok_or("empty literal")?;
    match inner.as_rule() {
        Rule::int_lit => Ok(Literal::Int(parse_int(inner.as_str())?)),
        Rule::bool_lit => Ok(Literal::Bool(inner.as_str() == "true")),
        Rule::string_lit => Ok(Literal::String(unquote(inner.as_str()))),
        other => Err(format!("unexpected literal: {:?}", other)),
    }
}

fn build_response(
    pair: pest::iterators::Pair<Rule>,
) -> Result<ResponseDescriptor, String> {
    let mut resp = ResponseDescriptor::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::int_lit => {
                let code = parse_int(inner.as_str())?;
                resp.status_code = u16::try_from(code)
                    .map_err(|_| format!("invalid status code: {}", code))?;
            }
            Rule::response_body => {
                for item in inner.into_inner() {
                    let item = item
                        .into_inner()
                        .next()
                        .ok_or("empty response item")?;
                    match item.as_rule() {
                        Rule::content_type_item => {
                            let lit = item
                                .into_inner()
                                .next()
                                .ok_or("content_type: missing value")?;
                            resp.content_type = Some(unquote(lit.as_str()));
                        }
                        Rule::header_item => {
                            let lit = item
                                .into_inner()
                                .next()
                                .ok_or("header: missing value")?;
                            resp.headers
                                .push(HeaderBinding::parse(&unquote(lit.as_str())));
                        }
                        Rule::skip_body_item => resp.skip_body_coding = true,
                        Rule::grpc_item => resp.has_grpc_transport = true,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    Ok(resp)
}

fn parse_int(s: &str) -> Result<i64, String> {
    s.parse::<i64>().map_err(|e| format!("invalid integer {:?}: {}", s, e))
}

fn parse_uint(s: &str) -> Result<u64, String> {
    s.parse::<u64>()
        .map_err(|_| format!("invalid length bound {:?}: must be a non-negative integer", s))
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_string()
}
