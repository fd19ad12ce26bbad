//! `null`, `bool`, `int` and `float`, resolved implicitly from plain scalars.

use std::sync::Arc;

use super::{Kind, TypeDescriptor, TypeRef};
use crate::parse_scalars::{
    is_yaml_float, is_yaml_int, is_yaml_null, parse_yaml_bool, parse_yaml_float, parse_yaml_int,
};
use crate::value::Value;
use crate::zmij_format::float_repr;

pub(crate) const NULL: &str = "tag:yaml.org,2002:null";
pub(crate) const BOOL: &str = "tag:yaml.org,2002:bool";
pub(crate) const INT: &str = "tag:yaml.org,2002:int";
pub(crate) const FLOAT: &str = "tag:yaml.org,2002:float";

fn null_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(NULL, Kind::Scalar)
        .resolve_scalar(|data, _| is_yaml_null(data))
        .construct_scalar(|_, _| Ok(Value::Null))
        .predicate(Value::is_null)
        .represent_style("canonical", |_, _| "~".into())
        .represent_style("lowercase", |_, _| "null".into())
        .represent_style("uppercase", |_, _| "NULL".into())
        .represent_style("camelcase", |_, _| "Null".into())
        .represent_style("empty", |_, _| String::new())
        .default_style("lowercase")
        .build()
        .ok()
}

fn bool_repr(value: &Value, style: &str) -> String {
    let b = value.as_bool().unwrap_or_default();
    match (style, b) {
        ("uppercase", true) => "TRUE",
        ("uppercase", false) => "FALSE",
        ("camelcase", true) => "True",
        ("camelcase", false) => "False",
        (_, true) => "true",
        (_, false) => "false",
    }
    .to_owned()
}

fn bool_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(BOOL, Kind::Scalar)
        .resolve_scalar(|data, _| parse_yaml_bool(data).is_some())
        .construct_scalar(|data, _| {
            parse_yaml_bool(data)
                .map(Value::Bool)
                .ok_or_else(|| format!("invalid boolean \"{data}\""))
        })
        .predicate(|v| matches!(v, Value::Bool(_)))
        .represent_style("lowercase", bool_repr)
        .represent_style("uppercase", bool_repr)
        .represent_style("camelcase", bool_repr)
        .default_style("lowercase")
        .build()
        .ok()
}

fn construct_int(data: &str, _: &str) -> Result<Value, String> {
    Ok(match parse_yaml_int(data) {
        Ok(i) => Value::Int(i),
        Err(f) => Value::Float(f),
    })
}

/// Sign, prefix and magnitude digits, e.g. `-0b101`.
fn int_in_radix(value: &Value, prefix: &str, radix: u32) -> String {
    let i = value.as_i64().unwrap_or_default();
    let mag = i.unsigned_abs();
    let digits = match radix {
        2 => format!("{mag:b}"),
        8 => format!("{mag:o}"),
        16 => format!("{mag:X}"),
        _ => format!("{mag}"),
    };
    let sign = if i < 0 { "-" } else { "" };
    format!("{sign}{prefix}{digits}")
}

fn int_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(INT, Kind::Scalar)
        .resolve_scalar(|data, _| is_yaml_int(data))
        .construct_scalar(construct_int)
        .predicate(|v| matches!(v, Value::Int(_)))
        .represent_style("binary", |v, _| int_in_radix(v, "0b", 2))
        .represent_style("octal", |v, _| int_in_radix(v, "0o", 8))
        .represent_style("decimal", |v, _| int_in_radix(v, "", 10))
        .represent_style("hexadecimal", |v, _| int_in_radix(v, "0x", 16))
        .default_style("decimal")
        .style_alias("2", "binary")
        .style_alias("bin", "binary")
        .style_alias("8", "octal")
        .style_alias("oct", "octal")
        .style_alias("10", "decimal")
        .style_alias("dec", "decimal")
        .style_alias("16", "hexadecimal")
        .style_alias("hex", "hexadecimal")
        .build()
        .ok()
}

fn float_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(FLOAT, Kind::Scalar)
        .resolve_scalar(|data, _| is_yaml_float(data))
        .construct_scalar(|data, _| Ok(Value::Float(parse_yaml_float(data))))
        .predicate(|v| matches!(v, Value::Float(_)))
        .represent_style("lowercase", |v, style| float_repr(v.as_f64().unwrap_or_default(), style))
        .represent_style("uppercase", |v, style| float_repr(v.as_f64().unwrap_or_default(), style))
        .represent_style("camelcase", |v, style| float_repr(v.as_f64().unwrap_or_default(), style))
        .default_style("lowercase")
        .build()
        .ok()
}

pub(super) fn types() -> Vec<TypeRef> {
    [null_type(), bool_type(), int_type(), float_type()]
        .into_iter()
        .flatten()
        .map(Arc::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_styles() {
        let t = int_type().unwrap();
        let v = Value::Int(-10);
        assert_eq!(t.represent(&v, None).unwrap().unwrap(), "-10");
        assert_eq!(t.represent(&v, Some("bin")).unwrap().unwrap(), "-0b1010");
        assert_eq!(t.represent(&v, Some("16")).unwrap().unwrap(), "-0xA");
        assert_eq!(t.represent(&Value::Int(8), Some("octal")).unwrap().unwrap(), "0o10");
    }

    #[test]
    fn int_overflow_becomes_float() {
        assert_eq!(
            construct_int("18446744073709551616", INT),
            Ok(Value::Float(18446744073709551616.0))
        );
    }

    #[test]
    fn null_styles() {
        let t = null_type().unwrap();
        assert_eq!(t.represent(&Value::Null, Some("canonical")).unwrap().unwrap(), "~");
        assert_eq!(t.represent(&Value::Null, None).unwrap().unwrap(), "null");
        assert_eq!(t.represent(&Value::Null, Some("empty")).unwrap().unwrap(), "");
    }

    #[test]
    fn bool_and_float_styles() {
        let b = bool_type().unwrap();
        assert_eq!(b.represent(&Value::Bool(true), Some("camelcase")).unwrap().unwrap(), "True");
        let f = float_type().unwrap();
        assert_eq!(f.represent(&Value::Float(f64::INFINITY), Some("uppercase")).unwrap().unwrap(), ".INF");
        assert_eq!(f.represent(&Value::Float(2.0), None).unwrap().unwrap(), "2.0");
    }
}
