//! Float formatting for YAML output. zmij renders the shortest round-trip digits but may
//! print `4e-6` or `3`, which would load back as an integer. A `.0` is inserted in that case.

use num_traits::float::FloatCore;
use zmij::Float;

/// Append `f` as a YAML float, always carrying a `.` or an exponent.
pub(crate) fn push_float_string<F: Float + FloatCore>(target: &mut String, f: F) {
    if f.is_nan() {
        target.push_str(".nan");
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            target.push_str(".inf");
        } else {
            target.push_str("-.inf");
        }
    } else {
        let mut buf = zmij::Buffer::new();
        let s = buf.format_finite(f);
        if s.contains('.') {
            target.push_str(s);
        } else if let Some(exp_pos) = s.find(['e', 'E']) {
            // "4e-6" -> "4.0e-6"
            target.push_str(&s[..exp_pos]);
            target.push_str(".0");
            target.push_str(&s[exp_pos..]);
        } else {
            target.push_str(s);
            target.push_str(".0");
        }
    }
}

/// Float representation in one of the `lowercase`, `uppercase` or `camelcase` styles.
/// The style only affects the special values.
pub(crate) fn float_repr(f: f64, style: &str) -> String {
    let special = if f.is_nan() {
        Some([".nan", ".NAN", ".NaN"])
    } else if f == f64::INFINITY {
        Some([".inf", ".INF", ".Inf"])
    } else if f == f64::NEG_INFINITY {
        Some(["-.inf", "-.INF", "-.Inf"])
    } else {
        None
    };
    if let Some(forms) = special {
        let form = match style {
            "uppercase" => forms[1],
            "camelcase" => forms[2],
            _ => forms[0],
        };
        return form.to_owned();
    }
    if f == 0.0 && f.is_sign_negative() {
        return "-0.0".to_owned();
    }
    let mut s = String::new();
    push_float_string(&mut s, f);
    s
}
