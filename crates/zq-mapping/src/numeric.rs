use serde_json::{Number, Value};

/// Read a number from a JSON number or a numeric string
pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        _ => None,
    }
}

/// Wrap a float as a JSON number, falling back to zero for non-finite input
pub(crate) fn f64_to_value(number: f64) -> Value {
    Number::from_f64(number).map_or_else(|| Value::from(0), Value::Number)
}
