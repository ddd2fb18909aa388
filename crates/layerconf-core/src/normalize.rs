use crate::value::{Bag, Value};

/// The sole point where externally-decoded values (JSON, YAML, HTTP bodies)
/// become part of the internal model.
///
/// Parser and source drivers decode with whatever crate fits the wire format
/// and do a trivial structural conversion into [`Value`] (preserving
/// original key case and the decoder's own number representation); every one
/// of them must then route the result through this function before handing
/// it to the manager. It does two things, both idempotent:
///
/// - lowercases every map key, so lookups are case-insensitive regardless of
///   source formatting
/// - narrows whole-numbered floats into `Value::Int`, since JSON has no
///   integer/float distinction and YAML's is frequently accidental (`1` vs
///   `1.0` meaning the same config value)
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Map(bag) => {
            let mut out = Bag::new();
            for (key, nested) in bag.into_inner() {
                out.insert(key, normalize(nested));
            }
            Value::Map(out)
        }
        Value::Seq(items) => Value::Seq(items.into_iter().map(normalize).collect()),
        Value::Float(f) if is_whole_in_i64_range(f) => {
            #[allow(clippy::cast_possible_truncation)]
            Value::Int(f as i64)
        }
        other => other,
    }
}

fn is_whole_in_i64_range(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
}
