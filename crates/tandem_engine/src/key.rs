//! Scalar key values with a total cross-type order.
//!
//! Primary keys and index entries are scalars extracted from record fields.
//! Both backends of the document store observe the same ordering, so the
//! order here is fixed: null, then numbers (integers and floats merged
//! numerically), then text.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A scalar usable as a primary key or index entry.
#[derive(Debug, Clone)]
pub enum KeyValue {
    /// Absent or null field value. Sorts before everything else.
    Null,
    /// Integer key.
    Integer(i64),
    /// Floating-point key.
    Float(f64),
    /// Text key. Sorts after all numbers.
    Text(String),
}

impl KeyValue {
    /// Extracts a key from a JSON field value.
    ///
    /// Returns `None` for values that cannot serve as keys (objects,
    /// arrays, booleans, nulls) - records carrying those in an indexed
    /// field are simply absent from the index.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Rank used to order keys of different kinds.
    fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Integer(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Exact comparison of an integer against a float, with no precision loss
/// from casting the integer. NaN sorts above every number.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    // 2^63, exactly representable; every i64 is strictly below it and
    // at or above its negation.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    // f is finite and within i64 range, so truncation is exact.
    #[allow(clippy::cast_possible_truncation)]
    let whole = f.trunc() as i64;
    match i.cmp(&whole) {
        Ordering::Equal if f.fract() > 0.0 => Ordering::Less,
        Ordering::Equal if f.fract() < 0.0 => Ordering::Greater,
        other => other,
    }
}

/// Numeric float order with NaN as the largest number and `-0.0 == 0.0`,
/// so equality agrees with [`cmp_int_float`].
fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => cmp_floats(*a, *b),
            (Self::Integer(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn any_key() -> impl Strategy<Value = KeyValue> {
        prop_oneof![
            Just(KeyValue::Null),
            any::<i64>().prop_map(KeyValue::Integer),
            any::<f64>().prop_map(KeyValue::Float),
            "[a-z]{0,8}".prop_map(KeyValue::Text),
        ]
    }

    proptest! {
        /// The order must satisfy `BTreeMap`'s contract for arbitrary keys,
        /// NaN and infinities included.
        #[test]
        fn comparison_is_a_total_order(
            a in any_key(),
            b in any_key(),
            c in any_key(),
        ) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert_eq!(a.cmp(&a), Ordering::Equal);
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }
    }

    #[test]
    fn extract_from_json() {
        assert_eq!(KeyValue::from_json(&json!(7)), Some(KeyValue::Integer(7)));
        assert_eq!(
            KeyValue::from_json(&json!(1.5)),
            Some(KeyValue::Float(1.5))
        );
        assert_eq!(
            KeyValue::from_json(&json!("abc")),
            Some(KeyValue::Text("abc".into()))
        );
        assert_eq!(KeyValue::from_json(&json!(null)), None);
        assert_eq!(KeyValue::from_json(&json!(true)), None);
        assert_eq!(KeyValue::from_json(&json!([1])), None);
        assert_eq!(KeyValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn numbers_merge_across_kinds() {
        assert!(KeyValue::Integer(1) < KeyValue::Float(1.5));
        assert!(KeyValue::Float(1.5) < KeyValue::Integer(2));
        assert_eq!(KeyValue::Integer(2), KeyValue::Float(2.0));
    }

    #[test]
    fn adjacent_large_integers_stay_distinct() {
        // Above 2^53 an f64 cannot tell neighboring integers apart, so
        // the comparison must never go through a cast.
        let lo = KeyValue::Integer(1 << 53);
        let hi = KeyValue::Integer((1 << 53) + 1);
        assert_ne!(lo, hi);
        assert!(lo < hi);
        assert!(KeyValue::Integer(i64::MAX - 1) < KeyValue::Integer(i64::MAX));
    }

    #[test]
    fn int_float_comparison_is_exact_at_the_edges() {
        assert_eq!(KeyValue::Integer(1 << 53), KeyValue::Float(9007199254740992.0));
        assert!(KeyValue::Integer((1 << 53) + 1) > KeyValue::Float(9007199254740992.0));
        assert!(KeyValue::Integer(i64::MAX) < KeyValue::Float(f64::INFINITY));
        assert!(KeyValue::Integer(i64::MIN) > KeyValue::Float(f64::NEG_INFINITY));
        assert!(KeyValue::Integer(i64::MAX) < KeyValue::Float(f64::NAN));
        assert!(KeyValue::Integer(0) > KeyValue::Float(-0.5));
        assert_eq!(KeyValue::Integer(0), KeyValue::Float(-0.0));
    }

    #[test]
    fn numbers_sort_before_text() {
        assert!(KeyValue::Integer(999) < KeyValue::Text("0".into()));
        assert!(KeyValue::Null < KeyValue::Integer(i64::MIN));
    }

    #[test]
    fn text_sorts_lexicographically() {
        assert!(KeyValue::Text("a".into()) < KeyValue::Text("b".into()));
        assert!(KeyValue::Text("a".into()) < KeyValue::Text("aa".into()));
    }

    #[test]
    fn usable_in_ordered_map() {
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(KeyValue::Integer(3), "c");
        map.insert(KeyValue::Integer(1), "a");
        map.insert(KeyValue::Text("x".into()), "d");
        map.insert(KeyValue::Integer(2), "b");

        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec!["a", "b", "c", "d"]);
    }
}
