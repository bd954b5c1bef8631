//! Structural comparisons over [`PropValue`].

use crate::value::PropValue;

/// Identity, or for two lists / two maps of the same shape, pairwise identity
/// one level deep.
pub fn shallow_equals(a: &PropValue, b: &PropValue) -> bool {
    if a.is_same(b) {
        return true;
    }
    match (a, b) {
        (PropValue::List(a), PropValue::List(b)) => shallow_equals_slice(a, b),
        (PropValue::Map(a), PropValue::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| value.is_same(other)))
        }
        _ => false,
    }
}

/// Recursive structural equality.
pub fn deep_equals(a: &PropValue, b: &PropValue) -> bool {
    if a.is_same(b) {
        return true;
    }
    match (a, b) {
        (PropValue::List(a), PropValue::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| deep_equals(a, b))
        }
        (PropValue::Map(a), PropValue::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| deep_equals(value, other)))
        }
        _ => false,
    }
}

/// Shallow equality of two dependency lists.
pub fn shallow_equals_slice(a: &[PropValue], b: &[PropValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.is_same(b))
}
