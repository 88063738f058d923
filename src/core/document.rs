// Documents - the JSON shape every stored record takes on the way in and out

use serde_json::{Map, Value};
use std::cmp::Ordering;

pub type Document = Map<String, Value>;

/// Key of the identifier field on every stored document
pub const ID_FIELD: &str = "_id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Resolves a dotted path (`movieData.genre`) against a document.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Total order used by sort stages: null/missing < numbers < strings < everything else.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_path_nested() {
        let d = doc(json!({"movieData": {"genre": "Sci-Fi"}, "rating": 4}));
        assert_eq!(get_path(&d, "movieData.genre"), Some(&json!("Sci-Fi")));
        assert_eq!(get_path(&d, "rating"), Some(&json!(4)));
        assert_eq!(get_path(&d, "movieData.title"), None);
        assert_eq!(get_path(&d, "rating.value"), None);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(3.5))), Ordering::Less);
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&Value::Null), None), Ordering::Equal);
    }
}
