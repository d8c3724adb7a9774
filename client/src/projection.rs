use serde_json::{Map, Value};

/// Walks a `.`-separated path through nested objects.
///
/// Returns `None` when a segment is missing or an intermediate value is not
/// an object.
pub fn resolve<'a>(path: &str, record: &'a Value) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Flat mapping of each requested path to its resolved value, `null` when absent.
pub fn project(record: &Value, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .map(|path| {
            let value = resolve(path, record).cloned().unwrap_or(Value::Null);
            (path.clone(), value)
        })
        .collect()
}

/// Flattens nested objects into dotted keys; arrays and scalars are leaves.
pub fn flatten(record: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Some(object) = record.as_object() {
        flatten_into(&mut flat, None, object);
    }
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(flat, Some(&path), nested),
            _ => {
                flat.insert(path, value.clone());
            }
        }
    }
}
