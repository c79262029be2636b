use serde_json::Value;

/// Extracts a value from nested data using dot notation.
///
/// Each segment is a map key or, on a sequence, a non-negative integer
/// index. Any miss (absent key, out-of-range index, non-indexable value,
/// JSON `null`) short-circuits to `None`. An empty path returns the root
/// unchanged. Malformed paths never panic.
pub fn resolve<'v>(data: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                if !is_index_literal(segment) {
                    return None;
                }
                items.get(segment.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

fn is_index_literal(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Looks up the value feeding one field: a truthy flat `data[id]` entry
/// wins, otherwise the (optionally prefixed) dotted path is resolved.
pub fn field_value<'v>(
    data: &'v Value,
    id: &str,
    path: &str,
    prefix: &str,
) -> Option<&'v Value> {
    if let Some(flat) = data.as_object().and_then(|m| m.get(id))
        && truthy(flat)
    {
        return Some(flat);
    }

    if prefix.is_empty() {
        resolve(data, path)
    } else {
        resolve(data, &format!("{prefix}.{path}"))
    }
}

/// JSON truthiness: `null`, `false`, zero, the empty string, and empty
/// collections are falsy; everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a resolved value: strings verbatim, scalars via their JSON
/// rendering, composites as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vitals() -> Value {
        json!({"vitals": {"readings": [{"hr": 72}]}})
    }

    #[test]
    fn nested_path_with_list_index() {
        let data = vitals();
        assert_eq!(
            resolve(&data, "vitals.readings.0.hr"),
            Some(&json!(72))
        );
    }

    #[test]
    fn out_of_range_index_is_none() {
        let data = vitals();
        assert_eq!(resolve(&data, "vitals.readings.9.hr"), None);
    }

    #[test]
    fn missing_key_is_none() {
        let data = vitals();
        assert_eq!(resolve(&data, "vitals.bogus"), None);
    }

    #[test]
    fn empty_path_returns_root() {
        let data = vitals();
        assert_eq!(resolve(&data, ""), Some(&data));
    }

    #[test]
    fn non_numeric_segment_on_sequence_is_none() {
        let data = json!({"readings": [1, 2, 3]});
        assert_eq!(resolve(&data, "readings.first"), None);
        assert_eq!(resolve(&data, "readings.-1"), None);
        assert_eq!(resolve(&data, "readings.+1"), None);
    }

    #[test]
    fn scalar_mid_path_is_none() {
        let data = json!({"name": "Ada"});
        assert_eq!(resolve(&data, "name.first"), None);
    }

    #[test]
    fn null_value_is_none() {
        let data = json!({"notes": null});
        assert_eq!(resolve(&data, "notes"), None);
    }

    #[test]
    fn flat_id_hit_wins_over_path() {
        let data = json!({"hr": 99, "obs": {"hr": 60}});
        assert_eq!(field_value(&data, "hr", "obs.hr", ""), Some(&json!(99)));
    }

    #[test]
    fn falsy_flat_hit_falls_through_to_path() {
        let data = json!({"hr": 0, "obs": {"hr": 60}});
        assert_eq!(field_value(&data, "hr", "obs.hr", ""), Some(&json!(60)));
    }

    #[test]
    fn prefix_is_prepended_to_path() {
        let data = json!({"patient": {"name": "Ada"}});
        assert_eq!(
            field_value(&data, "name", "name", "patient"),
            Some(&json!("Ada"))
        );
    }

    #[test]
    fn truthiness_rules() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!({})));
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!([0])));
    }

    #[test]
    fn display_value_strips_string_quotes() {
        assert_eq!(display_value(&json!("Ada")), "Ada");
        assert_eq!(display_value(&json!(72)), "72");
        assert_eq!(display_value(&json!(true)), "true");
    }
}
