use serde_json::{Map, Value};

const KEY_PATH_ALIASES: &[(&str, &str)] = &[("privateKey", "privateKeyPath")];
const SYNC_ALIASES: &[(&str, &str)] = &[("credential", "credentialName")];

fn key_aliases(tool: &str) -> &'static [(&'static str, &'static str)] {
    match tool {
        "ssh_exec" | "add_credential" => KEY_PATH_ALIASES,
        "rsync_copy" => SYNC_ALIASES,
        _ => &[],
    }
}

fn rename_key(map: &mut Map<String, Value>, from_key: &str, to_key: &str) -> Option<Value> {
    let value = map.remove(from_key)?;
    if map.contains_key(to_key) {
        return Some(serde_json::json!({
            "from": from_key,
            "to": to_key,
            "reason": "canonical_already_set",
        }));
    }
    map.insert(to_key.to_string(), value);
    Some(serde_json::json!({ "from": from_key, "to": to_key }))
}

/// Rewrites legacy argument keys to their canonical names.
///
/// Returns the rewritten arguments and, when anything changed, a note
/// describing each rename. A canonical key that is already present wins and
/// the alias is dropped.
pub fn normalize_args_aliases(tool: &str, args: &Value) -> (Value, Option<Value>) {
    let Some(obj) = args.as_object() else {
        return (args.clone(), None);
    };
    let mut map = obj.clone();
    let notes: Vec<Value> = key_aliases(tool)
        .iter()
        .filter_map(|(from, to)| rename_key(&mut map, from, to))
        .collect();
    let note = if notes.is_empty() {
        None
    } else {
        Some(Value::Array(notes))
    };
    (Value::Object(map), note)
}

#[cfg(test)]
mod tests {
    use super::normalize_args_aliases;
    use serde_json::json;

    #[test]
    fn legacy_private_key_is_renamed() {
        let (args, note) = normalize_args_aliases(
            "ssh_exec",
            &json!({"host": "h", "privateKey": "/k"}),
        );
        assert_eq!(args, json!({"host": "h", "privateKeyPath": "/k"}));
        assert!(note.is_some());
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let (args, _) = normalize_args_aliases(
            "add_credential",
            &json!({"privateKey": "/old", "privateKeyPath": "/new"}),
        );
        assert_eq!(args, json!({"privateKeyPath": "/new"}));
    }

    #[test]
    fn other_tools_are_untouched() {
        let input = json!({"privateKey": "/k"});
        let (args, note) = normalize_args_aliases("list_credentials", &input);
        assert_eq!(args, input);
        assert!(note.is_none());
    }
}
