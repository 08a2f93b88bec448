//! Bracket-nested query string codec.
//!
//! Query strings and form-encoded bodies are decoded into a JSON object so the
//! sanitizers can walk them uniformly:
//!
//! - `a=1` → `{"a": "1"}`
//! - `a=1&a=2` → `{"a": ["1", "2"]}`
//! - `a[]=1` → `{"a": ["1"]}`
//! - `price[gte]=500` → `{"price": {"gte": "500"}}`
//!
//! [`encode`] flattens such an object back into `application/x-www-form-urlencoded`.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Maximum bracket nesting; deeper segments stay part of the last key.
pub const MAX_DEPTH: usize = 5;

/// Maximum number of pairs decoded from one input; the rest is ignored.
pub const MAX_PARAMETERS: usize = 1000;

/// Decodes a query string (without the leading `?`) or a form body.
pub fn parse(input: &[u8]) -> Map<String, Value> {
    let mut root = Map::new();

    for (key, value) in form_urlencoded::parse(input).take(MAX_PARAMETERS) {
        if key.is_empty() {
            continue;
        }
        let segments = split_key(&key);
        insert(&mut root, &segments, Value::String(value.into_owned()));
    }

    root
}

/// Encodes an object back into form-urlencoded form.
///
/// Arrays become repeated keys and nested objects become bracketed keys, so
/// `parse(encode(x))` reproduces `x` for anything `parse` can produce.
pub fn encode(query: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            serializer.append_pair(key, "");
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) => {
            serializer.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            for item in items {
                append(serializer, key, item);
            }
        }
        Value::Object(fields) => {
            for (field, nested) in fields {
                append(serializer, &format!("{key}[{field}]"), nested);
            }
        }
    }
}

/// Splits `a[b][]` into `["a", "b", ""]`, honouring [`MAX_DEPTH`].
fn split_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];

    while segments.len() <= MAX_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    if !rest.is_empty() {
        // Unparseable or too deep: keep the remainder as a literal key segment.
        segments.push(rest.to_string());
    }

    segments
}

fn insert(target: &mut Map<String, Value>, segments: &[String], value: Value) {
    let (head, tail) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    if tail.is_empty() {
        merge_leaf(target, head, value);
        return;
    }

    if tail[0].is_empty() || tail[0].chars().all(|c| c.is_ascii_digit()) {
        // `a[]=x` / `a[0]=x`: append to a list under `head`.
        let element = if tail.len() == 1 {
            value
        } else {
            let mut nested = Map::new();
            insert(&mut nested, &tail[1..], value);
            Value::Object(nested)
        };
        merge_leaf(target, head, Value::Array(vec![element]));
        return;
    }

    match target.get_mut(head.as_str()) {
        Some(Value::Object(nested)) => insert(nested, tail, value),
        Some(_) => {
            let mut nested = Map::new();
            insert(&mut nested, tail, value);
            merge_leaf(target, head, Value::Object(nested));
        }
        None => {
            let mut nested = Map::new();
            insert(&mut nested, tail, value);
            target.insert(head.clone(), Value::Object(nested));
        }
    }
}

/// Stores `value` under `key`, turning repeated keys into a list.
fn merge_leaf(target: &mut Map<String, Value>, key: &str, value: Value) {
    match target.get_mut(key) {
        None => {
            target.insert(key.to_string(), value);
        }
        Some(Value::Array(existing)) => match value {
            Value::Array(items) => existing.extend(items),
            other => existing.push(other),
        },
        Some(existing) => {
            let previous = existing.take();
            let mut items = vec![previous];
            match value {
                Value::Array(more) => items.extend(more),
                other => items.push(other),
            }
            *existing = Value::Array(items);
        }
    }
}
