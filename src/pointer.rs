// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Selection of a JSON document fragment through [RFC 6901](https://www.rfc-editor.org/rfc/rfc6901) pointers.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// Splits a pointer into its unescaped reference tokens. `""` addresses the whole document.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| Error::InvalidPointer(format!("'{pointer}' must start with '/'")))?;
    rest.split('/')
        .map(|token| {
            if token.contains('~') {
                let mut out = String::with_capacity(token.len());
                let mut chars = token.chars();
                while let Some(c) = chars.next() {
                    if c != '~' {
                        out.push(c);
                        continue;
                    }
                    match chars.next() {
                        Some('0') => out.push('~'),
                        Some('1') => out.push('/'),
                        _ => return Err(Error::InvalidPointer(format!("invalid escape in '{pointer}'"))),
                    }
                }
                Ok(out)
            } else {
                Ok(token.to_owned())
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Selected {
    Leaf(Value),
    Object(BTreeMap<String, Selected>),
    Array(BTreeMap<usize, Selected>),
}

impl Selected {
    fn into_value(self) -> Value {
        match self {
            Selected::Leaf(value) => value,
            Selected::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, v.into_value())).collect()),
            Selected::Array(items) => Value::Array(items.into_values().map(Selected::into_value).collect()),
        }
    }
}

/// Builds the part of `document` reached by `pointers`.
///
/// Every object crossed on the way keeps its `id` and `type`, the root keeps `@context`.
/// Returns `None` when `pointers` is empty.
pub fn select_json(document: &Value, pointers: &[String]) -> Result<Option<Value>> {
    if pointers.is_empty() {
        return Ok(None);
    }
    let root_map = document
        .as_object()
        .ok_or_else(|| Error::InvalidPointer("selection requires a JSON object document".to_owned()))?;

    let mut root = object_skeleton(root_map, true);
    for pointer in pointers {
        let tokens = parse_pointer(pointer)?;
        if tokens.is_empty() {
            root = Selected::Leaf(document.clone());
            continue;
        }
        select_path(&mut root, document, &tokens, pointer)?;
    }
    Ok(Some(root.into_value()))
}

fn object_skeleton(map: &Map<String, Value>, is_root: bool) -> Selected {
    let mut selected = BTreeMap::new();
    for key in ["id", "type"] {
        if let Some(value) = map.get(key) {
            selected.insert(key.to_owned(), Selected::Leaf(value.clone()));
        }
    }
    if is_root {
        if let Some(context) = map.get("@context") {
            selected.insert("@context".to_owned(), Selected::Leaf(context.clone()));
        }
    }
    Selected::Object(selected)
}

fn skeleton_for(value: &Value) -> Selected {
    match value {
        Value::Object(map) => object_skeleton(map, false),
        Value::Array(_) => Selected::Array(BTreeMap::new()),
        other => Selected::Leaf(other.clone()),
    }
}

fn select_path(root: &mut Selected, document: &Value, tokens: &[String], pointer: &str) -> Result<()> {
    let missing = || Error::InvalidPointer(format!("'{pointer}' does not match the document"));

    let mut cursor: &mut Selected = root;
    let mut value: &Value = document;

    for (depth, token) in tokens.iter().enumerate() {
        let last = depth + 1 == tokens.len();
        if let Selected::Leaf(_) = cursor {
            // an ancestor is already fully selected
            return Ok(());
        }

        match (value, cursor) {
            (Value::Object(map), Selected::Object(children)) => {
                let child_value = map.get(token).ok_or_else(missing)?;
                let entry = children.entry(token.clone());
                cursor = if last {
                    let slot = entry.or_insert_with(|| Selected::Leaf(Value::Null));
                    *slot = Selected::Leaf(child_value.clone());
                    slot
                } else {
                    entry.or_insert_with(|| skeleton_for(child_value))
                };
                value = child_value;
            }
            (Value::Array(items), Selected::Array(children)) => {
                let index: usize = token.parse().map_err(|_| missing())?;
                let child_value = items.get(index).ok_or_else(missing)?;
                let entry = children.entry(index);
                cursor = if last {
                    let slot = entry.or_insert_with(|| Selected::Leaf(Value::Null));
                    *slot = Selected::Leaf(child_value.clone());
                    slot
                } else {
                    entry.or_insert_with(|| skeleton_for(child_value))
                };
                value = child_value;
            }
            _ => return Err(missing()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiableCredential"],
            "issuer": {"id": "http://example.org/alice"},
            "credentialSubject": {
                "id": "_:s",
                "type": "Person",
                "name": "Bob",
                "age": 30,
                "cars": [{"make": "A", "year": 1}, {"make": "B", "year": 2}]
            }
        })
    }

    #[test]
    fn parse_handles_escapes() {
        assert_eq!(parse_pointer("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert!(parse_pointer("").unwrap().is_empty());
        assert!(matches!(parse_pointer("a"), Err(Error::InvalidPointer(_))));
        assert!(parse_pointer("/a~2").is_err());
    }

    #[test]
    fn selection_keeps_ids_types_and_context() {
        let selected = select_json(&sample(), &["/credentialSubject/name".to_owned()]).unwrap().unwrap();
        assert_eq!(
            selected,
            json!({
                "@context": ["https://www.w3.org/ns/credentials/v2"],
                "type": ["VerifiableCredential"],
                "credentialSubject": {"id": "_:s", "type": "Person", "name": "Bob"}
            })
        );
    }

    #[test]
    fn array_selection_compacts_in_index_order() {
        let pointers = vec!["/credentialSubject/cars/1/make".to_owned(), "/credentialSubject/cars/0/year".to_owned()];
        let selected = select_json(&sample(), &pointers).unwrap().unwrap();
        assert_eq!(selected["credentialSubject"]["cars"], json!([{"year": 1}, {"make": "B"}]));
    }

    #[test]
    fn whole_value_wins_over_partial() {
        let pointers = vec!["/credentialSubject/cars/0/make".to_owned(), "/credentialSubject/cars".to_owned()];
        let selected = select_json(&sample(), &pointers).unwrap().unwrap();
        assert_eq!(selected["credentialSubject"]["cars"], sample()["credentialSubject"]["cars"]);

        let reversed: Vec<String> = pointers.into_iter().rev().collect();
        let selected = select_json(&sample(), &reversed).unwrap().unwrap();
        assert_eq!(selected["credentialSubject"]["cars"], sample()["credentialSubject"]["cars"]);
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(matches!(
            select_json(&sample(), &["/credentialSubject/height".to_owned()]),
            Err(Error::InvalidPointer(_))
        ));
        assert!(select_json(&sample(), &[]).unwrap().is_none());
    }
}
