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

//! Document transformations shared by signing, derivation and base proof verification.
//!
//! Blank nodes are pinned to stable `bN` labels by giving every anonymous object an explicit
//! `urn:bnid:bN` id (skolemization). Selections of the skolemized document can then be
//! canonicalized on their own while keeping the labels the signer used.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::{
    canonical::{Canonicalizer, LabelMap},
    errors::Result,
    pointer::select_json,
};

const BNID_PREFIX: &str = "urn:bnid:";
const BLANK_PREFIX: &str = "_:";

/// A document with pinned blank node ids and its full statement list.
#[derive(Debug, Clone)]
pub(crate) struct Skolemized {
    /// Every object carries an id, anonymous ones as `urn:bnid:bN`.
    pub document: Value,
    /// Canonical statements of the whole document with `bN` labels, sorted.
    pub statements: Vec<String>,
}

pub(crate) fn skolemize<C: Canonicalizer>(canonicalizer: &C, document: &Value) -> Result<Skolemized> {
    let mut labelled = document.clone();
    let mut counter = 0usize;
    label_anonymous(&mut labelled, &mut counter);

    let dataset = canonicalizer.canonicalize(&labelled)?;
    let to_b: LabelMap = dataset
        .issued
        .values()
        .map(|c14n| (c14n.clone(), c14n.replacen("c14n", "b", 1)))
        .collect();
    let statements = dataset.relabel(&to_b);

    let pinned: LabelMap = dataset
        .issued
        .iter()
        .map(|(input, c14n)| (input.clone(), format!("{BNID_PREFIX}{}", c14n.replacen("c14n", "b", 1))))
        .collect();
    rewrite_ids(&mut labelled, &|id| {
        id.strip_prefix(BLANK_PREFIX).and_then(|label| pinned.get(label)).cloned()
    });

    log::debug!("skolemized {} blank node(s), {} statement(s)", pinned.len(), statements.len());
    Ok(Skolemized { document: labelled, statements })
}

/// Turns `urn:bnid:bN` ids back into `_:bN` blank node ids.
pub(crate) fn deskolemize(document: &mut Value) {
    rewrite_ids(document, &|id| id.strip_prefix(BNID_PREFIX).map(|label| format!("{BLANK_PREFIX}{label}")));
}

/// Drops `_:` ids that name a single object so those blank nodes become anonymous again.
///
/// Ids carried by several objects stay, they join those objects into one node.
pub(crate) fn strip_blank_ids(document: &mut Value) {
    let mut occurrences = HashMap::new();
    count_blank_ids(document, &mut occurrences);
    remove_blank_ids(document, &|id| occurrences.get(id).copied().unwrap_or(0) < 2);
}

fn count_blank_ids(value: &Value, occurrences: &mut HashMap<String, usize>) {
    match value {
        Value::Object(map) => {
            if let Some(id) = map.get("id").and_then(Value::as_str).filter(|id| id.starts_with(BLANK_PREFIX)) {
                *occurrences.entry(id.to_owned()).or_default() += 1;
            }
            map.iter()
                .filter(|(key, _)| *key != "id" && !key.starts_with('@'))
                .for_each(|(_, child)| count_blank_ids(child, occurrences));
        }
        Value::Array(items) => items.iter().for_each(|item| count_blank_ids(item, occurrences)),
        _ => {}
    }
}

fn remove_blank_ids(value: &mut Value, removable: &dyn Fn(&str) -> bool) {
    match value {
        Value::Object(map) => {
            if map
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| id.starts_with(BLANK_PREFIX) && removable(id))
            {
                map.remove("id");
            }
            map.iter_mut()
                .filter(|(key, _)| !key.starts_with('@'))
                .for_each(|(_, child)| remove_blank_ids(child, removable));
        }
        Value::Array(items) => items.iter_mut().for_each(|item| remove_blank_ids(item, removable)),
        _ => {}
    }
}

/// Canonical statements with blank nodes named by their input labels.
///
/// Returns the sorted statements and the `c14nN -> input label` map that produced them.
pub(crate) fn canonicalize_with_input_labels<C: Canonicalizer>(
    canonicalizer: &C,
    document: &Value,
) -> Result<(Vec<String>, LabelMap)> {
    let dataset = canonicalizer.canonicalize(document)?;
    let label_map: LabelMap = dataset.issued.iter().map(|(input, c14n)| (c14n.clone(), input.clone())).collect();
    Ok((dataset.relabel(&label_map), label_map))
}

/// Selects `pointers` from a skolemized document and returns the selection with `_:bN` ids.
pub(crate) fn select_blank_labelled(skolemized: &Value, pointers: &[String]) -> Result<Option<Value>> {
    Ok(select_json(skolemized, pointers)?.map(|mut selection| {
        deskolemize(&mut selection);
        selection
    }))
}

/// Statements reached by `pointers`, labelled as in [`Skolemized::statements`].
pub(crate) fn selection_statements<C: Canonicalizer>(
    canonicalizer: &C,
    skolemized: &Value,
    pointers: &[String],
) -> Result<Vec<String>> {
    match select_blank_labelled(skolemized, pointers)? {
        Some(selection) => Ok(canonicalize_with_input_labels(canonicalizer, &selection)?.0),
        None => Ok(Vec::new()),
    }
}

/// Splits `statements` into the ones listed in `mandatory` and the rest, keeping order.
pub(crate) fn split_mandatory(statements: &[String], mandatory: &[String]) -> (Vec<String>, Vec<String>) {
    let mandatory: HashSet<&String> = mandatory.iter().collect();
    statements.iter().cloned().partition(|s| mandatory.contains(s))
}

/// Stable partition by position.
pub(crate) fn split_by_index(statements: Vec<String>, mandatory_indexes: &[usize]) -> (Vec<String>, Vec<String>) {
    let indexes: HashSet<usize> = mandatory_indexes.iter().copied().collect();
    let (mandatory, non_mandatory): (Vec<_>, Vec<_>) =
        statements.into_iter().enumerate().partition(|(i, _)| indexes.contains(i));
    (
        mandatory.into_iter().map(|(_, s)| s).collect(),
        non_mandatory.into_iter().map(|(_, s)| s).collect(),
    )
}

pub(crate) fn as_messages(statements: &[String]) -> Vec<Vec<u8>> {
    statements.iter().map(|s| s.as_bytes().to_vec()).collect()
}

fn label_anonymous(value: &mut Value, counter: &mut usize) {
    match value {
        Value::Object(map) => {
            if map.get("id").map_or(true, Value::is_null) {
                map.insert("id".to_owned(), Value::String(format!("{BLANK_PREFIX}e{counter}")));
                *counter += 1;
            }
            label_children(map, counter);
        }
        Value::Array(items) => items.iter_mut().for_each(|item| label_anonymous(item, counter)),
        _ => {}
    }
}

fn label_children(map: &mut Map<String, Value>, counter: &mut usize) {
    for (key, value) in map.iter_mut() {
        if key != "id" && !key.starts_with('@') {
            label_anonymous(value, counter);
        }
    }
}

fn rewrite_ids(value: &mut Value, rewrite: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get_mut("id") {
                if let Some(new_id) = rewrite(id) {
                    *id = new_id;
                }
            }
            for (key, child) in map.iter_mut() {
                if key != "id" && !key.starts_with('@') {
                    rewrite_ids(child, rewrite);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| rewrite_ids(item, rewrite)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::JsonCanonicalizer;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "@context": [{"ex": "https://example.org/"}],
            "issuer": {"id": "http://example.org/alice"},
            "credentialSubject": {"name": "Bob", "address": {"city": "Turin"}},
            "validFrom": "2025-01-01T00:00:00Z"
        })
    }

    #[test]
    fn skolemization_pins_every_anonymous_object() {
        let skolemized = skolemize(&JsonCanonicalizer, &document()).unwrap();
        let doc = &skolemized.document;
        for id in [&doc["id"], &doc["credentialSubject"]["id"], &doc["credentialSubject"]["address"]["id"]] {
            assert!(id.as_str().unwrap().starts_with("urn:bnid:b"));
        }
        assert_eq!(doc["issuer"]["id"], "http://example.org/alice");
        assert!(doc["@context"][0].get("id").is_none());
        assert!(skolemized.statements.iter().all(|s| !s.contains("c14n")));
    }

    #[test]
    fn full_selection_reproduces_signed_statements() {
        let skolemized = skolemize(&JsonCanonicalizer, &document()).unwrap();
        let pointers = vec!["".to_owned()];
        assert_eq!(selection_statements(&JsonCanonicalizer, &skolemized.document, &pointers).unwrap(), skolemized.statements);
    }

    #[test]
    fn mandatory_statements_are_a_subset() {
        let skolemized = skolemize(&JsonCanonicalizer, &document()).unwrap();
        let pointers = vec!["/issuer".to_owned(), "/validFrom".to_owned()];
        let mandatory = selection_statements(&JsonCanonicalizer, &skolemized.document, &pointers).unwrap();
        assert_eq!(mandatory.len(), 2);
        assert!(mandatory.iter().all(|m| skolemized.statements.contains(m)));

        let (selected, rest) = split_mandatory(&skolemized.statements, &mandatory);
        assert_eq!(selected, mandatory);
        assert_eq!(rest.len(), skolemized.statements.len() - 2);
    }

    #[test]
    fn stripping_removes_only_blank_ids() {
        let mut doc = json!({"id": "_:b0", "issuer": {"id": "http://example.org/alice"}, "list": [{"id": "_:b1"}]});
        strip_blank_ids(&mut doc);
        assert_eq!(doc, json!({"issuer": {"id": "http://example.org/alice"}, "list": [{}]}));
    }

    #[test]
    fn stripping_keeps_shared_blank_ids() {
        let mut doc = json!({
            "credentialSubject": {"id": "_:b1", "name": "Bob"},
            "evidence": {"id": "_:b1", "age": 3},
            "other": {"id": "_:b2"}
        });
        let before = JsonCanonicalizer.canonicalize(&doc).unwrap().lines();
        strip_blank_ids(&mut doc);
        assert_eq!(doc["credentialSubject"]["id"], "_:b1");
        assert_eq!(doc["evidence"]["id"], "_:b1");
        assert!(doc["other"].get("id").is_none());
        assert_eq!(JsonCanonicalizer.canonicalize(&doc).unwrap().lines(), before);
    }

    #[test]
    fn index_partition_is_stable() {
        let statements: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let (mandatory, rest) = split_by_index(statements, &[3, 1]);
        assert_eq!(mandatory, vec!["b", "d"]);
        assert_eq!(rest, vec!["a", "c"]);
    }
}
