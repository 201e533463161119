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

//! Deterministic normalization of a JSON claim graph into an ordered list of statements.
//!
//! Every JSON object is a node. An object whose `id` is an absolute identifier is a named
//! node, any other object is a blank node (`_:` ids name blank nodes explicitly). Keys become
//! predicates under [`VOCAB`], `type` becomes `rdf:type`, `@`-prefixed keys are skipped,
//! `null` values are dropped and arrays are unordered sets.
//!
//! Blank node labels (`c14n0`, `c14n1`, ...) depend only on the shape of the graph: each blank
//! node is hashed from its own statements, then refined with the hashes of its neighbours until
//! the partition is stable. Nodes that remain indistinguishable are ordered by traversal order.

use std::{collections::BTreeMap, fmt};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::errors::{Error, Result};

pub const VOCAB: &str = "https://www.w3.org/ns/credentials/issuer-dependent#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Blank node rename table, `from -> to`, labels without the `_:` prefix.
pub type LabelMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal { value: String, datatype: Option<String> },
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal { value, datatype: None } => write!(f, "\"{}\"", escape_literal(value)),
            Term::Literal { value, datatype: Some(datatype) } => {
                write!(f, "\"{}\"^^<{}>", escape_literal(value), escape_iri(datatype))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Statement {
    fn relabel(&self, label_map: &LabelMap) -> Statement {
        let rename = |term: &Term| match term {
            Term::Blank(label) => Term::Blank(label_map.get(label).cloned().unwrap_or_else(|| label.clone())),
            other => other.clone(),
        };
        Statement { subject: rename(&self.subject), predicate: self.predicate.clone(), object: rename(&self.object) }
    }
}

/// N-Quads line, newline terminated.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} <{}> {} .", self.subject, escape_iri(&self.predicate), self.object)
    }
}

/// Output of a canonicalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalDataset {
    /// Sorted by serialized form, without duplicates.
    pub statements: Vec<Statement>,
    /// Input blank node label -> canonical label.
    pub issued: LabelMap,
}

impl CanonicalDataset {
    pub fn lines(&self) -> Vec<String> {
        self.statements.iter().map(ToString::to_string).collect()
    }

    /// Renames blank nodes through `label_map` and returns the re-sorted lines.
    pub fn relabel(&self, label_map: &LabelMap) -> Vec<String> {
        let mut lines: Vec<String> = self.statements.iter().map(|s| s.relabel(label_map).to_string()).collect();
        lines.sort();
        lines.dedup();
        lines
    }
}

/// Canonicalization collaborator.
pub trait Canonicalizer: Send + Sync {
    fn canonicalize(&self, document: &Value) -> Result<CanonicalDataset>;

    /// Canonical lines with blank nodes renamed by `label_map`, sorted.
    fn canonicalize_with_labels(&self, document: &Value, label_map: &LabelMap) -> Result<Vec<String>> {
        Ok(self.canonicalize(document)?.relabel(label_map))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCanonicalizer;

impl Canonicalizer for JsonCanonicalizer {
    fn canonicalize(&self, document: &Value) -> Result<CanonicalDataset> {
        let mut graph = Graph::default();
        match document {
            Value::Object(map) => {
                graph.visit_object(map)?;
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(map) => {
                            graph.visit_object(map)?;
                        }
                        _ => return Err(Error::Canonicalization("top-level array items must be objects".to_owned())),
                    }
                }
            }
            _ => return Err(Error::Canonicalization("document must be a JSON object".to_owned())),
        }
        Ok(graph.finish())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRef {
    Named(usize),
    Blank(usize),
}

#[derive(Debug, Clone)]
enum Object {
    Node(NodeRef),
    Literal(Term),
}

#[derive(Debug, Default)]
struct Graph {
    names: Vec<String>,
    /// Input label of every blank node, in traversal order.
    blanks: Vec<Option<String>>,
    triples: Vec<(NodeRef, String, Object)>,
}

impl Graph {
    fn named(&mut self, iri: &str) -> NodeRef {
        match self.names.iter().position(|n| n == iri) {
            Some(i) => NodeRef::Named(i),
            None => {
                self.names.push(iri.to_owned());
                NodeRef::Named(self.names.len() - 1)
            }
        }
    }

    fn blank(&mut self, label: Option<&str>) -> NodeRef {
        if let Some(label) = label {
            if let Some(i) = self.blanks.iter().position(|b| b.as_deref() == Some(label)) {
                return NodeRef::Blank(i);
            }
        }
        self.blanks.push(label.map(str::to_owned));
        NodeRef::Blank(self.blanks.len() - 1)
    }

    fn visit_object(&mut self, map: &Map<String, Value>) -> Result<NodeRef> {
        let subject = match map.get("id") {
            None | Some(Value::Null) => self.blank(None),
            Some(Value::String(id)) => match id.strip_prefix("_:") {
                Some(label) => self.blank(Some(label)),
                None => self.named(id),
            },
            Some(other) => return Err(Error::Canonicalization(format!("node id must be a string, got {other}"))),
        };

        for (key, value) in map {
            if key == "id" || key.starts_with('@') {
                continue;
            }
            let is_type = key == "type";
            let predicate = if is_type { RDF_TYPE.to_owned() } else { expand(key) };
            self.visit_value(subject, &predicate, is_type, value)?;
        }
        Ok(subject)
    }

    fn visit_value(&mut self, subject: NodeRef, predicate: &str, is_type: bool, value: &Value) -> Result<()> {
        let object = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => {
                for item in items {
                    self.visit_value(subject, predicate, is_type, item)?;
                }
                return Ok(());
            }
            Value::Object(map) => Object::Node(self.visit_object(map)?),
            Value::String(s) if is_type => Object::Literal(Term::Iri(expand(s))),
            Value::String(s) => Object::Literal(Term::Literal { value: s.clone(), datatype: None }),
            Value::Bool(b) => Object::Literal(Term::Literal { value: b.to_string(), datatype: Some(XSD_BOOLEAN.to_owned()) }),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Object::Literal(Term::Literal { value: n.to_string(), datatype: Some(XSD_INTEGER.to_owned()) })
                } else {
                    let f = n
                        .as_f64()
                        .ok_or_else(|| Error::Canonicalization(format!("unrepresentable number {n}")))?;
                    Object::Literal(Term::Literal { value: format!("{f:E}"), datatype: Some(XSD_DOUBLE.to_owned()) })
                }
            }
        };
        self.triples.push((subject, predicate.to_owned(), object));
        Ok(())
    }

    fn term(&self, node: NodeRef, blank_label: &dyn Fn(usize) -> String) -> Term {
        match node {
            NodeRef::Named(i) => Term::Iri(self.names[i].clone()),
            NodeRef::Blank(i) => Term::Blank(blank_label(i)),
        }
    }

    fn statement(&self, triple: &(NodeRef, String, Object), blank_label: &dyn Fn(usize) -> String) -> Statement {
        let (subject, predicate, object) = triple;
        Statement {
            subject: self.term(*subject, blank_label),
            predicate: predicate.clone(),
            object: match object {
                Object::Node(node) => self.term(*node, blank_label),
                Object::Literal(term) => term.clone(),
            },
        }
    }

    fn first_degree_hash(&self, blank: usize) -> String {
        let label = |i: usize| if i == blank { "a".to_owned() } else { "z".to_owned() };
        let mut lines: Vec<String> = self
            .triples
            .iter()
            .filter(|(s, _, o)| *s == NodeRef::Blank(blank) || matches!(o, Object::Node(n) if *n == NodeRef::Blank(blank)))
            .map(|t| self.statement(t, &label).to_string())
            .collect();
        lines.sort();
        hex::encode(Sha256::digest(lines.concat().as_bytes()))
    }

    fn refine(&self, hashes: &[String]) -> Vec<String> {
        (0..self.blanks.len())
            .map(|blank| {
                let me = NodeRef::Blank(blank);
                let mut related: Vec<String> = Vec::new();
                for (s, p, o) in &self.triples {
                    if let Object::Node(NodeRef::Blank(other)) = o {
                        if *s == me {
                            related.push(format!("s<{p}>{}", hashes[*other]));
                        }
                    }
                    if let (NodeRef::Blank(other), Object::Node(n)) = (s, o) {
                        if *n == me {
                            related.push(format!("o<{p}>{}", hashes[*other]));
                        }
                    }
                }
                related.sort();
                let mut hasher = Sha256::new();
                hasher.update(hashes[blank].as_bytes());
                related.iter().for_each(|r| hasher.update(r.as_bytes()));
                hex::encode(hasher.finalize())
            })
            .collect()
    }

    fn finish(self) -> CanonicalDataset {
        let count = self.blanks.len();
        let mut hashes: Vec<String> = (0..count).map(|b| self.first_degree_hash(b)).collect();
        let distinct = |h: &[String]| h.iter().collect::<std::collections::BTreeSet<_>>().len();

        let mut classes = distinct(&hashes);
        for _ in 0..count {
            let refined = self.refine(&hashes);
            let refined_classes = distinct(&refined);
            hashes = refined;
            if refined_classes == classes {
                break;
            }
            classes = refined_classes;
        }

        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|a, b| hashes[*a].cmp(&hashes[*b]).then(a.cmp(b)));
        let mut canonical = vec![String::new(); count];
        for (n, blank) in order.into_iter().enumerate() {
            canonical[blank] = format!("c14n{n}");
        }

        let issued: LabelMap = self
            .blanks
            .iter()
            .enumerate()
            .filter_map(|(i, label)| label.as_ref().map(|l| (l.clone(), canonical[i].clone())))
            .collect();

        let label = |i: usize| canonical[i].clone();
        let mut keyed: Vec<(String, Statement)> = self
            .triples
            .iter()
            .map(|t| {
                let statement = self.statement(t, &label);
                (statement.to_string(), statement)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.0 == b.0);

        log::trace!("canonicalized {} statements, {} blank nodes", keyed.len(), count);
        CanonicalDataset { statements: keyed.into_iter().map(|(_, s)| s).collect(), issued }
    }
}

fn expand(term: &str) -> String {
    if term.contains(':') {
        term.to_owned()
    } else {
        format!("{VOCAB}{term}")
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => out.push_str(&format!("\\u{:04X}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
