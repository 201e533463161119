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

//! `proofValue` codec of the `bbs-2023` cryptosuite.
//!
//! A proof value is `u` + base64url-no-pad(tag || CBOR array), where the 3-byte tag tells a
//! base proof (`d9 5d 02`) from a derived proof (`d9 5d 03`).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ciborium::value::{Integer, Value};

use crate::{
    canonical::LabelMap,
    errors::{Error, Result},
};

pub const BASE_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x02];
pub const DERIVED_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x03];
const MULTIBASE_BASE64URL: char = 'u';
/// Legacy tag some encoders put around byte strings.
const TYPED_ARRAY_TAG: u64 = 64;

/// Signer output, carried by a signed (not yet derived) credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseProofEnvelope {
    pub bbs_signature: Vec<u8>,
    /// `proofHash || mandatoryHash`
    pub bbs_header: Vec<u8>,
    pub public_key: Vec<u8>,
    pub mandatory_pointers: Vec<String>,
}

/// Holder output, carried by a derived credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedProofEnvelope {
    pub bbs_proof: Vec<u8>,
    /// `c14nN -> bM`
    pub label_map: LabelMap,
    pub mandatory_indexes: Vec<usize>,
    pub selective_indexes: Vec<usize>,
    pub presentation_header: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofValueKind {
    Base,
    Derived,
}

/// Tells a base proof value from a derived one by its tag.
pub fn proof_value_kind(proof_value: Option<&str>) -> Result<ProofValueKind> {
    let decoded = decode_multibase(proof_value)?;
    match decoded.get(..3) {
        Some(tag) if tag == BASE_PROOF_HEADER => Ok(ProofValueKind::Base),
        Some(tag) if tag == DERIVED_PROOF_HEADER => Ok(ProofValueKind::Derived),
        _ => Err(Error::malformed("proof value does not start with a bbs-2023 header")),
    }
}

pub fn serialize_base_proof_value(envelope: &BaseProofEnvelope) -> Result<String> {
    let components = Value::Array(vec![
        Value::Bytes(envelope.bbs_signature.clone()),
        Value::Bytes(envelope.bbs_header.clone()),
        Value::Bytes(envelope.public_key.clone()),
        Value::Array(envelope.mandatory_pointers.iter().cloned().map(Value::Text).collect()),
    ]);
    encode(&BASE_PROOF_HEADER, &components)
}

pub fn parse_base_proof_value(proof_value: Option<&str>) -> Result<BaseProofEnvelope> {
    let components = decode(proof_value, &BASE_PROOF_HEADER, 4)?;
    let mut components = components.into_iter();
    let mut next = || components.next().ok_or_else(|| Error::malformed("missing base proof component"));

    let bbs_signature = as_bytes(next()?, "bbsSignature")?;
    let bbs_header = as_bytes(next()?, "bbsHeader")?;
    let public_key = as_bytes(next()?, "publicKey")?;
    let mandatory_pointers = match next()? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Text(pointer) => Ok(pointer),
                _ => Err(Error::malformed("mandatoryPointers must be text strings")),
            })
            .collect::<Result<Vec<String>>>()?,
        _ => return Err(Error::malformed("mandatoryPointers must be an array")),
    };

    Ok(BaseProofEnvelope { bbs_signature, bbs_header, public_key, mandatory_pointers })
}

pub fn serialize_disclosure_proof_value(envelope: &DerivedProofEnvelope) -> Result<String> {
    let mut compressed = envelope
        .label_map
        .iter()
        .map(|(k, v)| Ok((label_index(k, "c14n")?, label_index(v, "b")?)))
        .collect::<Result<Vec<(u64, u64)>>>()?;
    compressed.sort_unstable();

    let components = Value::Array(vec![
        Value::Bytes(envelope.bbs_proof.clone()),
        Value::Map(
            compressed
                .into_iter()
                .map(|(k, v)| (Value::Integer(k.into()), Value::Integer(v.into())))
                .collect(),
        ),
        index_array(&envelope.mandatory_indexes),
        index_array(&envelope.selective_indexes),
        Value::Bytes(envelope.presentation_header.clone()),
    ]);
    encode(&DERIVED_PROOF_HEADER, &components)
}

pub fn parse_disclosure_proof_value(proof_value: Option<&str>) -> Result<DerivedProofEnvelope> {
    let components = decode(proof_value, &DERIVED_PROOF_HEADER, 5)?;
    let mut components = components.into_iter();
    let mut next = || components.next().ok_or_else(|| Error::malformed("missing derived proof component"));

    let bbs_proof = as_bytes(next()?, "bbsProof")?;
    let label_map = decompress_label_map(next()?)?;
    let mandatory_indexes = as_indexes(next()?, "mandatoryIndexes")?;
    let selective_indexes = as_indexes(next()?, "selectiveIndexes")?;
    let presentation_header = as_bytes(next()?, "presentationHeader")?;

    log::debug!(
        "parsed derived proof: {} label(s), {} mandatory, {} selective",
        label_map.len(),
        mandatory_indexes.len(),
        selective_indexes.len()
    );
    Ok(DerivedProofEnvelope { bbs_proof, label_map, mandatory_indexes, selective_indexes, presentation_header })
}

fn encode(header: &[u8; 3], components: &Value) -> Result<String> {
    let mut bytes = header.to_vec();
    ciborium::ser::into_writer(components, &mut bytes)
        .map_err(|e| Error::malformed_with("unable to encode proof value", e))?;
    Ok(format!("{MULTIBASE_BASE64URL}{}", URL_SAFE_NO_PAD.encode(bytes)))
}

fn decode_multibase(proof_value: Option<&str>) -> Result<Vec<u8>> {
    let proof_value = proof_value.ok_or_else(|| Error::malformed("proofValue is missing"))?;
    let encoded = proof_value
        .strip_prefix(MULTIBASE_BASE64URL)
        .ok_or_else(|| Error::malformed("only base64url multibase encoding is supported"))?;
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| Error::malformed_with("proofValue is not valid base64url", e))
}

/// Checks the tag and decodes exactly one CBOR array of `len` items from the rest.
fn decode(proof_value: Option<&str>, header: &[u8; 3], len: usize) -> Result<Vec<Value>> {
    let decoded = decode_multibase(proof_value)?;
    let mut payload = decoded
        .strip_prefix(&header[..])
        .ok_or_else(|| Error::malformed(format!("proof value must start with {}", hex::encode(header))))?;

    let value: Value = ciborium::de::from_reader(&mut payload)
        .map_err(|e| Error::malformed_with("proof value payload is not valid CBOR", e))?;
    if !payload.is_empty() {
        return Err(Error::malformed(format!("{} trailing byte(s) after proof value payload", payload.len())));
    }

    match value {
        Value::Array(items) if items.len() == len => Ok(items),
        Value::Array(items) => Err(Error::malformed(format!("expected {len} proof components, got {}", items.len()))),
        _ => Err(Error::malformed("proof value payload must be a CBOR array")),
    }
}

fn as_bytes(value: Value, name: &str) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(bytes) => Ok(bytes),
        Value::Tag(TYPED_ARRAY_TAG, inner) => match *inner {
            Value::Bytes(bytes) => Ok(bytes),
            _ => Err(Error::malformed(format!("{name} must be a byte string"))),
        },
        _ => Err(Error::malformed(format!("{name} must be a byte string"))),
    }
}

fn as_index(value: Value, name: &str) -> Result<usize> {
    match value {
        Value::Integer(i) => usize::try_from(i128::from(i))
            .map_err(|e| Error::malformed_with(format!("{name} must hold non-negative integers"), e)),
        _ => Err(Error::malformed(format!("{name} must hold integers"))),
    }
}

fn as_indexes(value: Value, name: &str) -> Result<Vec<usize>> {
    match value {
        Value::Array(items) => items.into_iter().map(|item| as_index(item, name)).collect(),
        _ => Err(Error::malformed(format!("{name} must be an array"))),
    }
}

fn index_array(indexes: &[usize]) -> Value {
    Value::Array(indexes.iter().map(|&i| Value::Integer(Integer::from(i as u64))).collect())
}

fn label_index(label: &str, prefix: &str) -> Result<u64> {
    label
        .strip_prefix(prefix)
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| Error::malformed(format!("label '{label}' is not of the form {prefix}<n>")))
}

fn decompress_label_map(value: Value) -> Result<LabelMap> {
    let entries = match value {
        Value::Map(entries) => entries,
        _ => return Err(Error::malformed("labelMap must be a map")),
    };
    let mut label_map = LabelMap::new();
    for (k, v) in entries {
        let key = format!("c14n{}", as_index(k, "labelMap")?);
        let value = format!("b{}", as_index(v, "labelMap")?);
        if label_map.values().any(|existing| *existing == value) {
            return Err(Error::malformed(format!("labelMap maps two labels to {value}")));
        }
        if label_map.insert(key.clone(), value).is_some() {
            return Err(Error::malformed(format!("labelMap lists {key} twice")));
        }
    }
    Ok(label_map)
}
