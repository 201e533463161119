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

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::{Error, Result};

pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// Data integrity proof attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: String,
    pub cryptosuite: String,
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

impl Proof {
    pub fn new(cryptosuite: &str, verification_method: &str, created: String) -> Self {
        Self {
            type_: DATA_INTEGRITY_PROOF.to_owned(),
            cryptosuite: cryptosuite.to_owned(),
            verification_method: verification_method.to_owned(),
            proof_purpose: ASSERTION_METHOD.to_owned(),
            created: Some(created),
            proof_value: None,
        }
    }

    /// The proof options hashed by the suites: every field but `proofValue`, plus the
    /// document `@context` when it has one.
    pub fn configuration(&self, document: &Value) -> Result<Value> {
        let mut config = serde_json::to_value(Proof { proof_value: None, ..self.clone() })?;
        if let (Some(context), Value::Object(map)) = (document.get("@context"), &mut config) {
            map.insert("@context".to_owned(), context.clone());
        }
        Ok(config)
    }
}

/// An arbitrary claim graph plus at most one proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl Credential {
    /// Wraps a JSON object of claims. A `proof` member is parsed as the credential proof.
    pub fn new(claims: Value) -> Result<Self> {
        match claims {
            Value::Object(_) => Ok(serde_json::from_value(claims)?),
            other => Err(Error::InvalidState(format!("credential claims must be a JSON object, got {other}"))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The claims without the proof.
    pub fn document(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    pub fn issuer_id(&self) -> Option<&str> {
        match self.claims.get("issuer")? {
            Value::String(id) => Some(id),
            Value::Object(issuer) => issuer.get("id")?.as_str(),
            _ => None,
        }
    }

    pub fn set_issuer(&mut self, id: &str) {
        self.claims.insert("issuer".to_owned(), json!({ "id": id }));
    }

    pub fn set_id(&mut self, id: &str) {
        self.claims.insert("id".to_owned(), Value::String(id.to_owned()));
    }

    /// Sets `credentialSubject.id`, creating the subject object when missing.
    pub fn set_subject_id(&mut self, id: &str) -> Result<()> {
        let subject = self
            .claims
            .entry("credentialSubject".to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        match subject {
            Value::Object(map) => {
                map.insert("id".to_owned(), Value::String(id.to_owned()));
                Ok(())
            }
            _ => Err(Error::InvalidState("credentialSubject must be a single object to carry an id".to_owned())),
        }
    }

    pub fn has_claim(&self, key: &str) -> bool {
        self.claims.get(key).is_some_and(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_is_split_from_claims() {
        let credential = Credential::new(json!({
            "claim": "x",
            "proof": {
                "type": "DataIntegrityProof",
                "cryptosuite": "bbs-2023",
                "verificationMethod": "http://example.org/alice#key-1",
                "proofPurpose": "assertionMethod",
                "proofValue": "u2V0D"
            }
        }))
        .unwrap();
        let proof = credential.proof.as_ref().unwrap();
        assert_eq!(proof.proof_value.as_deref(), Some("u2V0D"));
        assert_eq!(credential.document(), json!({"claim": "x"}));
    }

    #[test]
    fn configuration_drops_value_and_adds_context() {
        let proof = Proof {
            proof_value: Some("zabc".to_owned()),
            ..Proof::new("eddsa-rdfc-2022", "did:ex#key-1", "2025-01-01T00:00:00Z".to_owned())
        };
        let config = proof.configuration(&json!({"@context": ["ctx"], "a": 1})).unwrap();
        assert_eq!(
            config,
            json!({
                "@context": ["ctx"],
                "type": "DataIntegrityProof",
                "cryptosuite": "eddsa-rdfc-2022",
                "verificationMethod": "did:ex#key-1",
                "proofPurpose": "assertionMethod",
                "created": "2025-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn issuer_and_subject_setters() {
        let mut credential = Credential::new(json!({"claim": "x"})).unwrap();
        credential.set_issuer("http://example.org/alice");
        credential.set_subject_id("did:example:bob").unwrap();
        assert_eq!(credential.issuer_id(), Some("http://example.org/alice"));
        assert_eq!(credential.claims["credentialSubject"]["id"], "did:example:bob");
        assert!(Credential::new(json!([1, 2])).is_err());
    }
}
