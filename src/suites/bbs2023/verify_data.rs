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

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::{envelope::parse_disclosure_proof_value, transform::split_by_index};
use crate::{
    canonical::Canonicalizer,
    cid::VerificationMethod,
    credential::{Credential, Proof},
    errors::{Error, Result},
    hashing::Hasher,
    suites::hash_proof_configuration,
};

/// Everything a BBS proof verification needs, recomputed from a derived credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyData {
    pub bbs_proof: Vec<u8>,
    pub proof_hash: Vec<u8>,
    pub mandatory_hash: Vec<u8>,
    pub mandatory: Vec<String>,
    pub non_mandatory: Vec<String>,
    pub selective_indexes: Vec<usize>,
    pub presentation_header: Vec<u8>,
}

impl VerifyData {
    /// BBS header: `proofHash || mandatoryHash`.
    pub fn header(&self) -> Vec<u8> {
        [self.proof_hash.as_slice(), self.mandatory_hash.as_slice()].concat()
    }

    pub fn disclosed_messages(&self) -> Vec<Vec<u8>> {
        self.non_mandatory.iter().map(|s| s.as_bytes().to_vec()).collect()
    }
}

/// Recomputes the [`VerifyData`] of a credential carrying a derived `bbs-2023` proof.
///
/// The proof configuration hash and the proof value decoding run concurrently, and the first
/// failure of either is returned.
pub async fn create_verify_data<C: Canonicalizer, H: Hasher>(
    canonicalizer: &C,
    hasher: &H,
    credential: &Credential,
) -> Result<VerifyData> {
    let proof = credential
        .proof
        .as_ref()
        .ok_or_else(|| Error::InvalidState("credential has no proof".to_owned()))?;
    let document = credential.document();

    let (proof_hash, envelope) = futures::try_join!(
        async { hash_proof_configuration(canonicalizer, hasher, proof, &document) },
        async { parse_disclosure_proof_value(proof.proof_value.as_deref()) },
    )?;

    let statements = canonicalizer.canonicalize_with_labels(&document, &envelope.label_map)?;
    let (mandatory, non_mandatory) = split_by_index(statements, &envelope.mandatory_indexes);
    let mandatory_hash = hasher.hash_statements(&mandatory)?;

    log::debug!(
        "verify data: {} mandatory, {} disclosed statement(s)",
        mandatory.len(),
        non_mandatory.len()
    );
    Ok(VerifyData {
        bbs_proof: envelope.bbs_proof,
        proof_hash,
        mandatory_hash,
        mandatory,
        non_mandatory,
        selective_indexes: envelope.selective_indexes,
        presentation_header: envelope.presentation_header,
    })
}

/// Serializable [`VerifyData`] plus the resolved method and proof, for verification without
/// the credential or the CID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDataExport {
    pub bbs_proof: String,
    pub proof_hash: String,
    pub mandatory_hash: String,
    pub mandatory: Vec<String>,
    pub non_mandatory: Vec<String>,
    pub selective_indexes: Vec<usize>,
    pub presentation_header: String,
    pub verification_method: VerificationMethod,
    pub proof: Proof,
}

impl VerifyDataExport {
    pub fn new(data: VerifyData, verification_method: VerificationMethod, proof: Proof) -> Self {
        Self {
            bbs_proof: STANDARD.encode(&data.bbs_proof),
            proof_hash: STANDARD.encode(&data.proof_hash),
            mandatory_hash: STANDARD.encode(&data.mandatory_hash),
            mandatory: data.mandatory,
            non_mandatory: data.non_mandatory,
            selective_indexes: data.selective_indexes,
            presentation_header: STANDARD.encode(&data.presentation_header),
            verification_method,
            proof,
        }
    }

    pub fn verify_data(&self) -> Result<VerifyData> {
        let decode = |field: &str, value: &str| {
            STANDARD
                .decode(value)
                .map_err(|e| Error::DeserializationError(format!("{field}: {e}")))
        };
        Ok(VerifyData {
            bbs_proof: decode("bbsProof", &self.bbs_proof)?,
            proof_hash: decode("proofHash", &self.proof_hash)?,
            mandatory_hash: decode("mandatoryHash", &self.mandatory_hash)?,
            mandatory: self.mandatory.clone(),
            non_mandatory: self.non_mandatory.clone(),
            selective_indexes: self.selective_indexes.clone(),
            presentation_header: decode("presentationHeader", &self.presentation_header)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canonical::JsonCanonicalizer,
        hashing::Sha256Hasher,
        suites::bbs2023::envelope::{serialize_disclosure_proof_value, DerivedProofEnvelope},
    };
    use serde_json::json;

    fn derived_credential(proof_value: Option<String>) -> Credential {
        let mut credential = Credential::new(json!({
            "issuer": {"id": "http://example.org/alice"},
            "claim": "x"
        }))
        .unwrap();
        credential.proof = Some(Proof {
            proof_value,
            ..Proof::new("bbs-2023", "http://example.org/alice#key-1", "2025-01-01T00:00:00Z".to_owned())
        });
        credential
    }

    #[tokio::test]
    async fn statements_are_split_by_mandatory_indexes() {
        let proof_value = serialize_disclosure_proof_value(&DerivedProofEnvelope {
            bbs_proof: vec![0; 4],
            label_map: [("c14n0".to_owned(), "b0".to_owned())].into_iter().collect(),
            mandatory_indexes: vec![1],
            selective_indexes: vec![0],
            presentation_header: Vec::new(),
        })
        .unwrap();
        let credential = derived_credential(Some(proof_value));

        let data = create_verify_data(&JsonCanonicalizer, &Sha256Hasher::default(), &credential).await.unwrap();
        assert_eq!(data.mandatory.len(), 1);
        assert!(data.mandatory[0].contains("issuer"));
        assert!(data.non_mandatory[0].starts_with("_:b0 "));
        assert_eq!(data.header().len(), 64);
        assert_eq!(data.mandatory_hash, Sha256Hasher::default().hash_statements(&data.mandatory).unwrap());
    }

    #[tokio::test]
    async fn envelope_failure_propagates() {
        let credential = derived_credential(Some("not-multibase".to_owned()));
        let result = create_verify_data(&JsonCanonicalizer, &Sha256Hasher::default(), &credential).await;
        assert!(matches!(result, Err(Error::MalformedProof { .. })));
    }

    #[test]
    fn export_decodes_back() {
        let data = VerifyData {
            bbs_proof: vec![1, 2, 3],
            proof_hash: vec![4; 32],
            mandatory_hash: vec![5; 32],
            mandatory: vec!["m .\n".to_owned()],
            non_mandatory: vec![],
            selective_indexes: vec![],
            presentation_header: b"ph".to_vec(),
        };
        let method = VerificationMethod {
            id: "http://example.org/alice#key-1".to_owned(),
            type_: "Multikey".to_owned(),
            controller: "http://example.org/alice".to_owned(),
            public_key_multibase: "zUC7".to_owned(),
        };
        let proof = Proof::new("bbs-2023", &method.id, "2025-01-01T00:00:00Z".to_owned());
        let export = VerifyDataExport::new(data.clone(), method, proof);
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["presentationHeader"], "cGg=");
        assert_eq!(export.verify_data().unwrap(), data);
    }
}
