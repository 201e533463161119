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

//! The `bbs-2023` cryptosuite: base proofs created by the issuer, derived proofs created by the
//! holder, and their verification.

mod derive;
/// Proof value wire format
pub mod envelope;
pub(crate) mod transform;
/// Verify data of derived proofs
pub mod verify_data;

pub(crate) use derive::derive;

use serde_json::Value;

use self::{
    envelope::{parse_base_proof_value, serialize_base_proof_value, BaseProofEnvelope},
    transform::{as_messages, selection_statements, skolemize, split_mandatory},
};
use super::hash_proof_configuration;
use crate::{
    canonical::Canonicalizer,
    credential::{Credential, Proof},
    errors::Result,
    hashing::Hasher,
    schemes::generics::MultiMessageScheme,
};

/// Claims the holder can never hide.
pub(crate) fn mandatory_pointers(credential: &Credential) -> Vec<String> {
    let mut pointers = vec!["/issuer".to_owned()];
    for claim in ["validFrom", "validUntil"] {
        if credential.has_claim(claim) {
            pointers.push(format!("/{claim}"));
        }
    }
    pointers
}

/// `proofHash || mandatoryHash` and the non-mandatory statements the signature covers.
fn signed_data<C: Canonicalizer, H: Hasher>(
    canonicalizer: &C,
    hasher: &H,
    proof: &Proof,
    document: &Value,
    pointers: &[String],
) -> Result<(Vec<u8>, Vec<String>)> {
    let proof_hash = hash_proof_configuration(canonicalizer, hasher, proof, document)?;
    let skolemized = skolemize(canonicalizer, document)?;
    let mandatory = selection_statements(canonicalizer, &skolemized.document, pointers)?;
    let mandatory_hash = hasher.hash_statements(&mandatory)?;
    let (_, non_mandatory) = split_mandatory(&skolemized.statements, &mandatory);

    log::debug!(
        "bbs-2023 statements: {} mandatory, {} non-mandatory",
        mandatory.len(),
        non_mandatory.len()
    );
    Ok(([proof_hash, mandatory_hash].concat(), non_mandatory))
}

/// Signs `credential` (already stamped) and returns the base `proofValue` for `proof`.
pub(crate) fn create_base_proof<C, H, M>(
    canonicalizer: &C,
    hasher: &H,
    scheme: &M,
    credential: &Credential,
    proof: &Proof,
    secret_key: &[u8],
    public_key: &[u8],
) -> Result<String>
where
    C: Canonicalizer,
    H: Hasher,
    M: MultiMessageScheme,
{
    let pointers = mandatory_pointers(credential);
    let (header, non_mandatory) = signed_data(canonicalizer, hasher, proof, &credential.document(), &pointers)?;
    let signature = scheme.sign(secret_key, public_key, &header, &as_messages(&non_mandatory))?;

    serialize_base_proof_value(&BaseProofEnvelope {
        bbs_signature: signature,
        bbs_header: header,
        public_key: public_key.to_vec(),
        mandatory_pointers: pointers,
    })
}

pub(crate) fn verify_base_proof<C, H, M>(
    canonicalizer: &C,
    hasher: &H,
    scheme: &M,
    credential: &Credential,
    proof: &Proof,
    public_key: &[u8],
) -> Result<bool>
where
    C: Canonicalizer,
    H: Hasher,
    M: MultiMessageScheme,
{
    let envelope = parse_base_proof_value(proof.proof_value.as_deref())?;
    if envelope.public_key != public_key {
        log::warn!("base proof carries a public key other than {}", proof.verification_method);
        return Ok(false);
    }

    let (header, non_mandatory) =
        signed_data(canonicalizer, hasher, proof, &credential.document(), &envelope.mandatory_pointers)?;
    if header != envelope.bbs_header {
        log::debug!("recomputed bbs header differs from the signed one");
        return Ok(false);
    }
    scheme.verify(public_key, &envelope.bbs_signature, &header, &as_messages(&non_mandatory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validity_period_is_mandatory_when_present() {
        let plain = Credential::new(json!({"claim": "x"})).unwrap();
        assert_eq!(mandatory_pointers(&plain), vec!["/issuer"]);

        let dated = Credential::new(json!({
            "claim": "x",
            "validFrom": "2025-01-01T00:00:00Z",
            "validUntil": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(mandatory_pointers(&dated), vec!["/issuer", "/validFrom", "/validUntil"]);
    }
}
