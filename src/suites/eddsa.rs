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

//! The `eddsa-rdfc-2022` cryptosuite: one signature over `proofHash || documentHash`.

use multibase::Base;
use serde_json::Value;

use super::hash_proof_configuration;
use crate::{
    canonical::Canonicalizer,
    credential::Proof,
    errors::{Error, Result},
    hashing::Hasher,
    schemes::generics::SingleMessageScheme,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleMessageVerifyData {
    pub proof_hash: Vec<u8>,
    pub document_hash: Vec<u8>,
}

impl SingleMessageVerifyData {
    /// The signed message. The order is fixed by the cryptosuite.
    pub fn message(&self) -> Vec<u8> {
        [self.proof_hash.as_slice(), self.document_hash.as_slice()].concat()
    }
}

/// Hashes the proof configuration and the document independently.
pub async fn create_verify_data<C: Canonicalizer, H: Hasher>(
    canonicalizer: &C,
    hasher: &H,
    document: &Value,
    proof: &Proof,
) -> Result<SingleMessageVerifyData> {
    let (proof_hash, document_hash) = futures::try_join!(
        async { hash_proof_configuration(canonicalizer, hasher, proof, document) },
        async { hasher.hash_statements(&canonicalizer.canonicalize(document)?.lines()) },
    )?;
    Ok(SingleMessageVerifyData { proof_hash, document_hash })
}

pub(crate) async fn create_proof_value<C, H, S>(
    canonicalizer: &C,
    hasher: &H,
    scheme: &S,
    document: &Value,
    proof: &Proof,
    secret_key: &[u8],
) -> Result<String>
where
    C: Canonicalizer,
    H: Hasher,
    S: SingleMessageScheme,
{
    let data = create_verify_data(canonicalizer, hasher, document, proof).await?;
    let signature = scheme.sign(secret_key, &data.message())?;
    Ok(multibase::encode(Base::Base58Btc, signature))
}

pub(crate) async fn verify_proof_value<C, H, S>(
    canonicalizer: &C,
    hasher: &H,
    scheme: &S,
    document: &Value,
    proof: &Proof,
    public_key: &[u8],
) -> Result<bool>
where
    C: Canonicalizer,
    H: Hasher,
    S: SingleMessageScheme,
{
    let proof_value = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| Error::malformed("proofValue is missing"))?;
    let signature = match multibase::decode(proof_value) {
        Ok((Base::Base58Btc, signature)) => signature,
        Ok((base, _)) => return Err(Error::malformed(format!("expected a base58btc proof value, got {base:?}"))),
        Err(e) => return Err(Error::malformed_with("proofValue is not valid multibase", e)),
    };
    let data = create_verify_data(canonicalizer, hasher, document, proof).await?;
    scheme.verify(public_key, &data.message(), &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{canonical::JsonCanonicalizer, hashing::Sha256Hasher};
    use serde_json::json;

    #[tokio::test]
    async fn proof_hash_comes_first() {
        let document = json!({"@context": ["https://www.w3.org/ns/credentials/v2"], "claim": "x"});
        let proof = Proof::new("eddsa-rdfc-2022", "did:example:alice#key-1", "2025-01-01T00:00:00Z".to_owned());
        let hasher = Sha256Hasher::default();

        let data = create_verify_data(&JsonCanonicalizer, &hasher, &document, &proof).await.unwrap();
        let config = proof.configuration(&document).unwrap();
        let expected_proof_hash = hasher.hash_statements(&JsonCanonicalizer.canonicalize(&config).unwrap().lines()).unwrap();

        assert_eq!(data.proof_hash, expected_proof_hash);
        assert_eq!(&data.message()[..32], expected_proof_hash.as_slice());
        assert_eq!(&data.message()[32..], data.document_hash.as_slice());
    }
}
