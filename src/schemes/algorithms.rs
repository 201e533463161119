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

use core::marker::PhantomData;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::generics::{MultiMessageScheme, SingleMessageScheme};
use crate::{
    bbsplus::{
        ciphersuites::{BbsCiphersuite, Bls12381Sha256},
        keys::{BbsPublicKey, BbsSecretKey},
        proof::BbsProof,
        signature::BbsSignature,
    },
    errors::{Error, Result},
};

/// BBS over BLS12-381 parameterized by its ciphersuite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbsPlus<CS: BbsCiphersuite>(PhantomData<fn() -> CS>);

impl<CS: BbsCiphersuite> Default for BbsPlus<CS> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

pub type BbsBls12381Sha256 = BbsPlus<Bls12381Sha256>;

impl<CS: BbsCiphersuite> MultiMessageScheme for BbsPlus<CS> {
    fn sign(&self, secret_key: &[u8], public_key: &[u8], header: &[u8], messages: &[Vec<u8>]) -> Result<Vec<u8>> {
        let sk = BbsSecretKey::from_bytes(secret_key)?;
        let pk = BbsPublicKey::from_bytes(public_key)?;
        let signature = BbsSignature::sign::<CS>(messages, &sk, &pk, Some(header))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], signature: &[u8], header: &[u8], messages: &[Vec<u8>]) -> Result<bool> {
        let pk = BbsPublicKey::from_bytes(public_key)?;
        let signature = match BbsSignature::from_bytes(signature) {
            Ok(signature) => signature,
            Err(e) => {
                log::debug!("undecodable BBS signature: {e}");
                return Ok(false);
            }
        };
        signature.verify::<CS>(&pk, messages, Some(header))
    }

    fn derive_proof(
        &self,
        public_key: &[u8],
        signature: &[u8],
        header: &[u8],
        presentation_header: &[u8],
        messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
    ) -> Result<Vec<u8>> {
        let pk = BbsPublicKey::from_bytes(public_key)?;
        let signature = BbsSignature::from_bytes(signature)?;
        let proof = BbsProof::proof_gen::<CS>(
            &signature,
            &pk,
            messages,
            disclosed_indexes,
            Some(header),
            Some(presentation_header),
        )?;
        Ok(proof.to_bytes())
    }

    fn verify_proof(
        &self,
        public_key: &[u8],
        proof: &[u8],
        header: &[u8],
        presentation_header: &[u8],
        disclosed_messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
    ) -> Result<bool> {
        let pk = BbsPublicKey::from_bytes(public_key)?;
        let proof = match BbsProof::from_bytes(proof) {
            Ok(proof) => proof,
            Err(e) => {
                log::debug!("undecodable BBS proof: {e}");
                return Ok(false);
            }
        };
        proof.proof_verify::<CS>(&pk, disclosed_messages, disclosed_indexes, Some(header), Some(presentation_header))
    }
}

/// Ed25519 via `ed25519-dalek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ed25519;

impl SingleMessageScheme for Ed25519 {
    fn sign(&self, secret_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let secret: [u8; 32] = secret_key.try_into().map_err(|_| Error::KeyDeserializationError)?;
        let signing_key = SigningKey::from_bytes(&secret);
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool> {
        let public: [u8; 32] = public_key.try_into().map_err(|_| Error::KeyDeserializationError)?;
        let verifying_key = VerifyingKey::from_bytes(&public).map_err(|_| Error::KeyDeserializationError)?;
        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(e) => {
                log::debug!("undecodable Ed25519 signature: {e}");
                return Ok(false);
            }
        };
        Ok(verifying_key.verify(message, &signature).is_ok())
    }
}
