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

/// `bbs-2023` base and derived proofs
pub mod bbs2023;
/// `eddsa-rdfc-2022` proofs
pub mod eddsa;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use self::bbs2023::{
    envelope::{proof_value_kind, ProofValueKind},
    verify_data::{create_verify_data, VerifyData, VerifyDataExport},
};
use crate::{
    canonical::{Canonicalizer, JsonCanonicalizer},
    cid::{resolve, CidDocument, PrivateKeyStore, ResolvedMethod},
    config::{DeriveOptions, SignOptions, SuiteConfig},
    credential::{Credential, Proof},
    errors::{Error, Result},
    hashing::{Hasher, Sha256Hasher},
    keys::family::KeyFamily,
    loader::{normalize_url, DocumentLoader},
    schemes::{
        algorithms::{BbsBls12381Sha256, Ed25519},
        generics::{MultiMessageScheme, SingleMessageScheme},
    },
};

/// Hash of the canonical proof configuration (the proof without its value).
pub(crate) fn hash_proof_configuration<C: Canonicalizer, H: Hasher>(
    canonicalizer: &C,
    hasher: &H,
    proof: &Proof,
    document: &Value,
) -> Result<Vec<u8>> {
    let configuration = proof.configuration(document)?;
    hasher.hash_statements(&canonicalizer.canonicalize(&configuration)?.lines())
}

/// Signs, derives and verifies credentials on behalf of CID document controllers.
///
/// The key family of the verification method picks the cryptosuite: multi-message keys sign
/// with `bbs-2023` and support selective disclosure, single-message keys sign with
/// `eddsa-rdfc-2022`. Canonicalization, hashing and both signature primitives are injected.
#[derive(Debug, Clone)]
pub struct Suite<C = JsonCanonicalizer, H = Sha256Hasher, M = BbsBls12381Sha256, S = Ed25519> {
    canonicalizer: C,
    hasher: H,
    multi_message: M,
    single_message: S,
    config: SuiteConfig,
}

impl Default for Suite {
    fn default() -> Self {
        Self::with_config(SuiteConfig::default())
    }
}

impl Suite {
    /// Default primitives with the given configuration.
    pub fn with_config(config: SuiteConfig) -> Self {
        Self::new(JsonCanonicalizer, Sha256Hasher::default(), BbsBls12381Sha256::default(), Ed25519, config)
    }
}

impl<C, H, M, S> Suite<C, H, M, S>
where
    C: Canonicalizer,
    H: Hasher,
    M: MultiMessageScheme,
    S: SingleMessageScheme,
{
    pub fn new(canonicalizer: C, hasher: H, multi_message: M, single_message: S, config: SuiteConfig) -> Self {
        Self { canonicalizer, hasher, multi_message, single_message, config }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Issues `credential` as `cid` with the method `key_id`.
    ///
    /// The issuer is set to the CID document id. Fails with [`Error::Resolution`] when the
    /// method or its secret key is missing.
    pub async fn sign(
        &self,
        cid: &CidDocument,
        keys: &PrivateKeyStore,
        credential: &Credential,
        key_id: &str,
        options: SignOptions,
    ) -> Result<Credential> {
        if credential.proof.is_some() {
            return Err(Error::InvalidState("credential is already signed".to_owned()));
        }

        let mut signed = credential.clone();
        signed.set_issuer(&cid.id);
        if let Some(id) = &options.credential_id {
            signed.set_id(id);
        }
        if let Some(id) = &options.subject_id {
            signed.set_subject_id(id)?;
        }

        let resolved = resolve(cid, key_id, self.config.classification)?;
        let secret_key = keys.secret_key(key_id, resolved.family)?;
        let public_key = resolved.public_key()?;

        let created = options.created.unwrap_or_else(Utc::now).to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut proof = Proof::new(resolved.family.cryptosuite(), key_id, created);
        let proof_value = match resolved.family {
            KeyFamily::SingleMessage => {
                eddsa::create_proof_value(
                    &self.canonicalizer,
                    &self.hasher,
                    &self.single_message,
                    &signed.document(),
                    &proof,
                    &secret_key,
                )
                .await?
            }
            KeyFamily::MultiMessage => bbs2023::create_base_proof(
                &self.canonicalizer,
                &self.hasher,
                &self.multi_message,
                &signed,
                &proof,
                &secret_key,
                &public_key,
            )?,
        };
        proof.proof_value = Some(proof_value);
        signed.proof = Some(proof);

        log::info!("signed credential with {key_id} ({})", resolved.family.cryptosuite());
        Ok(signed)
    }

    /// Verifies a signed or derived credential against the CID document of its issuer.
    ///
    /// Returns `Ok(false)` when the signature does not match, and also when the credential was
    /// not issued by `cid` or names a method another controller owns.
    pub async fn verify(&self, cid: &CidDocument, credential: &Credential) -> Result<bool> {
        let proof = proof_of(credential)?;
        let Some(resolved) = self.authorized_method(cid, credential, proof)? else {
            return Ok(false);
        };
        let public_key = resolved.public_key()?;

        let verified = match resolved.family {
            KeyFamily::SingleMessage => {
                eddsa::verify_proof_value(
                    &self.canonicalizer,
                    &self.hasher,
                    &self.single_message,
                    &credential.document(),
                    proof,
                    &public_key,
                )
                .await?
            }
            KeyFamily::MultiMessage => match proof_value_kind(proof.proof_value.as_deref())? {
                ProofValueKind::Base => bbs2023::verify_base_proof(
                    &self.canonicalizer,
                    &self.hasher,
                    &self.multi_message,
                    credential,
                    proof,
                    &public_key,
                )?,
                ProofValueKind::Derived => {
                    let data = create_verify_data(&self.canonicalizer, &self.hasher, credential).await?;
                    self.verify_derived(&public_key, &data)?
                }
            },
        };

        log::info!("verification of {} proof by {}: {verified}", proof.cryptosuite, proof.verification_method);
        Ok(verified)
    }

    /// Reveals the claims reached by `reveal_pointers`, plus the mandatory claims, under a
    /// derived `bbs-2023` proof. Needs no secret key.
    pub async fn derive(
        &self,
        credential: &Credential,
        reveal_pointers: &[String],
        options: DeriveOptions,
    ) -> Result<Credential> {
        let derived = bbs2023::derive(
            &self.canonicalizer,
            &self.multi_message,
            credential,
            reveal_pointers,
            &options.presentation_header,
        )?;
        log::info!("derived credential revealing {} pointer(s)", reveal_pointers.len());
        Ok(derived)
    }

    /// Computes the verify data of a derived credential so it can be checked later with
    /// [`Suite::verify_preprocessed`].
    pub async fn preprocess(&self, cid: &CidDocument, credential: &Credential) -> Result<VerifyDataExport> {
        let proof = proof_of(credential)?;
        let resolved = self
            .authorized_method(cid, credential, proof)?
            .ok_or_else(|| Error::Resolution(format!("{} as a method of {}", proof.verification_method, cid.id)))?;
        if resolved.family != KeyFamily::MultiMessage
            || proof_value_kind(proof.proof_value.as_deref())? != ProofValueKind::Derived
        {
            return Err(Error::InvalidState("only derived bbs-2023 proofs can be preprocessed".to_owned()));
        }

        let data = create_verify_data(&self.canonicalizer, &self.hasher, credential).await?;
        log::debug!("preprocessed derived proof by {}", proof.verification_method);
        Ok(VerifyDataExport::new(data, resolved.method.clone(), proof.clone()))
    }

    pub async fn verify_preprocessed(&self, export: &VerifyDataExport) -> Result<bool> {
        let method = &export.verification_method;
        if export.proof.verification_method != method.id {
            log::warn!("preprocessed proof names {} but carries {}", export.proof.verification_method, method.id);
            return Ok(false);
        }
        let family = method.key_family(self.config.classification)?;
        if family != KeyFamily::MultiMessage {
            return Err(Error::InvalidState(format!("{} is not a bbs-2023 method", method.id)));
        }

        let public_key = ResolvedMethod { method, family }.public_key()?;
        let verified = self.verify_derived(&public_key, &export.verify_data()?)?;
        log::info!("offline verification of proof by {}: {verified}", method.id);
        Ok(verified)
    }

    /// Verifies `credential` against the CID document fetched from its verification method's
    /// controller URL.
    pub async fn verify_with_loader<L>(&self, credential: &Credential, loader: &L) -> Result<bool>
    where
        L: DocumentLoader + ?Sized,
    {
        let proof = proof_of(credential)?;
        let document = loader.load(&normalize_url(&proof.verification_method)).await?;
        let cid: CidDocument = serde_json::from_value(document)?;
        self.verify(&cid, credential).await
    }

    fn verify_derived(&self, public_key: &[u8], data: &VerifyData) -> Result<bool> {
        self.multi_message.verify_proof(
            public_key,
            &data.bbs_proof,
            &data.header(),
            &data.presentation_header,
            &data.disclosed_messages(),
            &data.selective_indexes,
        )
    }

    /// `None` when the proof must be rejected without looking at the signature.
    fn authorized_method<'a>(
        &self,
        cid: &'a CidDocument,
        credential: &Credential,
        proof: &Proof,
    ) -> Result<Option<ResolvedMethod<'a>>> {
        if credential.issuer_id() != Some(cid.id.as_str()) {
            log::warn!("credential issuer {:?} is not {}", credential.issuer_id(), cid.id);
            return Ok(None);
        }
        if !cid.controls(&proof.verification_method) {
            log::warn!("{} is not a method of {}", proof.verification_method, cid.id);
            return Ok(None);
        }
        let resolved = resolve(cid, &proof.verification_method, self.config.classification)?;
        if proof.cryptosuite != resolved.family.cryptosuite() {
            log::warn!("{} proof made with a {:?} key", proof.cryptosuite, resolved.family);
            return Ok(None);
        }
        Ok(Some(resolved))
    }
}

fn proof_of(credential: &Credential) -> Result<&Proof> {
    credential
        .proof
        .as_ref()
        .ok_or_else(|| Error::InvalidState("credential has no proof".to_owned()))
}
