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

use super::store::PrivateKeyStore;
use crate::{
    config::ClassificationPolicy,
    errors::Result,
    keys::{
        family::{classify, KeyFamily},
        pair::KeyPair,
    },
};

pub const CID_CONTEXT: &str = "https://www.w3.org/ns/cid/v1";
pub const MULTIKEY: &str = "Multikey";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    pub public_key_multibase: String,
}

impl VerificationMethod {
    pub fn key_family(&self, policy: ClassificationPolicy) -> Result<KeyFamily> {
        classify(&self.public_key_multibase, policy)
    }
}

/// Controlled identifier document publishing the verification methods of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
    #[serde(default)]
    pub assertion_method: Vec<String>,
    #[serde(default)]
    pub capability_invocation: Vec<String>,
    #[serde(default)]
    pub capability_delegation: Vec<String>,
}

impl CidDocument {
    /// Generates one key pair per requested family and returns the document together with
    /// the secret keys. Method ids are `{controller}#key-1`, `#key-2`, ... in request order
    /// and every method is listed under every verification relationship.
    pub fn generate(controller: &str, families: &[KeyFamily]) -> Result<(Self, PrivateKeyStore)> {
        let mut document = Self {
            context: vec![CID_CONTEXT.to_owned()],
            id: controller.to_owned(),
            verification_method: Vec::with_capacity(families.len()),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            capability_invocation: Vec::new(),
            capability_delegation: Vec::new(),
        };
        let mut store = PrivateKeyStore::default();

        for (n, family) in (1..).zip(families) {
            let pair = KeyPair::generate(*family)?;
            let id = format!("{controller}#key-{n}");

            document.verification_method.push(VerificationMethod {
                id: id.clone(),
                type_: MULTIKEY.to_owned(),
                controller: controller.to_owned(),
                public_key_multibase: pair.public_key_multibase()?,
            });
            for relationship in [
                &mut document.authentication,
                &mut document.assertion_method,
                &mut document.capability_invocation,
                &mut document.capability_delegation,
            ] {
                relationship.push(id.clone());
            }
            store.insert(id, pair.secret_key_multibase()?);
        }

        log::info!("generated CID document {controller} with {} verification methods", families.len());
        Ok((document, store))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether `method_id` names a method of this controller (`{id}#...`).
    pub fn controls(&self, method_id: &str) -> bool {
        method_id
            .strip_prefix(self.id.as_str())
            .is_some_and(|rest| rest.starts_with('#'))
    }
}
