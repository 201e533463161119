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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    keys::{
        family::KeyFamily,
        multikey::{self, Multicodec},
    },
};

/// Secret keys of a CID document, keyed by verification method id.
///
/// Only [`super::CidDocument::generate`] adds entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivateKeyStore {
    keys: BTreeMap<String, String>,
}

impl PrivateKeyStore {
    pub(crate) fn insert(&mut self, method_id: String, secret_key_multibase: String) {
        self.keys.insert(method_id, secret_key_multibase);
    }

    pub fn secret_key_multibase(&self, method_id: &str) -> Option<&str> {
        self.keys.get(method_id).map(String::as_str)
    }

    pub fn method_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Raw secret key bytes for `method_id`, decoded for the given family.
    pub fn secret_key(&self, method_id: &str, family: KeyFamily) -> Result<Vec<u8>> {
        let encoded = self
            .secret_key_multibase(method_id)
            .ok_or_else(|| Error::Resolution(format!("secret key for {method_id}")))?;
        let codec = match family {
            KeyFamily::MultiMessage => Multicodec::Bls12381G2Priv,
            KeyFamily::SingleMessage => Multicodec::Ed25519Priv,
        };
        multikey::decode(codec, encoded)
    }
}
