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

use ed25519_dalek::SigningKey;

use super::{
    family::KeyFamily,
    multikey::{self, Multicodec},
};
use crate::{
    bbsplus::{ciphersuites::Bls12381Sha256, keys::BbsKeyPair},
    errors::Result,
};

/// A freshly generated key pair of either family.
#[derive(Clone, Debug)]
pub enum KeyPair {
    Bbs(BbsKeyPair),
    Ed25519(SigningKey),
}

impl KeyPair {
    pub fn generate(family: KeyFamily) -> Result<Self> {
        match family {
            KeyFamily::MultiMessage => Ok(Self::Bbs(BbsKeyPair::random::<Bls12381Sha256>()?)),
            KeyFamily::SingleMessage => Ok(Self::Ed25519(SigningKey::generate(&mut rand::rngs::OsRng))),
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Bbs(_) => KeyFamily::MultiMessage,
            Self::Ed25519(_) => KeyFamily::SingleMessage,
        }
    }

    pub fn public_key_multibase(&self) -> Result<String> {
        match self {
            Self::Bbs(pair) => multikey::encode(Multicodec::Bls12381G2Pub, &pair.public_key().to_bytes()),
            Self::Ed25519(key) => multikey::encode(Multicodec::Ed25519Pub, key.verifying_key().as_bytes()),
        }
    }

    pub fn secret_key_multibase(&self) -> Result<String> {
        match self {
            Self::Bbs(pair) => multikey::encode(Multicodec::Bls12381G2Priv, &pair.private_key().to_bytes()),
            Self::Ed25519(key) => multikey::encode(Multicodec::Ed25519Priv, key.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClassificationPolicy, keys::family::classify};

    #[test]
    fn generated_keys_classify_to_their_family() {
        for family in [KeyFamily::MultiMessage, KeyFamily::SingleMessage] {
            let pair = KeyPair::generate(family).unwrap();
            let multibase = pair.public_key_multibase().unwrap();
            assert_eq!(pair.family(), family);
            assert_eq!(classify(&multibase, ClassificationPolicy::FailClosed).unwrap(), family);
        }
    }
}
