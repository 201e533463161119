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

use crate::{
    config::ClassificationPolicy,
    errors::{Error, Result},
};

/// Literal prefix of a BLS12-381 G2 multikey.
pub const MULTI_MESSAGE_PREFIX: &str = "zUC7";
/// Literal prefix of an Ed25519 multikey.
pub const SINGLE_MESSAGE_PREFIX: &str = "z6Mk";

pub const BBS_CRYPTOSUITE: &str = "bbs-2023";
pub const EDDSA_CRYPTOSUITE: &str = "eddsa-rdfc-2022";

/// Signature family of a verification method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFamily {
    /// One signature over one message (Ed25519).
    SingleMessage,
    /// BBS over an ordered list of messages, supports selective disclosure.
    MultiMessage,
}

impl KeyFamily {
    pub const fn cryptosuite(self) -> &'static str {
        match self {
            Self::SingleMessage => EDDSA_CRYPTOSUITE,
            Self::MultiMessage => BBS_CRYPTOSUITE,
        }
    }
}

/// Classifies a `publicKeyMultibase` value by its literal prefix.
pub fn classify(public_key_multibase: &str, policy: ClassificationPolicy) -> Result<KeyFamily> {
    if public_key_multibase.starts_with(MULTI_MESSAGE_PREFIX) {
        return Ok(KeyFamily::MultiMessage);
    }
    if public_key_multibase.starts_with(SINGLE_MESSAGE_PREFIX) {
        return Ok(KeyFamily::SingleMessage);
    }
    match policy {
        ClassificationPolicy::FailClosed => Err(Error::UnsupportedKeyFamily(public_key_multibase.to_owned())),
        ClassificationPolicy::FailOpen => {
            log::warn!("unrecognized key prefix for {public_key_multibase}, treating it as single-message");
            Ok(KeyFamily::SingleMessage)
        }
    }
}
