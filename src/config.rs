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

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// What to do with a public key whose multibase prefix matches neither known family.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// Reject the key with [`Error::UnsupportedKeyFamily`].
    #[default]
    FailClosed,
    /// Treat the key as a single-message key and log a warning.
    FailOpen,
}

impl FromStr for ClassificationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            "fail-open" | "open" => Ok(Self::FailOpen),
            other => Err(Error::InvalidState(format!("unknown key classification policy '{other}'"))),
        }
    }
}

/// Configuration shared by every [`crate::suites::Suite`] operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuiteConfig {
    #[serde(default)]
    pub classification: ClassificationPolicy,
}

impl SuiteConfig {
    pub const ENV_KEY_CLASSIFICATION: &'static str = "CIDSUITE_KEY_CLASSIFICATION";

    /// Reads the configuration from the process environment, falling back to defaults
    /// for unset variables.
    pub fn from_env() -> Result<Self> {
        let classification = match std::env::var(Self::ENV_KEY_CLASSIFICATION) {
            Ok(value) => value.parse()?,
            Err(_) => ClassificationPolicy::default(),
        };
        log::debug!("suite configuration: classification={classification:?}");
        Ok(Self { classification })
    }

    pub fn with_classification(mut self, classification: ClassificationPolicy) -> Self {
        self.classification = classification;
        self
    }
}

/// Per-call options of [`crate::suites::Suite::sign`].
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Sets the credential `id` when present.
    pub credential_id: Option<String>,
    /// Sets `credentialSubject.id` when present.
    pub subject_id: Option<String>,
    /// Proof creation time, defaults to now.
    pub created: Option<DateTime<Utc>>,
}

/// Per-call options of [`crate::suites::Suite::derive`].
#[derive(Debug, Clone, Default)]
pub struct DeriveOptions {
    /// Presentation header bound into the derived proof.
    pub presentation_header: Vec<u8>,
}

impl DeriveOptions {
    pub fn with_presentation_header(presentation_header: impl Into<Vec<u8>>) -> Self {
        Self { presentation_header: presentation_header.into() }
    }
}
