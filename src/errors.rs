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

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    /// A verification method or its secret key is not present in the CID document / key store.
    #[error("Unable to resolve {0}")]
    Resolution(String),
    /// The `proofValue` failed prefix, header or shape validation. The root cause is kept as `source`.
    #[error("Malformed proof value: {message}")]
    MalformedProof {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Unsupported key family for public key {0}")]
    UnsupportedKeyFamily(String),
    #[error("Operation not allowed on this credential: {0}")]
    InvalidState(String),
    #[error("Invalid JSON pointer: {0}")]
    InvalidPointer(String),
    #[error("Error during canonicalization: {0}")]
    Canonicalization(String),
    #[error("Error during hashing: {0}")]
    Hashing(String),
    #[error("Error during serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid key encoding: {0}")]
    KeyEncoding(String),
    #[error("Unable to load document {url}: {reason}")]
    DocumentLoad { url: String, reason: String },

    #[error("Error during keypair generation")]
    KeyGenError(String),
    #[error("Invalid key")]
    KeyDeserializationError,
    #[error("Error during computation of a Signature")]
    SignatureGenerationError(String),
    #[error("Error during hash to scalar computation")]
    HashToScalarError,
    #[error("Not enough Generators")]
    NotEnoughGenerators,
    /// [More Info](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-06#name-coresign) in the `Note` at the end
    #[error(" A == Identity_G1")]
    G1IdentityError,
    #[error("Error during deserialization")]
    DeserializationError(String),
    #[error("Error during computation of a Proof of Knowledge of a Signature")]
    ProofGenError(String),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedProof { message: message.into(), source: None }
    }

    pub(crate) fn malformed_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::MalformedProof { message: message.into(), source: Some(Box::new(cause)) }
    }
}
