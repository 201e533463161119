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

use digest::Digest;
use sha2::Sha256;

use crate::errors::{Error, Result};

/// Digest collaborator used for proof, document and mandatory statement hashes.
pub trait Hasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Hashes the concatenation of canonical statements, each already newline terminated.
    ///
    /// An empty digest is an [`Error::Hashing`].
    fn hash_statements(&self, statements: &[String]) -> Result<Vec<u8>> {
        let digest = self.hash(statements.concat().as_bytes())?;
        if digest.is_empty() {
            return Err(Error::Hashing("hasher returned an empty digest".to_owned()));
        }
        Ok(digest)
    }
}

/// [`Hasher`] backed by any RustCrypto [`Digest`].
#[derive(Debug, Clone, Copy)]
pub struct DigestHasher<D>(PhantomData<fn() -> D>);

impl<D> Default for DigestHasher<D> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<D: Digest> Hasher for DigestHasher<D> {
    fn hash(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(D::digest(data).to_vec())
    }
}

pub type Sha256Hasher = DigestHasher<Sha256>;
