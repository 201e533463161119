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

use crate::errors::Result;

/// Signature primitive over an ordered list of messages with selective disclosure proofs.
///
/// Keys, signatures and proofs are passed as raw bytes so the suites never depend on a
/// specific backend. Verification returns `Ok(false)` for a cryptographic mismatch,
/// including signature or proof bytes that do not decode.
pub trait MultiMessageScheme: Send + Sync {
    fn sign(&self, secret_key: &[u8], public_key: &[u8], header: &[u8], messages: &[Vec<u8>]) -> Result<Vec<u8>>;

    fn verify(&self, public_key: &[u8], signature: &[u8], header: &[u8], messages: &[Vec<u8>]) -> Result<bool>;

    /// Proof of possession of `signature` revealing `messages[i]` for each `i` in `disclosed_indexes`.
    fn derive_proof(
        &self,
        public_key: &[u8],
        signature: &[u8],
        header: &[u8],
        presentation_header: &[u8],
        messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
    ) -> Result<Vec<u8>>;

    fn verify_proof(
        &self,
        public_key: &[u8],
        proof: &[u8],
        header: &[u8],
        presentation_header: &[u8],
        disclosed_messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
    ) -> Result<bool>;
}

/// Signature primitive over a single message.
pub trait SingleMessageScheme: Send + Sync {
    fn sign(&self, secret_key: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool>;
}
