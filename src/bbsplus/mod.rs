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

//! The [BBS (Boneh-Boyen-Shacham) Signature Scheme](https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html)
//! over BLS12-381 with the SHA-256 ciphersuite.
//!
//! A single BBS signature covers an ordered list of messages. The holder can later produce a
//! zero-knowledge proof of possession that reveals only a chosen subset of them, bound to a
//! presentation header. The `bbs-2023` cryptosuite signs one message per canonical statement.

/// Module for ciphersuites
pub mod ciphersuites;
/// Module for generators
pub mod generators;
/// Module for keys
pub mod keys;
/// Module for proofs
pub mod proof;
/// Module for signatures
pub mod signature;
pub(crate) mod utils;
