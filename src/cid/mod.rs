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

/// CID documents and verification methods
pub mod document;
/// Verification method resolution
pub mod resolver;
/// Secret keys paired with a CID document
pub mod store;

pub use document::{CidDocument, VerificationMethod};
pub use resolver::{resolve, ResolvedMethod};
pub use store::PrivateKeyStore;
