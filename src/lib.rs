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

#![allow(non_snake_case)]

pub mod bbsplus;
pub mod canonical;
pub mod cid;
pub mod config;
pub mod credential;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod loader;
pub mod pointer;
pub mod schemes;
pub mod suites;

pub use cid::{CidDocument, PrivateKeyStore};
pub use config::{ClassificationPolicy, DeriveOptions, SignOptions, SuiteConfig};
pub use credential::{Credential, Proof};
pub use errors::{Error, Result};
pub use keys::family::KeyFamily;
pub use suites::Suite;
