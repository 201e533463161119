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

use digest::HashMarker;
use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd};
use sha2::Sha256;

/// Ciphersuite parameters of the BBS scheme.
///
/// Only the BLS12-381-SHA-256 suite is used by the `bbs-2023` cryptosuite, the trait
/// keeps every domain separation tag in one place.
pub trait BbsCiphersuite: 'static {
    const ID: &'static [u8];
    const API_ID: &'static [u8];
    /// Output length of `expand_message` for BLS12-381 (`ceil((ceil(log2(r)) + k) / 8)`).
    const EXPAND_LEN: usize = 48;
    /// Minimum length of the key material accepted by `KeyGen`.
    const IKM_LEN: usize = 32;
    type HashAlg: HashMarker;
    type Expander: for<'a> ExpandMsg<'a>;

    fn keygen_dst() -> Vec<u8> {
        [Self::ID, b"KEYGEN_DST_"].concat()
    }

    fn h2s_dst() -> Vec<u8> {
        [Self::API_ID, b"H2S_"].concat()
    }

    fn map_msg_dst() -> Vec<u8> {
        [Self::API_ID, b"MAP_MSG_TO_SCALAR_AS_HASH_"].concat()
    }

    fn generator_seed() -> Vec<u8> {
        [Self::API_ID, b"MESSAGE_GENERATOR_SEED"].concat()
    }

    fn bp_generator_seed() -> Vec<u8> {
        [Self::API_ID, b"BP_MESSAGE_GENERATOR_SEED"].concat()
    }

    fn generator_seed_dst() -> Vec<u8> {
        [Self::API_ID, b"SIG_GENERATOR_SEED_"].concat()
    }

    fn generator_dst() -> Vec<u8> {
        [Self::API_ID, b"SIG_GENERATOR_DST_"].concat()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bls12381Sha256 {}

impl BbsCiphersuite for Bls12381Sha256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_";
    const API_ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2G_HM2S_";
    type HashAlg = Sha256;
    type Expander = ExpandMsgXmd<Self::HashAlg>;
}
