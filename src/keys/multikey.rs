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

//! [Multikey](https://www.w3.org/TR/cid-1.0/#Multikey) encodings: `z` + base58btc(multicodec header || key bytes).

use multibase::Base;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multicodec {
    Bls12381G2Pub,
    Ed25519Pub,
    Bls12381G2Priv,
    Ed25519Priv,
}

impl Multicodec {
    pub const fn header(self) -> [u8; 2] {
        match self {
            Self::Bls12381G2Pub => [0xeb, 0x01],
            Self::Ed25519Pub => [0xed, 0x01],
            Self::Bls12381G2Priv => [0x8a, 0x26],
            Self::Ed25519Priv => [0x80, 0x26],
        }
    }

    pub const fn key_len(self) -> usize {
        match self {
            Self::Bls12381G2Pub => 96,
            Self::Ed25519Pub => 32,
            Self::Bls12381G2Priv => 32,
            Self::Ed25519Priv => 32,
        }
    }
}

pub fn encode(codec: Multicodec, key: &[u8]) -> Result<String> {
    if key.len() != codec.key_len() {
        return Err(Error::KeyEncoding(format!(
            "{codec:?} keys are {} bytes, got {}",
            codec.key_len(),
            key.len()
        )));
    }
    let data = [&codec.header()[..], key].concat();
    Ok(multibase::encode(Base::Base58Btc, data))
}

pub fn decode(codec: Multicodec, encoded: &str) -> Result<Vec<u8>> {
    let (base, data) =
        multibase::decode(encoded).map_err(|e| Error::KeyEncoding(format!("invalid multibase value: {e}")))?;
    if base != Base::Base58Btc {
        return Err(Error::KeyEncoding(format!("expected base58btc multibase, got {base:?}")));
    }
    let key = data
        .strip_prefix(&codec.header()[..])
        .ok_or_else(|| Error::KeyEncoding(format!("missing {codec:?} multicodec header")))?;
    if key.len() != codec.key_len() {
        return Err(Error::KeyEncoding(format!(
            "{codec:?} keys are {} bytes, got {}",
            codec.key_len(),
            key.len()
        )));
    }
    Ok(key.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_prefixes() {
        let bls = encode(Multicodec::Bls12381G2Pub, &[7u8; 96]).unwrap();
        let ed = encode(Multicodec::Ed25519Pub, &[7u8; 32]).unwrap();
        assert!(bls.starts_with("zUC7"), "{bls}");
        assert!(ed.starts_with("z6Mk"), "{ed}");
    }

    #[test]
    fn decode_checks_header_and_length() {
        let ed = encode(Multicodec::Ed25519Pub, &[1u8; 32]).unwrap();
        assert_eq!(decode(Multicodec::Ed25519Pub, &ed).unwrap(), vec![1u8; 32]);
        assert!(matches!(decode(Multicodec::Bls12381G2Pub, &ed), Err(Error::KeyEncoding(_))));
        assert!(encode(Multicodec::Ed25519Priv, &[0u8; 31]).is_err());
        assert!(decode(Multicodec::Ed25519Pub, "not-multibase").is_err());
    }
}
