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

use bls12_381_plus::{G1Projective, Scalar};
use elliptic_curve::hash2curve::{ExpandMsg, Expander};
use group::Curve;
use rand::RngCore;

use super::{ciphersuites::BbsCiphersuite, generators::Generators, keys::BbsPublicKey};
use crate::errors::Error;

/// Integer to Octet Stream primitive, big-endian, `len` bytes.
pub(crate) fn i2osp(value: usize, len: usize) -> Vec<u8> {
    let bytes = (value as u64).to_be_bytes();
    if len >= bytes.len() {
        let mut out = vec![0u8; len - bytes.len()];
        out.extend_from_slice(&bytes);
        out
    } else {
        bytes[bytes.len() - len..].to_vec()
    }
}

/// `expand_message` of the ciphersuite, `CS::EXPAND_LEN` output bytes.
pub(crate) fn expand_message<CS: BbsCiphersuite>(msg: &[u8], dst: &[u8]) -> Result<[u8; 48], Error> {
    let mut uniform_bytes = [0u8; 48];
    CS::Expander::expand_message(&[msg], &[dst], CS::EXPAND_LEN)
        .map_err(|_| Error::HashToScalarError)?
        .fill_bytes(&mut uniform_bytes);
    Ok(uniform_bytes)
}

/// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-hash-to-scalar
///
/// `uniform_bytes = expand_message(msg_octets, dst, expand_len)`, reduced modulo r.
pub(crate) fn hash_to_scalar<CS: BbsCiphersuite>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error> {
    if dst.len() > 255 {
        return Err(Error::HashToScalarError);
    }
    let uniform_bytes = expand_message::<CS>(msg_octets, dst)?;
    Ok(Scalar::from_okm(&uniform_bytes))
}

/// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-messages-to-scalars
pub(crate) fn messages_to_scalars<CS: BbsCiphersuite>(messages: &[Vec<u8>]) -> Result<Vec<Scalar>, Error> {
    let dst = CS::map_msg_dst();
    messages.iter().map(|m| hash_to_scalar::<CS>(m, &dst)).collect()
}

/// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-domain-calculation
pub(crate) fn calculate_domain<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    generators: &Generators,
    header: &[u8],
) -> Result<Scalar, Error> {
    let h_points = generators.message_generators();

    // dom_octs = I2OSP(L, 8) || Q_1 || H_1 || ... || H_L || api_id
    let mut dom_octs: Vec<u8> = i2osp(h_points.len(), 8);
    dom_octs.extend_from_slice(&generators.q1().to_affine().to_compressed());
    h_points
        .iter()
        .for_each(|p| dom_octs.extend_from_slice(&p.to_affine().to_compressed()));
    dom_octs.extend_from_slice(CS::API_ID);

    // dom_input = PK || dom_octs || I2OSP(length(header), 8) || header
    let mut dom_input: Vec<u8> = pk.to_bytes().to_vec();
    dom_input.extend_from_slice(&dom_octs);
    dom_input.extend_from_slice(&i2osp(header.len(), 8));
    dom_input.extend_from_slice(header);

    hash_to_scalar::<CS>(&dom_input, &CS::h2s_dst())
}

pub(crate) fn serialize_scalars(scalars: &[Scalar]) -> Vec<u8> {
    scalars.iter().flat_map(|s| s.to_bytes_be()).collect()
}

pub(crate) fn calculate_random_scalars(count: usize) -> Vec<Scalar> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut buf = [0u8; 48];
            rng.fill_bytes(&mut buf);
            Scalar::from_okm(&buf)
        })
        .collect()
}

pub(crate) fn get_remaining_indexes(length: usize, indexes: &[usize]) -> Vec<usize> {
    (0..length).filter(|i| !indexes.contains(i)).collect()
}

pub(crate) fn compress_g1(p: &G1Projective) -> [u8; 48] {
    p.to_affine().to_compressed()
}

pub trait ScalarExt: Sized {
    fn to_bytes_be(&self) -> [u8; 32];
    /// `None` when the encoding is not a canonical scalar (`>= r`).
    fn from_bytes_be(bytes: &[u8; 32]) -> Option<Self>;
}

impl ScalarExt for Scalar {
    fn to_bytes_be(&self) -> [u8; 32] {
        self.to_be_bytes()
    }

    fn from_bytes_be(bytes: &[u8; 32]) -> Option<Self> {
        Option::from(Scalar::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i2osp_pads_big_endian() {
        assert_eq!(i2osp(1, 8), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(i2osp(0x0102, 2), vec![1, 2]);
        assert_eq!(i2osp(0x0102, 1), vec![2]);
    }

    #[test]
    fn remaining_indexes_skip_disclosed() {
        assert_eq!(get_remaining_indexes(5, &[0, 3]), vec![1, 2, 4]);
        assert!(get_remaining_indexes(0, &[]).is_empty());
    }

    #[test]
    fn scalar_rejects_non_canonical_encoding() {
        assert!(Scalar::from_bytes_be(&[0xff; 32]).is_none());
        let one = Scalar::from(1u64);
        assert_eq!(Scalar::from_bytes_be(&one.to_bytes_be()), Some(one));
    }
}
