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

use bls12_381_plus::{G2Affine, G2Projective, Scalar};
use elliptic_curve::group::Curve;
use ff::Field;

use super::{
    ciphersuites::BbsCiphersuite,
    utils::{hash_to_scalar, i2osp},
};
use crate::errors::Error;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BbsPublicKey(pub G2Projective);

impl BbsPublicKey {
    pub const LENGTH: usize = G2Affine::COMPRESSED_BYTES;

    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        self.0.to_affine().to_compressed()
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; Self::LENGTH] = bytes.try_into().map_err(|_| Error::KeyDeserializationError)?;
        let g2 = Option::<G2Affine>::from(G2Affine::from_compressed(&bytes)).ok_or(Error::KeyDeserializationError)?;
        if bool::from(g2.is_identity()) {
            return Err(Error::KeyDeserializationError);
        }
        Ok(Self(G2Projective::from(g2)))
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BbsSecretKey(pub Scalar);

impl BbsSecretKey {
    pub const LENGTH: usize = Scalar::BYTES;

    /// Big-endian encoding.
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        self.0.to_be_bytes()
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; Self::LENGTH] = bytes.try_into().map_err(|_| Error::KeyDeserializationError)?;
        let s = Option::<Scalar>::from(Scalar::from_be_bytes(&bytes)).ok_or(Error::KeyDeserializationError)?;
        if bool::from(s.is_zero()) {
            return Err(Error::KeyDeserializationError);
        }
        Ok(Self(s))
    }

    pub fn public_key(&self) -> BbsPublicKey {
        BbsPublicKey(sk_to_pk(self.0))
    }
}

/// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-secret-key -> SK = KeyGen(key_material, key_info, key_dst)
///
/// # Description
/// This operation generates a secret key (SK) deterministically from a secret octet string (key_material)
///
/// # Inputs:
/// * `key_material` (REQUIRED), a secret octet string of at least 32 bytes.
/// * `key_info` (OPTIONAL), an octet string. Defaults to an empty string if
/// not supplied.
/// * `key_dst` (OPTIONAL), an octet string representing the domain separation
/// tag. Defaults to the octet string
/// ciphersuite_id || "KEYGEN_DST_" if not supplied.
///
pub(crate) fn key_gen<CS: BbsCiphersuite>(
    key_material: &[u8],
    key_info: Option<&[u8]>,
    key_dst: Option<&[u8]>,
) -> Result<Scalar, Error> {
    if key_material.len() < CS::IKM_LEN {
        return Err(Error::KeyGenError("length(key_material) < 32".to_owned()));
    }

    let key_info = key_info.unwrap_or(&[]);
    if key_info.len() > 65535 {
        return Err(Error::KeyGenError("length(key_info) > 65535".to_owned()));
    }

    let key_dst_default = CS::keygen_dst();
    let key_dst = key_dst.unwrap_or(&key_dst_default);

    // derive_input = key_material || I2OSP(length(key_info), 2) || key_info
    let derive_input = [key_material, &i2osp(key_info.len(), 2), key_info].concat();

    // SK = hash_to_scalar(derive_input, key_dst)
    let sk = hash_to_scalar::<CS>(&derive_input, key_dst)?;
    if bool::from(sk.is_zero()) {
        return Err(Error::KeyGenError("SK == 0".to_owned()));
    }
    Ok(sk)
}

/// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-public-key -> PK = SkToPk(SK)
pub(crate) fn sk_to_pk(sk: Scalar) -> G2Projective {
    // W = SK * BP2
    G2Projective::GENERATOR * sk
}

/// A BBS key pair over BLS12-381.
#[derive(Clone, Debug)]
pub struct BbsKeyPair {
    public: BbsPublicKey,
    private: BbsSecretKey,
}

impl BbsKeyPair {
    pub fn generate<CS: BbsCiphersuite>(
        key_material: &[u8],
        key_info: Option<&[u8]>,
        key_dst: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let sk = key_gen::<CS>(key_material, key_info, key_dst)?;
        let pk = sk_to_pk(sk);
        Ok(Self { public: BbsPublicKey(pk), private: BbsSecretKey(sk) })
    }

    /// Generates a key pair from fresh OS randomness.
    pub fn random<CS: BbsCiphersuite>() -> Result<Self, Error> {
        let mut key_material = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut key_material);
        Self::generate::<CS>(&key_material, None, None)
    }

    pub fn from_secret(private: BbsSecretKey) -> Self {
        Self { public: private.public_key(), private }
    }

    pub fn public_key(&self) -> &BbsPublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &BbsSecretKey {
        &self.private
    }
}
