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

use bls12_381_plus::{multi_miller_loop, G1Affine, G1Projective, G2Prepared, G2Projective, Gt, Scalar};
use elliptic_curve::group::Curve;

use super::{
    ciphersuites::BbsCiphersuite,
    generators::Generators,
    keys::{BbsPublicKey, BbsSecretKey},
    utils::{calculate_domain, hash_to_scalar, messages_to_scalars, serialize_scalars, ScalarExt},
};
use crate::errors::Error;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BbsSignature {
    pub a: G1Projective,
    pub e: Scalar,
}

impl BbsSignature {
    pub const LENGTH: usize = 80;

    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[0..48].copy_from_slice(&self.a.to_affine().to_compressed());
        bytes[48..80].copy_from_slice(&self.e.to_bytes_be());
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::LENGTH {
            return Err(Error::DeserializationError(format!(
                "BBS signature must be {} bytes, got {}",
                Self::LENGTH,
                data.len()
            )));
        }
        let mut a_bytes = [0u8; 48];
        a_bytes.copy_from_slice(&data[0..48]);
        let mut e_bytes = [0u8; 32];
        e_bytes.copy_from_slice(&data[48..80]);

        let a = Option::<G1Affine>::from(G1Affine::from_compressed(&a_bytes))
            .ok_or_else(|| Error::DeserializationError("invalid point A".to_owned()))?;
        let e = Scalar::from_bytes_be(&e_bytes).ok_or_else(|| Error::DeserializationError("invalid scalar e".to_owned()))?;

        Ok(Self { a: G1Projective::from(a), e })
    }

    /// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-signature-generation-sign
    pub fn sign<CS: BbsCiphersuite>(
        messages: &[Vec<u8>],
        sk: &BbsSecretKey,
        pk: &BbsPublicKey,
        header: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let message_scalars = messages_to_scalars::<CS>(messages)?;
        let generators = Generators::create::<CS>(messages.len() + 1)?;
        core_sign::<CS>(sk, pk, &generators, header.unwrap_or(&[]), &message_scalars)
    }

    /// Returns `Ok(false)` on a pairing mismatch, `Err` only when the inputs cannot be processed.
    pub fn verify<CS: BbsCiphersuite>(
        &self,
        pk: &BbsPublicKey,
        messages: &[Vec<u8>],
        header: Option<&[u8]>,
    ) -> Result<bool, Error> {
        let message_scalars = messages_to_scalars::<CS>(messages)?;
        let generators = Generators::create::<CS>(messages.len() + 1)?;
        core_verify::<CS>(pk, self, &message_scalars, &generators, header.unwrap_or(&[]))
    }
}

fn core_sign<CS: BbsCiphersuite>(
    sk: &BbsSecretKey,
    pk: &BbsPublicKey,
    generators: &Generators,
    header: &[u8],
    messages: &[Scalar],
) -> Result<BbsSignature, Error> {
    let L = messages.len();
    if generators.values.len() != L + 1 {
        return Err(Error::NotEnoughGenerators);
    }

    let Q1 = generators.q1();
    let H_points = generators.message_generators();

    let domain = calculate_domain::<CS>(pk, generators, header)?;

    // e = hash_to_scalar(serialize((SK, domain, msg_1, ..., msg_L)), signature_dst)
    let mut input: Vec<Scalar> = Vec::with_capacity(L + 2);
    input.push(sk.0);
    input.push(domain);
    input.extend_from_slice(messages);
    let e = hash_to_scalar::<CS>(&serialize_scalars(&input), &CS::h2s_dst())?;

    // B = P1 + Q_1 * domain + H_1 * msg_1 + ... + H_L * msg_L
    let mut B = generators.g1_base_point + Q1 * domain;
    for (H_i, msg) in H_points.iter().zip(messages) {
        B += H_i * msg;
    }

    // A = B * (1 / (SK + e))
    let inv = Option::<Scalar>::from((sk.0 + e).invert())
        .ok_or_else(|| Error::SignatureGenerationError("SK + e == 0".to_owned()))?;
    let A = B * inv;

    if A == G1Projective::IDENTITY {
        return Err(Error::G1IdentityError);
    }

    Ok(BbsSignature { a: A, e })
}

fn core_verify<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    signature: &BbsSignature,
    messages: &[Scalar],
    generators: &Generators,
    header: &[u8],
) -> Result<bool, Error> {
    let L = messages.len();
    if generators.values.len() != L + 1 {
        return Err(Error::NotEnoughGenerators);
    }

    let Q1 = generators.q1();
    let H_points = generators.message_generators();

    let domain = calculate_domain::<CS>(pk, generators, header)?;

    let mut B = generators.g1_base_point + Q1 * domain;
    for (H_i, msg) in H_points.iter().zip(messages) {
        B += H_i * msg;
    }

    // h(A, W + BP2 * e) * h(B, -BP2) == Identity_GT
    let BP2 = G2Projective::GENERATOR;
    let A2 = pk.0 + BP2 * signature.e;

    let term1 = (&signature.a.to_affine(), &G2Prepared::from(A2.to_affine()));
    let term2 = (&B.to_affine(), &G2Prepared::from(-BP2.to_affine()));

    let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

    Ok(pairing == Gt::IDENTITY)
}
