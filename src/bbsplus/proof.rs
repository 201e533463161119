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
    keys::BbsPublicKey,
    signature::BbsSignature,
    utils::{
        calculate_domain, calculate_random_scalars, compress_g1, get_remaining_indexes, hash_to_scalar, i2osp,
        messages_to_scalars, ScalarExt,
    },
};
use crate::errors::Error;

/// Proof of knowledge of a BBS signature over a subset of disclosed messages.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BbsProof {
    Abar: G1Projective,
    Bbar: G1Projective,
    D: G1Projective,
    e_cap: Scalar,
    r1_cap: Scalar,
    r3_cap: Scalar,
    m_cap: Vec<Scalar>,
    challenge: Scalar,
}

const POINT_LEN: usize = 48;
const SCALAR_LEN: usize = 32;
const FIXED_LEN: usize = 3 * POINT_LEN + 4 * SCALAR_LEN;

impl BbsProof {
    /// Number of undisclosed messages the proof hides.
    pub fn undisclosed_count(&self) -> usize {
        self.m_cap.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(FIXED_LEN + self.m_cap.len() * SCALAR_LEN);

        bytes.extend_from_slice(&compress_g1(&self.Abar));
        bytes.extend_from_slice(&compress_g1(&self.Bbar));
        bytes.extend_from_slice(&compress_g1(&self.D));
        bytes.extend_from_slice(&self.e_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r1_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r3_cap.to_bytes_be());
        self.m_cap.iter().for_each(|v| bytes.extend_from_slice(&v.to_bytes_be()));
        bytes.extend_from_slice(&self.challenge.to_bytes_be());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < FIXED_LEN || (bytes.len() - FIXED_LEN) % SCALAR_LEN != 0 {
            return Err(Error::DeserializationError(format!("invalid BBS proof length {}", bytes.len())));
        }

        let parse_g1 = |slice: &[u8]| -> Result<G1Projective, Error> {
            let mut buf = [0u8; POINT_LEN];
            buf.copy_from_slice(slice);
            Option::<G1Affine>::from(G1Affine::from_compressed(&buf))
                .map(G1Projective::from)
                .ok_or_else(|| Error::DeserializationError("invalid G1 point in proof".to_owned()))
        };
        let parse_scalar = |slice: &[u8]| -> Result<Scalar, Error> {
            let mut buf = [0u8; SCALAR_LEN];
            buf.copy_from_slice(slice);
            Scalar::from_bytes_be(&buf).ok_or_else(|| Error::DeserializationError("invalid scalar in proof".to_owned()))
        };

        let Abar = parse_g1(&bytes[0..48])?;
        let Bbar = parse_g1(&bytes[48..96])?;
        let D = parse_g1(&bytes[96..144])?;

        let e_cap = parse_scalar(&bytes[144..176])?;
        let r1_cap = parse_scalar(&bytes[176..208])?;
        let r3_cap = parse_scalar(&bytes[208..240])?;

        let mut m_cap = bytes[240..]
            .chunks_exact(SCALAR_LEN)
            .map(parse_scalar)
            .collect::<Result<Vec<Scalar>, Error>>()?;

        // the challenge is always present, even when every message is disclosed
        let challenge = m_cap
            .pop()
            .ok_or_else(|| Error::DeserializationError("missing challenge".to_owned()))?;

        Ok(Self { Abar, Bbar, D, e_cap, r1_cap, r3_cap, m_cap, challenge })
    }

    /// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-proof-generation-proofgen
    ///
    /// `disclosed_indexes` are zero-based positions in `messages`, sorted and deduplicated here.
    pub fn proof_gen<CS: BbsCiphersuite>(
        signature: &BbsSignature,
        pk: &BbsPublicKey,
        messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
        header: Option<&[u8]>,
        ph: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let message_scalars = messages_to_scalars::<CS>(messages)?;
        let generators = Generators::create::<CS>(messages.len() + 1)?;

        core_proof_gen::<CS>(
            pk,
            signature,
            &generators,
            &message_scalars,
            disclosed_indexes,
            header.unwrap_or(&[]),
            ph.unwrap_or(&[]),
        )
    }

    /// Verifies the proof against the disclosed messages in index order.
    ///
    /// Out of range or unsorted indexes and a count mismatch yield `Ok(false)`.
    pub fn proof_verify<CS: BbsCiphersuite>(
        &self,
        pk: &BbsPublicKey,
        disclosed_messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
        header: Option<&[u8]>,
        ph: Option<&[u8]>,
    ) -> Result<bool, Error> {
        if disclosed_messages.len() != disclosed_indexes.len() {
            return Ok(false);
        }
        if disclosed_indexes.windows(2).any(|w| w[0] >= w[1]) {
            return Ok(false);
        }

        let U = self.m_cap.len();
        let R = disclosed_indexes.len();
        let L = U + R;
        if disclosed_indexes.iter().any(|&i| i >= L) {
            return Ok(false);
        }

        let disclosed_scalars = messages_to_scalars::<CS>(disclosed_messages)?;
        let generators = Generators::create::<CS>(L + 1)?;

        core_proof_verify::<CS>(
            pk,
            self,
            &generators,
            header.unwrap_or(&[]),
            ph.unwrap_or(&[]),
            &disclosed_scalars,
            disclosed_indexes,
        )
    }
}

struct ProofInitResult {
    Abar: G1Projective,
    Bbar: G1Projective,
    D: G1Projective,
    T1: G1Projective,
    T2: G1Projective,
    domain: Scalar,
}

fn core_proof_gen<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    signature: &BbsSignature,
    generators: &Generators,
    messages: &[Scalar],
    disclosed_indexes: &[usize],
    header: &[u8],
    ph: &[u8],
) -> Result<BbsProof, Error> {
    let L = messages.len();
    let mut disclosed_indexes = disclosed_indexes.to_vec();
    disclosed_indexes.sort_unstable();
    disclosed_indexes.dedup();

    let R = disclosed_indexes.len();
    if R > L {
        return Err(Error::ProofGenError("R > L".to_owned()));
    }
    let U = L - R;

    if let Some(invalid_index) = disclosed_indexes.iter().find(|&&i| i >= L) {
        return Err(Error::ProofGenError(format!("Invalid disclosed index: {}", invalid_index)));
    }

    let undisclosed_indexes = get_remaining_indexes(L, &disclosed_indexes);
    let disclosed_messages: Vec<Scalar> = disclosed_indexes.iter().map(|&i| messages[i]).collect();
    let undisclosed_messages: Vec<Scalar> = undisclosed_indexes.iter().map(|&i| messages[i]).collect();

    let random_scalars = calculate_random_scalars(5 + U);

    let init_res = proof_init::<CS>(pk, signature, generators, &random_scalars, header, messages, &undisclosed_indexes)?;
    let challenge = proof_challenge_calculate::<CS>(&init_res, &disclosed_indexes, &disclosed_messages, ph)?;

    proof_finalize(&init_res, challenge, signature.e, &random_scalars, &undisclosed_messages)
}

fn proof_init<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    signature: &BbsSignature,
    generators: &Generators,
    random_scalars: &[Scalar],
    header: &[u8],
    messages: &[Scalar],
    undisclosed_indexes: &[usize],
) -> Result<ProofInitResult, Error> {
    let U = undisclosed_indexes.len();
    if random_scalars.len() != 5 + U {
        return Err(Error::ProofGenError("Random scalars not valid".to_owned()));
    }

    let H_points = generators.message_generators();
    if H_points.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    let domain = calculate_domain::<CS>(pk, generators, header)?;

    let mut B = generators.g1_base_point + generators.q1() * domain;
    for (H_i, msg) in H_points.iter().zip(messages) {
        B += H_i * msg;
    }

    let r1 = random_scalars[0];
    let r2 = random_scalars[1];
    let e_tilde = random_scalars[2];
    let r1_tilde = random_scalars[3];
    let r3_tilde = random_scalars[4];
    let m_tilde = &random_scalars[5..];

    let D = B * r2;
    let Abar = signature.a * (r1 * r2);
    let Bbar = D * r1 - Abar * signature.e;

    let T1 = Abar * e_tilde + D * r1_tilde;
    let mut T2 = D * r3_tilde;
    for (&j, m) in undisclosed_indexes.iter().zip(m_tilde) {
        T2 += H_points[j] * m;
    }

    Ok(ProofInitResult { Abar, Bbar, D, T1, T2, domain })
}

fn proof_challenge_calculate<CS: BbsCiphersuite>(
    init_res: &ProofInitResult,
    disclosed_indexes: &[usize],
    disclosed_messages: &[Scalar],
    ph: &[u8],
) -> Result<Scalar, Error> {
    let R = disclosed_indexes.len();
    if disclosed_messages.len() != R {
        return Err(Error::ProofGenError(
            "Number of disclosed indexes different from number of disclosed messages".to_owned(),
        ));
    }

    let mut c_arr: Vec<u8> = Vec::new();
    c_arr.extend_from_slice(&compress_g1(&init_res.Abar));
    c_arr.extend_from_slice(&compress_g1(&init_res.Bbar));
    c_arr.extend_from_slice(&compress_g1(&init_res.D));
    c_arr.extend_from_slice(&compress_g1(&init_res.T1));
    c_arr.extend_from_slice(&compress_g1(&init_res.T2));
    c_arr.extend_from_slice(&i2osp(R, 8));
    disclosed_indexes.iter().for_each(|&i| c_arr.extend_from_slice(&i2osp(i, 8)));
    disclosed_messages.iter().for_each(|m| c_arr.extend_from_slice(&m.to_bytes_be()));
    c_arr.extend_from_slice(&init_res.domain.to_bytes_be());
    c_arr.extend_from_slice(&i2osp(ph.len(), 8));
    c_arr.extend_from_slice(ph);

    hash_to_scalar::<CS>(&c_arr, &CS::h2s_dst())
}

fn proof_finalize(
    init_res: &ProofInitResult,
    challenge: Scalar,
    e: Scalar,
    random_scalars: &[Scalar],
    undisclosed_messages: &[Scalar],
) -> Result<BbsProof, Error> {
    let r1 = random_scalars[0];
    let r2 = random_scalars[1];
    let e_tilde = random_scalars[2];
    let r1_tilde = random_scalars[3];
    let r3_tilde = random_scalars[4];
    let m_tilde = &random_scalars[5..];

    let r3 = Option::<Scalar>::from(r2.invert()).ok_or_else(|| Error::ProofGenError("Invert scalar failed".to_owned()))?;

    let e_cap = e_tilde + e * challenge;
    let r1_cap = r1_tilde - r1 * challenge;
    let r3_cap = r3_tilde - r3 * challenge;
    let m_cap: Vec<Scalar> = m_tilde
        .iter()
        .zip(undisclosed_messages)
        .map(|(m_t, m)| m_t + m * challenge)
        .collect();

    Ok(BbsProof {
        Abar: init_res.Abar,
        Bbar: init_res.Bbar,
        D: init_res.D,
        e_cap,
        r1_cap,
        r3_cap,
        m_cap,
        challenge,
    })
}

fn core_proof_verify<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    proof: &BbsProof,
    generators: &Generators,
    header: &[u8],
    ph: &[u8],
    disclosed_messages: &[Scalar],
    disclosed_indexes: &[usize],
) -> Result<bool, Error> {
    let init_res = proof_verify_init::<CS>(pk, proof, generators, header, disclosed_messages, disclosed_indexes)?;
    let challenge = proof_challenge_calculate::<CS>(&init_res, disclosed_indexes, disclosed_messages, ph)?;

    if proof.challenge != challenge {
        log::debug!("BBS proof challenge mismatch");
        return Ok(false);
    }

    // h(Abar, W) * h(Bbar, -BP2) == Identity_GT
    let BP2 = G2Projective::GENERATOR;
    let term1 = (&proof.Abar.to_affine(), &G2Prepared::from(pk.0.to_affine()));
    let term2 = (&proof.Bbar.to_affine(), &G2Prepared::from(-BP2.to_affine()));

    let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

    Ok(pairing == Gt::IDENTITY)
}

fn proof_verify_init<CS: BbsCiphersuite>(
    pk: &BbsPublicKey,
    proof: &BbsProof,
    generators: &Generators,
    header: &[u8],
    disclosed_messages: &[Scalar],
    disclosed_indexes: &[usize],
) -> Result<ProofInitResult, Error> {
    let L = proof.m_cap.len() + disclosed_indexes.len();
    let H_points = generators.message_generators();
    if H_points.len() != L {
        return Err(Error::NotEnoughGenerators);
    }

    let undisclosed_indexes = get_remaining_indexes(L, disclosed_indexes);
    let domain = calculate_domain::<CS>(pk, generators, header)?;

    let T1 = proof.Bbar * proof.challenge + proof.Abar * proof.e_cap + proof.D * proof.r1_cap;

    let mut Bv = generators.g1_base_point + generators.q1() * domain;
    for (&i, msg) in disclosed_indexes.iter().zip(disclosed_messages) {
        Bv += H_points[i] * msg;
    }

    let mut T2 = Bv * proof.challenge + proof.D * proof.r3_cap;
    for (&j, m) in undisclosed_indexes.iter().zip(&proof.m_cap) {
        T2 += H_points[j] * m;
    }

    Ok(ProofInitResult { Abar: proof.Abar, Bbar: proof.Bbar, D: proof.D, T1, T2, domain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::{
        ciphersuites::Bls12381Sha256,
        keys::{BbsKeyPair, BbsSecretKey},
    };

    const FIXTURE_SK: &str = "60e55110f76883a13d030b2f6bd11883422d5abde717569fc0731f51237169fc";
    const FIXTURE_PK: &str = "a820f230f6ae38503b86c70dc50b61c58a77e45c39ab25c0652bbaa8fa136f2851bd4781c9dcde39fc9d1d52c9e60268061e7d7632171d91aa8d460acee0e96f1e7c4cfb12d3ff9ab5d5dc91c277db75c845d649ef3c4f63aebc364cd55ded0c";

    fn setup() -> (BbsKeyPair, Vec<Vec<u8>>, BbsSignature) {
        let keypair = BbsKeyPair::random::<Bls12381Sha256>().unwrap();
        let messages: Vec<Vec<u8>> = (0..5).map(|i| format!("message {i}").into_bytes()).collect();
        let signature = BbsSignature::sign::<Bls12381Sha256>(
            &messages,
            keypair.private_key(),
            keypair.public_key(),
            Some(b"header"),
        )
        .unwrap();
        (keypair, messages, signature)
    }

    #[test]
    fn proof_verifies_under_fixture_public_key() {
        let sk = BbsSecretKey::from_bytes(&hex::decode(FIXTURE_SK).unwrap()).unwrap();
        let pk = BbsPublicKey::from_bytes(&hex::decode(FIXTURE_PK).unwrap()).unwrap();
        let header = hex::decode("11223344556677889900aabbccddeeff").unwrap();
        let ph = hex::decode("bed231d880675ed101ead304512e043ade9958dd0241ea70b4b3957fba941501").unwrap();
        let messages: Vec<Vec<u8>> = (0..4).map(|i| format!("claim {i}").into_bytes()).collect();
        let signature = BbsSignature::sign::<Bls12381Sha256>(&messages, &sk, &pk, Some(&header)).unwrap();

        let disclosed = [0usize, 3];
        let proof =
            BbsProof::proof_gen::<Bls12381Sha256>(&signature, &pk, &messages, &disclosed, Some(&header), Some(&ph))
                .unwrap();
        let decoded = BbsProof::from_bytes(&proof.to_bytes()).unwrap();
        let revealed = vec![messages[0].clone(), messages[3].clone()];
        assert!(decoded
            .proof_verify::<Bls12381Sha256>(&pk, &revealed, &disclosed, Some(&header), Some(&ph))
            .unwrap());
        assert!(!decoded
            .proof_verify::<Bls12381Sha256>(&pk, &revealed, &disclosed, Some(&header[..15]), Some(&ph))
            .unwrap());
    }

    #[test]
    fn proof_gen_then_verify() {
        let (keypair, messages, signature) = setup();
        let disclosed = [0usize, 2, 4];
        let proof = BbsProof::proof_gen::<Bls12381Sha256>(
            &signature,
            keypair.public_key(),
            &messages,
            &disclosed,
            Some(b"header"),
            Some(b"nonce"),
        )
        .unwrap();
        assert_eq!(proof.undisclosed_count(), 2);

        let revealed: Vec<Vec<u8>> = disclosed.iter().map(|&i| messages[i].clone()).collect();
        let ok = proof
            .proof_verify::<Bls12381Sha256>(keypair.public_key(), &revealed, &disclosed, Some(b"header"), Some(b"nonce"))
            .unwrap();
        assert!(ok);

        let wrong_ph = proof
            .proof_verify::<Bls12381Sha256>(keypair.public_key(), &revealed, &disclosed, Some(b"header"), Some(b"other"))
            .unwrap();
        assert!(!wrong_ph);
    }

    #[test]
    fn proof_rejects_altered_message() {
        let (keypair, messages, signature) = setup();
        let disclosed = [1usize];
        let proof = BbsProof::proof_gen::<Bls12381Sha256>(
            &signature,
            keypair.public_key(),
            &messages,
            &disclosed,
            Some(b"header"),
            None,
        )
        .unwrap();
        let ok = proof
            .proof_verify::<Bls12381Sha256>(keypair.public_key(), &[b"forged".to_vec()], &disclosed, Some(b"header"), None)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn proof_bytes_round_trip() {
        let (keypair, messages, signature) = setup();
        let proof =
            BbsProof::proof_gen::<Bls12381Sha256>(&signature, keypair.public_key(), &messages, &[], Some(b"header"), None)
                .unwrap();
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), FIXED_LEN + 5 * SCALAR_LEN);
        assert_eq!(BbsProof::from_bytes(&bytes).unwrap(), proof);
        assert!(BbsProof::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn proof_gen_rejects_out_of_range_index() {
        let (keypair, messages, signature) = setup();
        let err = BbsProof::proof_gen::<Bls12381Sha256>(&signature, keypair.public_key(), &messages, &[5], None, None)
            .unwrap_err();
        assert!(matches!(err, Error::ProofGenError(_)));
    }
}
