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

use cidsuite::{
    cid::CidDocument,
    config::{DeriveOptions, SignOptions},
    credential::Credential,
    errors::Error,
    keys::family::KeyFamily,
    loader::{CachingDocumentLoader, InMemoryContextCache, StaticDocumentLoader},
    schemes::{algorithms::Ed25519, generics::SingleMessageScheme},
    suites::{
        bbs2023::envelope::{parse_disclosure_proof_value, serialize_disclosure_proof_value},
        eddsa::create_verify_data,
        Suite,
    },
    canonical::JsonCanonicalizer,
    hashing::Sha256Hasher,
    PrivateKeyStore,
};
use serde_json::{json, Value};

const ALICE: &str = "http://example.org/alice";
const BOB: &str = "http://example.org/bob";
const ALICE_ED25519: &str = "http://example.org/alice#key-1";
const ALICE_BBS: &str = "http://example.org/alice#key-2";

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn suite() -> Suite {
    Suite::default()
}

fn controller(id: &str) -> (CidDocument, PrivateKeyStore) {
    CidDocument::generate(id, &[KeyFamily::SingleMessage, KeyFamily::MultiMessage]).unwrap()
}

fn pointers(pointers: &[&str]) -> Vec<String> {
    pointers.iter().map(|p| p.to_string()).collect()
}

fn employee() -> Credential {
    Credential::new(json!({
        "@context": ["https://www.w3.org/ns/credentials/v2"],
        "type": ["VerifiableCredential", "EmployeeCredential"],
        "validFrom": "2025-01-01T00:00:00Z",
        "credentialSubject": {
            "name": "Bob",
            "age": 42,
            "address": {"city": "Turin", "street": "Via Pier Carlo Boggio"},
            "skills": [{"name": "rust"}, {"name": "cryptography"}]
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn alice_discloses_and_bob_cannot_claim_it() {
    init();
    let (alice, alice_keys) = controller(ALICE);
    let (bob, _) = controller(BOB);
    let suite = suite();

    let credential = Credential::new(json!({"claim": "x"})).unwrap();
    let signed = suite.sign(&alice, &alice_keys, &credential, ALICE_BBS, SignOptions::default()).await.unwrap();
    assert_eq!(signed.proof.as_ref().unwrap().cryptosuite, "bbs-2023");

    let derived = suite.derive(&signed, &pointers(&["/claim"]), DeriveOptions::default()).await.unwrap();
    assert_eq!(derived.claims["claim"], "x");

    assert!(suite.verify(&alice, &derived).await.unwrap());
    assert!(!suite.verify(&bob, &derived).await.unwrap());
}

#[tokio::test]
async fn ed25519_sign_then_verify() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();

    let signed = suite.sign(&alice, &keys, &employee(), ALICE_ED25519, SignOptions::default()).await.unwrap();
    assert_eq!(signed.proof.as_ref().unwrap().cryptosuite, "eddsa-rdfc-2022");
    assert!(suite.verify(&alice, &signed).await.unwrap());

    let mut tampered = signed.clone();
    tampered.claims["credentialSubject"]["age"] = json!(43);
    assert!(!suite.verify(&alice, &tampered).await.unwrap());

    let round_trip = Credential::from_json(&signed.to_json().unwrap()).unwrap();
    assert!(suite.verify(&alice, &round_trip).await.unwrap());
}

#[tokio::test]
async fn bbs_base_proof_verifies_before_derivation() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();

    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();
    assert!(signed.proof.as_ref().unwrap().proof_value.as_deref().unwrap().starts_with('u'));
    assert!(suite.verify(&alice, &signed).await.unwrap());

    let mut tampered = signed.clone();
    tampered.claims["credentialSubject"]["name"] = json!("Mallory");
    assert!(!suite.verify(&alice, &tampered).await.unwrap());
}

#[tokio::test]
async fn derived_credential_contains_only_requested_and_mandatory_claims() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();

    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();
    let derived = suite
        .derive(
            &signed,
            &pointers(&["/credentialSubject/name", "/credentialSubject/address/city"]),
            DeriveOptions::with_presentation_header(b"nonce-1234".to_vec()),
        )
        .await
        .unwrap();

    let subject = &derived.claims["credentialSubject"];
    assert_eq!(subject["name"], "Bob");
    assert_eq!(subject["address"]["city"], "Turin");
    assert!(subject.get("age").is_none());
    assert!(subject.get("skills").is_none());
    assert!(subject["address"].get("street").is_none());
    assert_eq!(derived.claims["issuer"]["id"], ALICE);
    assert_eq!(derived.claims["validFrom"], "2025-01-01T00:00:00Z");
    assert!(derived.claims["type"].is_array());

    let envelope = parse_disclosure_proof_value(derived.proof.as_ref().unwrap().proof_value.as_deref()).unwrap();
    assert_eq!(envelope.presentation_header, b"nonce-1234".to_vec());

    assert!(suite.verify(&alice, &derived).await.unwrap());

    let mut changed = derived.clone();
    changed.claims["credentialSubject"]["name"] = json!("Mallory");
    assert!(!suite.verify(&alice, &changed).await.unwrap());

    let mut extended = derived.clone();
    extended.claims["credentialSubject"]["age"] = json!(42);
    assert!(!suite.verify(&alice, &extended).await.unwrap());
}

#[tokio::test]
async fn array_members_and_empty_reveals_verify() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();

    let one_skill = suite
        .derive(&signed, &pointers(&["/credentialSubject/skills/0"]), DeriveOptions::default())
        .await
        .unwrap();
    assert_eq!(one_skill.claims["credentialSubject"]["skills"], json!([{"name": "rust"}]));
    assert!(suite.verify(&alice, &one_skill).await.unwrap());

    let mandatory_only = suite.derive(&signed, &[], DeriveOptions::default()).await.unwrap();
    assert!(mandatory_only.claims.get("credentialSubject").is_none());
    assert!(suite.verify(&alice, &mandatory_only).await.unwrap());
}

#[tokio::test]
async fn shared_blank_node_ids_survive_derivation() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let credential = Credential::new(json!({
        "credentialSubject": {"id": "_:s", "name": "Bob"},
        "evidence": {"id": "_:s", "age": 3}
    }))
    .unwrap();
    let signed = suite.sign(&alice, &keys, &credential, ALICE_BBS, SignOptions::default()).await.unwrap();
    assert!(suite.verify(&alice, &signed).await.unwrap());

    let both = suite
        .derive(&signed, &pointers(&["/credentialSubject/name", "/evidence/age"]), DeriveOptions::default())
        .await
        .unwrap();
    let subject_id = both.claims["credentialSubject"]["id"].as_str().unwrap();
    assert!(subject_id.starts_with("_:"));
    assert_eq!(both.claims["evidence"]["id"], subject_id);
    assert!(suite.verify(&alice, &both).await.unwrap());

    let one = suite
        .derive(&signed, &pointers(&["/credentialSubject/name"]), DeriveOptions::default())
        .await
        .unwrap();
    assert!(one.claims["credentialSubject"].get("id").is_none());
    assert!(suite.verify(&alice, &one).await.unwrap());
}

#[tokio::test]
async fn bit_flip_in_bbs_proof_is_rejected() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();
    let derived = suite
        .derive(&signed, &pointers(&["/credentialSubject/age"]), DeriveOptions::default())
        .await
        .unwrap();

    let proof = derived.proof.as_ref().unwrap();
    let mut envelope = parse_disclosure_proof_value(proof.proof_value.as_deref()).unwrap();
    for position in [0, envelope.bbs_proof.len() / 2, envelope.bbs_proof.len() - 1] {
        let mut flipped = envelope.clone();
        flipped.bbs_proof[position] ^= 0x01;
        let mut tampered = derived.clone();
        tampered.proof.as_mut().unwrap().proof_value = Some(serialize_disclosure_proof_value(&flipped).unwrap());
        assert!(!suite.verify(&alice, &tampered).await.unwrap(), "flip at {position} accepted");
    }

    envelope.presentation_header = b"other".to_vec();
    let mut rebound = derived.clone();
    rebound.proof.as_mut().unwrap().proof_value = Some(serialize_disclosure_proof_value(&envelope).unwrap());
    assert!(!suite.verify(&alice, &rebound).await.unwrap());
}

#[tokio::test]
async fn proof_value_encoding_is_strict() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();
    let derived = suite.derive(&signed, &[], DeriveOptions::default()).await.unwrap();
    let proof_value = derived.proof.as_ref().unwrap().proof_value.clone().unwrap();

    let mut no_prefix = derived.clone();
    no_prefix.proof.as_mut().unwrap().proof_value = Some(proof_value[1..].to_owned());
    assert!(matches!(suite.verify(&alice, &no_prefix).await, Err(Error::MalformedProof { .. })));

    let mut missing = derived.clone();
    missing.proof.as_mut().unwrap().proof_value = None;
    assert!(matches!(suite.verify(&alice, &missing).await, Err(Error::MalformedProof { .. })));
}

#[tokio::test]
async fn single_message_is_proof_hash_then_document_hash() {
    init();
    let (alice, keys) = controller(ALICE);
    let signed = suite().sign(&alice, &keys, &employee(), ALICE_ED25519, SignOptions::default()).await.unwrap();
    let proof = signed.proof.as_ref().unwrap();

    let data = create_verify_data(&JsonCanonicalizer, &Sha256Hasher::default(), &signed.document(), proof)
        .await
        .unwrap();
    let (_, signature) = multibase::decode(proof.proof_value.as_deref().unwrap()).unwrap();
    let public_key = cidsuite::cid::resolve(&alice, ALICE_ED25519, Default::default())
        .unwrap()
        .public_key()
        .unwrap();

    assert!(Ed25519.verify(&public_key, &data.message(), &signature).unwrap());
    let swapped = [data.document_hash.as_slice(), data.proof_hash.as_slice()].concat();
    assert!(!Ed25519.verify(&public_key, &swapped, &signature).unwrap());
}

#[tokio::test]
async fn key_ids_and_families_follow_request_order() {
    let (alice, keys) = controller(ALICE);
    let ids: Vec<&str> = alice.verification_method.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec![ALICE_ED25519, ALICE_BBS]);
    assert!(alice.verification_method[0].public_key_multibase.starts_with("z6Mk"));
    assert!(alice.verification_method[1].public_key_multibase.starts_with("zUC7"));
    assert_eq!(keys.len(), 2);
    for relationship in [&alice.authentication, &alice.assertion_method, &alice.capability_invocation, &alice.capability_delegation] {
        assert_eq!(relationship, &vec![ALICE_ED25519.to_owned(), ALICE_BBS.to_owned()]);
    }

    let parsed = CidDocument::from_json(&alice.to_json().unwrap()).unwrap();
    assert_eq!(parsed, alice);
}

#[tokio::test]
async fn foreign_or_missing_methods() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();

    let mut foreign = signed.clone();
    foreign.proof.as_mut().unwrap().verification_method = "http://example.org/bob#key-2".to_owned();
    assert!(!suite.verify(&alice, &foreign).await.unwrap());

    let mut absent = signed.clone();
    absent.proof.as_mut().unwrap().verification_method = "http://example.org/alice#key-3".to_owned();
    assert!(matches!(suite.verify(&alice, &absent).await, Err(Error::Resolution(_))));
}

#[tokio::test]
async fn offline_verification_of_preprocessed_data() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_BBS, SignOptions::default()).await.unwrap();
    let derived = suite
        .derive(&signed, &pointers(&["/credentialSubject/name"]), DeriveOptions::default())
        .await
        .unwrap();

    let export = suite.preprocess(&alice, &derived).await.unwrap();
    let json: Value = serde_json::to_value(&export).unwrap();
    assert_eq!(json["verificationMethod"]["id"], ALICE_BBS);
    assert!(json["bbsProof"].is_string());

    let restored = serde_json::from_value(json).unwrap();
    assert!(suite.verify_preprocessed(&restored).await.unwrap());

    let mut tampered = export.clone();
    tampered.non_mandatory = tampered.non_mandatory.iter().map(|s| s.replace("Bob", "Eve")).collect();
    assert!(!suite.verify_preprocessed(&tampered).await.unwrap());

    assert!(matches!(suite.preprocess(&alice, &signed).await, Err(Error::InvalidState(_))));
}

#[tokio::test]
async fn verification_through_a_caching_loader() {
    init();
    let (alice, keys) = controller(ALICE);
    let suite = suite();
    let signed = suite.sign(&alice, &keys, &employee(), ALICE_ED25519, SignOptions::default()).await.unwrap();

    let loader = CachingDocumentLoader::new(
        StaticDocumentLoader::default().with_cid(&alice).unwrap(),
        InMemoryContextCache::default(),
    );
    assert!(suite.verify_with_loader(&signed, &loader).await.unwrap());
    assert!(suite.verify_with_loader(&signed, &loader).await.unwrap());

    let empty = StaticDocumentLoader::default();
    assert!(matches!(suite.verify_with_loader(&signed, &empty).await, Err(Error::DocumentLoad { .. })));
}
