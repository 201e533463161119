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
    errors::Error, CidDocument, Credential, DeriveOptions, KeyFamily, SignOptions, Suite, SuiteConfig,
};
use serde_json::json;

async fn selective_disclosure_main() -> Result<(), Error> {
    let suite = Suite::with_config(SuiteConfig::from_env()?);

    log::info!("CID Generation");
    let (alice, alice_keys) =
        CidDocument::generate("http://example.org/alice", &[KeyFamily::SingleMessage, KeyFamily::MultiMessage])?;
    let (bob, _) = CidDocument::generate("http://example.org/bob", &[KeyFamily::SingleMessage, KeyFamily::MultiMessage])?;
    log::info!("Alice: {}", alice.to_json()?);

    let credential = Credential::new(json!({
        "@context": ["https://www.w3.org/ns/credentials/v2"],
        "type": ["VerifiableCredential"],
        "validFrom": "2025-01-01T00:00:00Z",
        "credentialSubject": {"name": "Bob", "age": 42, "city": "Turin"}
    }))?;

    log::info!("Signature Computation...");
    let signed = suite
        .sign(&alice, &alice_keys, &credential, "http://example.org/alice#key-2", SignOptions::default())
        .await?;
    log::info!("Signed: {}", signed.to_json()?);

    log::info!("Proof Derivation...");
    let pointers = vec!["/credentialSubject/name".to_owned()];
    let derived = suite
        .derive(&signed, &pointers, DeriveOptions::with_presentation_header(b"demo".to_vec()))
        .await?;
    log::info!("Derived: {}", derived.to_json()?);

    log::info!("Proof Verification...");
    let by_alice = suite.verify(&alice, &derived).await?;
    let by_bob = suite.verify(&bob, &derived).await?;
    log::info!("Issued by Alice: {by_alice}, issued by Bob: {by_bob}");

    assert!(by_alice && !by_bob, "unexpected verification outcome");
    log::info!("Selective disclosure completed successfully");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = selective_disclosure_main().await {
        println!("{e}");
    }
}
