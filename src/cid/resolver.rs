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

use super::document::{CidDocument, VerificationMethod};
use crate::{
    config::ClassificationPolicy,
    errors::{Error, Result},
    keys::{
        family::KeyFamily,
        multikey::{self, Multicodec},
    },
};

/// A verification method together with the family it was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMethod<'a> {
    pub method: &'a VerificationMethod,
    pub family: KeyFamily,
}

impl ResolvedMethod<'_> {
    /// Raw public key bytes.
    pub fn public_key(&self) -> Result<Vec<u8>> {
        let codec = match self.family {
            KeyFamily::MultiMessage => Multicodec::Bls12381G2Pub,
            KeyFamily::SingleMessage => Multicodec::Ed25519Pub,
        };
        multikey::decode(codec, &self.method.public_key_multibase)
    }
}

/// Finds the single method named `method_id` and classifies its key.
pub fn resolve<'a>(cid: &'a CidDocument, method_id: &str, policy: ClassificationPolicy) -> Result<ResolvedMethod<'a>> {
    let mut matches = cid.verification_method.iter().filter(|m| m.id == method_id);
    let method = matches
        .next()
        .ok_or_else(|| Error::Resolution(format!("verification method {method_id} in {}", cid.id)))?;
    if matches.next().is_some() {
        return Err(Error::Resolution(format!("verification method {method_id} is listed more than once")));
    }
    let family = method.key_family(policy)?;
    log::debug!("resolved {method_id} as {family:?}");
    Ok(ResolvedMethod { method, family })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_classifies_and_decodes() {
        let (cid, _) = CidDocument::generate("http://example.org/alice", &[KeyFamily::MultiMessage]).unwrap();
        let resolved = resolve(&cid, "http://example.org/alice#key-1", ClassificationPolicy::FailClosed).unwrap();
        assert_eq!(resolved.family, KeyFamily::MultiMessage);
        assert_eq!(resolved.public_key().unwrap().len(), 96);
    }

    #[test]
    fn absent_or_duplicate_method_fails() {
        let (mut cid, _) = CidDocument::generate("http://example.org/alice", &[KeyFamily::SingleMessage]).unwrap();
        assert!(matches!(
            resolve(&cid, "http://example.org/alice#key-9", ClassificationPolicy::FailClosed),
            Err(Error::Resolution(_))
        ));

        let duplicate = cid.verification_method[0].clone();
        cid.verification_method.push(duplicate);
        assert!(matches!(
            resolve(&cid, "http://example.org/alice#key-1", ClassificationPolicy::FailClosed),
            Err(Error::Resolution(_))
        ));
    }

    #[test]
    fn classification_is_stable_across_calls() {
        let (cid, _) =
            CidDocument::generate("http://example.org/alice", &[KeyFamily::SingleMessage, KeyFamily::MultiMessage])
                .unwrap();
        for method in &cid.verification_method {
            let first = resolve(&cid, &method.id, ClassificationPolicy::FailClosed).unwrap().family;
            for _ in 0..5 {
                assert_eq!(resolve(&cid, &method.id, ClassificationPolicy::FailClosed).unwrap().family, first);
            }
        }
    }
}
