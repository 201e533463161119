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

use std::collections::{HashMap, HashSet};

use super::{
    envelope::{
        parse_base_proof_value, proof_value_kind, serialize_disclosure_proof_value, DerivedProofEnvelope,
        ProofValueKind,
    },
    transform::{
        as_messages, canonicalize_with_input_labels, select_blank_labelled, selection_statements, skolemize,
        split_mandatory, strip_blank_ids,
    },
};
use crate::{
    canonical::Canonicalizer,
    credential::Credential,
    errors::{Error, Result},
    keys::family::BBS_CRYPTOSUITE,
    schemes::generics::MultiMessageScheme,
};

/// Builds a credential revealing the claims under `reveal_pointers` plus the mandatory ones,
/// with a derived proof in place of the base proof.
pub(crate) fn derive<C, M>(
    canonicalizer: &C,
    scheme: &M,
    credential: &Credential,
    reveal_pointers: &[String],
    presentation_header: &[u8],
) -> Result<Credential>
where
    C: Canonicalizer,
    M: MultiMessageScheme,
{
    let proof = credential
        .proof
        .as_ref()
        .ok_or_else(|| Error::InvalidState("credential has no proof to derive from".to_owned()))?;
    if proof.cryptosuite != BBS_CRYPTOSUITE {
        return Err(Error::InvalidState(format!("cannot derive from a {} proof", proof.cryptosuite)));
    }
    if proof_value_kind(proof.proof_value.as_deref())? == ProofValueKind::Derived {
        return Err(Error::InvalidState("cannot derive from an already derived proof".to_owned()));
    }
    let base = parse_base_proof_value(proof.proof_value.as_deref())?;

    let skolemized = skolemize(canonicalizer, &credential.document())?;
    let mandatory = selection_statements(canonicalizer, &skolemized.document, &base.mandatory_pointers)?;
    let (_, non_mandatory) = split_mandatory(&skolemized.statements, &mandatory);

    let mut combined = base.mandatory_pointers.clone();
    combined.extend(reveal_pointers.iter().filter(|p| !base.mandatory_pointers.contains(p)).cloned());
    let mut reveal_document = select_blank_labelled(&skolemized.document, &combined)?
        .ok_or_else(|| Error::InvalidState("nothing to reveal".to_owned()))?;
    let (revealed, label_map) = canonicalize_with_input_labels(canonicalizer, &reveal_document)?;

    let mandatory_set: HashSet<&String> = mandatory.iter().collect();
    let position: HashMap<&String, usize> = non_mandatory.iter().enumerate().map(|(i, s)| (s, i)).collect();
    let mut mandatory_indexes = Vec::new();
    let mut selective_indexes = Vec::new();
    for (i, statement) in revealed.iter().enumerate() {
        if mandatory_set.contains(statement) {
            mandatory_indexes.push(i);
        } else {
            let signed = position
                .get(statement)
                .ok_or_else(|| Error::InvalidState(format!("revealed statement is not signed: {}", statement.trim_end())))?;
            selective_indexes.push(*signed);
        }
    }
    selective_indexes.sort_unstable();
    let disclosed = selective_indexes.len();

    let bbs_proof = scheme.derive_proof(
        &base.public_key,
        &base.bbs_signature,
        &base.bbs_header,
        presentation_header,
        &as_messages(&non_mandatory),
        &selective_indexes,
    )?;

    let proof_value = serialize_disclosure_proof_value(&DerivedProofEnvelope {
        bbs_proof,
        label_map,
        mandatory_indexes,
        selective_indexes,
        presentation_header: presentation_header.to_vec(),
    })?;

    strip_blank_ids(&mut reveal_document);
    let mut derived = Credential::new(reveal_document)?;
    let mut derived_proof = proof.clone();
    derived_proof.proof_value = Some(proof_value);
    derived.proof = Some(derived_proof);

    log::debug!(
        "derived proof discloses {} of {} non-mandatory statement(s)",
        disclosed,
        non_mandatory.len()
    );
    Ok(derived)
}
