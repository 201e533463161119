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

use bls12_381_plus::G1Projective;
use group::Curve;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::{
    ciphersuites::BbsCiphersuite,
    utils::{expand_message, i2osp},
};
use crate::errors::Error;

/// Generators for a given number of messages: `values[0]` is `Q_1`, the rest are `H_1..H_L`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generators {
    pub g1_base_point: G1Projective,
    pub values: Vec<G1Projective>,
}

impl Serialize for Generators {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let message_generators: Vec<String> = self
            .message_generators()
            .iter()
            .map(|item| hex::encode(item.to_affine().to_compressed()))
            .collect();

        let mut state = serializer.serialize_struct("Generators", 3)?;
        state.serialize_field("BP", &hex::encode(self.g1_base_point.to_affine().to_compressed()))?;
        state.serialize_field("Q1", &hex::encode(self.q1().to_affine().to_compressed()))?;
        state.serialize_field("MsgGenerators", &message_generators)?;
        state.end()
    }
}

impl Generators {
    /// https://www.ietf.org/archive/id/draft-irtf-cfrg-bbs-signatures-06.html#name-generators-calculation
    ///
    /// `count` is `L + 1` for `L` messages.
    pub fn create<CS: BbsCiphersuite>(count: usize) -> Result<Self, Error> {
        let count = count.max(1);
        let values = create_generators::<CS>(count, &CS::generator_seed())?;
        let g1_base_point = create_generators::<CS>(1, &CS::bp_generator_seed())?
            .pop()
            .ok_or(Error::NotEnoughGenerators)?;

        Ok(Self { g1_base_point, values })
    }

    pub fn q1(&self) -> G1Projective {
        self.values[0]
    }

    pub fn message_generators(&self) -> &[G1Projective] {
        &self.values[1..]
    }
}

fn create_generators<CS: BbsCiphersuite>(count: usize, generator_seed: &[u8]) -> Result<Vec<G1Projective>, Error> {
    let seed_dst = CS::generator_seed_dst();
    let generator_dst = CS::generator_dst();

    // v = expand_message(generator_seed, seed_dst, expand_len)
    let mut v = expand_message::<CS>(generator_seed, &seed_dst)?;
    let mut generators = Vec::with_capacity(count);

    for i in 1..=count {
        // v = expand_message(v || I2OSP(i, 8), seed_dst, expand_len)
        let input = [&v[..], &i2osp(i, 8)].concat();
        v = expand_message::<CS>(&input, &seed_dst)?;
        generators.push(G1Projective::hash::<CS::Expander>(&v, &generator_dst));
    }

    Ok(generators)
}
