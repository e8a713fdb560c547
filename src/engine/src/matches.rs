// Copyright © deckhand 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use data::core::errors::MatchError;
use data::core::primitives::MatchId;
use serde_json::Value;
use tracing::info;

use crate::match_actor::MatchActor;

/// The matches running in this process.
///
/// Each match owns an independent actor, state, registries, and RNG; no
/// mutable state is shared between matches.
#[derive(Debug, Default)]
pub struct Matches {
    matches: HashMap<MatchId, MatchActor>,
}

impl Matches {
    /// Loads a ruleset and creates a match actor for it.
    pub fn create_match(
        &mut self,
        id: MatchId,
        ruleset: Value,
        seed: Option<u64>,
    ) -> Result<&mut MatchActor, MatchError> {
        if self.matches.contains_key(&id) {
            return Err(MatchError::InvalidAction(format!("match {:?} already exists", id.0)));
        }
        let actor = MatchActor::new(id, ruleset, seed)?;
        info!(id = %id.0, "Created match");
        Ok(self.matches.entry(id).or_insert(actor))
    }

    pub fn get(&self, id: MatchId) -> Option<&MatchActor> {
        self.matches.get(&id)
    }

    pub fn get_mut(&mut self, id: MatchId) -> Option<&mut MatchActor> {
        self.matches.get_mut(&id)
    }

    /// Drops a match and everything it owns.
    pub fn remove_match(&mut self, id: MatchId) -> bool {
        self.matches.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
