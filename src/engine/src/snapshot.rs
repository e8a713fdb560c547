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

use data::core::primitives::MatchId;
use data::match_states::event::Event;
use data::match_states::pending_input::PendingInput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The persisted layout of a match.
///
/// The event log, seed, ruleset hash, and pending inputs are sufficient to
/// reconstruct state deterministically by replaying the same calls against
/// the same ruleset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub seed: u64,
    pub ruleset_hash: String,
    pub event_log: Vec<Event>,
    pub pending_inputs: Vec<PendingInput>,
}

/// Hex SHA-256 of a ruleset's serialized form, used to detect ruleset
/// drift between a snapshot and a replay.
pub fn ruleset_hash(ruleset: &Value) -> String {
    let bytes = serde_json::to_vec(ruleset).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
