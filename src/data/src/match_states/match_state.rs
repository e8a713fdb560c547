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

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::{ComponentId, DefinitionId, HasComponentId, MatchId, TurnNumber};
use crate::match_states::component::{Component, Components};
use crate::match_states::event::Event;

/// Status of the match: starting, ongoing, finished, or failed.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Components are being instantiated; no events have resolved yet.
    #[default]
    Setup,
    Playing,
    GameOver,
    /// Resolution overflow or an internal invariant violation; no further
    /// actions are accepted.
    Failed,
}

/// The complete state of one ongoing match.
///
/// Owned exclusively by the match actor for the lifetime of the match.
/// Everything here is derived from the ruleset, the seed, and the applied
/// event log; queries read it as a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    pub id: MatchId,
    pub status: MatchStatus,

    /// Current turn number, starting at 1.
    pub turn_number: TurnNumber,

    /// Player component whose turn it is.
    ///
    /// Exactly one player can act at a time; there is no simultaneous
    /// action.
    pub active_player: Option<ComponentId>,

    /// Player components in seating order.
    pub player_ids: Vec<ComponentId>,

    pub components: Components,

    /// The singleton Game component.
    pub game_component: Option<ComponentId>,

    /// The Turn component currently being played, if any.
    pub current_turn: Option<ComponentId>,

    /// The Phase component currently being played, if any.
    pub current_phase: Option<ComponentId>,

    /// Turn-structure phase id of the current phase, used by action phase
    /// filters and trigger activation contexts.
    pub current_phase_id: Option<DefinitionId>,

    /// Append-only log of applied events, in apply order.
    pub event_log: Vec<Event>,

    /// Seeded random source for all shuffles and choices in this match.
    pub rng: Xoshiro256StarStar,

    /// The seed the RNG was created from, kept for snapshots.
    pub seed: u64,

    /// Ruleset constants, exposed to expressions and hosts.
    #[serde(default)]
    pub constants: Map<String, Value>,
}

impl MatchState {
    pub fn new(id: MatchId, seed: u64) -> Self {
        Self {
            id,
            status: MatchStatus::Setup,
            turn_number: 1,
            active_player: None,
            player_ids: vec![],
            components: Components::default(),
            game_component: None,
            current_turn: None,
            current_phase: None,
            current_phase_id: None,
            event_log: vec![],
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            seed,
            constants: Map::new(),
        }
    }

    pub fn component(&self, id: impl HasComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: impl HasComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    /// Every player component other than the given one.
    pub fn opponents_of(&self, player: ComponentId) -> Vec<ComponentId> {
        self.player_ids.iter().copied().filter(|p| *p != player).collect()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, MatchStatus::GameOver | MatchStatus::Failed)
    }
}
