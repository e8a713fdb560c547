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

use serde::{Deserialize, Serialize};

use crate::core::primitives::DefinitionId;
use crate::rulesets::resource_definition::ResourceDefinition;

/// A resource instance attached to a component.
///
/// Invariants: `min ≤ current ≤ max` when the definition sets bounds, and
/// `spent_this_turn ≤ max_per_turn` when a per-turn cap is set.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub definition_id: DefinitionId,
    pub current: i64,
    pub spent_this_turn: i64,
    pub gained_this_turn: i64,
}

impl ResourceState {
    pub fn new(definition: &ResourceDefinition) -> Self {
        Self {
            definition_id: definition.id,
            current: definition.starting_amount,
            spent_this_turn: 0,
            gained_this_turn: 0,
        }
    }

    pub fn can_spend(&self, amount: i64, definition: &ResourceDefinition) -> bool {
        if self.current < amount {
            return false;
        }
        if let Some(cap) = definition.max_per_turn {
            if self.spent_this_turn + amount > cap {
                return false;
            }
        }
        true
    }

    /// Spends from this resource, returning false without mutation if the
    /// amount or per-turn cap does not allow it.
    pub fn spend(&mut self, amount: i64, definition: &ResourceDefinition) -> bool {
        if !self.can_spend(amount, definition) {
            return false;
        }
        self.current -= amount;
        self.spent_this_turn += amount;
        self.clamp(definition);
        true
    }

    /// Gains into this resource, clamping to the definition's bounds.
    pub fn gain(&mut self, amount: i64, definition: &ResourceDefinition) {
        self.current += amount;
        self.gained_this_turn += amount;
        self.clamp(definition);
    }

    /// Sets the current amount directly, clamping to the definition's
    /// bounds.
    pub fn set(&mut self, amount: i64, definition: &ResourceDefinition) {
        self.current = amount;
        self.clamp(definition);
    }

    /// Applies a signed delta without touching the per-turn tracking
    /// counters. Used for engine-driven changes like damage.
    pub fn adjust(&mut self, delta: i64, definition: &ResourceDefinition) {
        self.current += delta;
        self.clamp(definition);
    }

    pub fn reset_turn_tracking(&mut self) {
        self.spent_this_turn = 0;
        self.gained_this_turn = 0;
    }

    fn clamp(&mut self, definition: &ResourceDefinition) {
        if let Some(max) = definition.max_amount {
            self.current = self.current.min(max);
        }
        if let Some(min) = definition.min_amount {
            self.current = self.current.max(min);
        }
    }
}
