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

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::DefinitionId;

/// How many instances of a resource exist and where they attach.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema, Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceScope {
    /// One instance per match, attached to the game component.
    Global,
    /// One instance per player component.
    Player,
    /// One instance per owning object (card, custom component).
    Object,
}

/// Lifecycle behavior of a resource.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema, Sequence,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Can be spent and regenerated (mana, energy).
    Consumable,
    /// Tracks a value that moves both ways (life).
    Tracked,
    /// Only increases (experience, counters).
    Accumulating,
    /// On/off state.
    Binary,
}

/// Static description of a named, numeric, instance-scoped quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: ResourceScope,
    #[serde(default = "default_kind", rename = "resource_type")]
    pub kind: ResourceKind,
    #[serde(default)]
    pub starting_amount: i64,
    #[serde(default)]
    pub max_amount: Option<i64>,
    #[serde(default)]
    pub min_amount: Option<i64>,
    /// Cap on the amount spendable within a single turn.
    #[serde(default)]
    pub max_per_turn: Option<i64>,
    /// Amount gained automatically at each turn boundary.
    #[serde(default)]
    pub regeneration_per_turn: i64,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

fn default_scope() -> ResourceScope {
    ResourceScope::Player
}

fn default_kind() -> ResourceKind {
    ResourceKind::Consumable
}
