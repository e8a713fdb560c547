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
use enumset::EnumSetType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::primitives::DefinitionId;
use crate::rulesets::expressions::{Predicate, Selector};

/// Kinds of objects a player can select as an action target.
#[derive(Debug, Hash, Serialize, Deserialize, JsonSchema, EnumSetType, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum SelectableObjectType {
    Card,
    Zone,
    Player,
    Component,
}

/// How the client is expected to present an action for activation.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Click,
    Drag,
    MultiSelect,
    Button,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionTiming {
    #[default]
    Stack,
    Instant,
}

/// A cost that must be paid to take an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CostDefinition {
    /// Spend `amount` of the named resource from the acting player.
    PayResource { resource: String, amount: i64 },
}

/// A target slot an action requires the player to fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionTarget {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_target_type")]
    pub target_type: SelectableObjectType,
    #[serde(default = "default_count")]
    pub count: u32,
    pub selector: Selector,
}

fn default_target_type() -> SelectableObjectType {
    SelectableObjectType::Card
}

fn default_count() -> u32 {
    1
}

/// Definition of a player action: what a player can do, when, at what cost,
/// and which rules run when they do it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timing: ActionTiming,
    /// Phases in which this action is legal; empty means any phase.
    #[serde(default)]
    pub phase_ids: Vec<DefinitionId>,
    #[serde(default)]
    pub zone_ids: Vec<DefinitionId>,
    #[serde(default)]
    pub preconditions: Vec<Predicate>,
    #[serde(default)]
    pub costs: Vec<CostDefinition>,
    #[serde(default)]
    pub targets: Vec<ActionTarget>,
    /// Rules executed when the action's `ExecuteAction` event resolves.
    #[serde(default)]
    pub execute_rules: Vec<DefinitionId>,
    #[serde(default)]
    pub ui: Option<Value>,
    /// Kind of the object the action is primarily activated on, if any.
    #[serde(default)]
    pub primary_target_type: Option<SelectableObjectType>,
    #[serde(default)]
    pub primary_target_selector: Option<Selector>,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
}
