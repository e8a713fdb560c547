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
use serde_json::{Map, Value};

use crate::core::primitives::DefinitionId;
use crate::rulesets::resource_definition::ResourceDefinition;
use crate::rulesets::trigger_definition::TriggerDefinition;
use crate::rulesets::workflow::WorkflowGraph;

/// The closed set of component kinds.
#[derive(Debug, Hash, Serialize, Deserialize, JsonSchema, EnumSetType, Sequence)]
#[serde(rename_all = "lowercase")]
pub enum ComponentTag {
    Game,
    Player,
    Zone,
    Card,
    Turn,
    Phase,
    Custom,
}

/// Static description of a component, loaded from the ruleset.
///
/// Declares the component kind, allowed sub-component definitions, trigger
/// and resource templates, and (for Game/Turn/Phase components) an owned
/// workflow graph. Per-kind extras are optional fields rather than separate
/// types so that the definition table stays a single homogeneous list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComponentDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "component_type")]
    pub tag: ComponentTag,
    #[serde(default)]
    pub sub_component_ids: Vec<DefinitionId>,
    #[serde(default)]
    pub triggers: Vec<TriggerDefinition>,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub workflow_graph: Option<WorkflowGraph>,
    /// Number of player components to instantiate. Game components only.
    #[serde(default)]
    pub max_players: Option<u32>,
    /// Turn cap after which the match ends. Turn components only.
    #[serde(default)]
    pub max_turns_per_player: Option<u32>,
}

impl ComponentDefinition {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn property_u64(&self, key: &str) -> Option<u64> {
        self.property(key).and_then(Value::as_u64)
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }

    pub fn property_bool(&self, key: &str) -> Option<bool> {
        self.property(key).and_then(Value::as_bool)
    }

    /// Instances of this card definition created per player at match start.
    pub fn copies(&self) -> u64 {
        self.property_u64("copies").unwrap_or(1)
    }

    /// Whether card instances are created once per player or once globally.
    pub fn per_player(&self) -> bool {
        self.property_bool("per_player").unwrap_or(true)
    }

    /// Zone that card instances start the match in.
    pub fn starting_zone(&self) -> &str {
        self.property_str("starting_zone").unwrap_or("deck")
    }

    /// Whether this zone receives a seeded shuffle at match start.
    pub fn shuffle_on_start(&self) -> bool {
        self.property_bool("shuffle_on_start").unwrap_or(false)
    }
}
