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

use enum_kinds::EnumKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::DefinitionId;
use crate::rulesets::expressions::{Predicate, Selector};

/// Direct state mutation primitives available to `modify_state` effects.
///
/// Each op is realized by emitting the corresponding state-change event, so
/// every mutation still flows through the stack and the event log.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StateOp {
    /// Move a card between zones; emits `CardMoved`.
    MoveCard,
    /// Change a named resource on a component; emits `ResourceChanged`.
    ChangeResource,
    /// Deal damage to a target; emits `DamageDealt`.
    DealDamage,
    /// Set a property in a component's property bag.
    SetProperty,
}

/// A single step in an effect pipeline.
///
/// Effects form a closed, recursive union: `execute_rule`, `sequence`, `if`
/// and `for_each` call back into the pipeline interpreter, which caps their
/// depth with the same guard as the resolution loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, EnumKind)]
#[enum_kind(EffectKind, derive(Serialize, Deserialize))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectDefinition {
    /// Recursive invocation of a named rule.
    ExecuteRule {
        rule_id: DefinitionId,
        #[serde(default)]
        rule_params: Map<String, Value>,
    },

    /// Append an event to the produced event list.
    EmitEvent {
        event_type: String,
        #[serde(default)]
        event_payload: Map<String, Value>,
    },

    /// Run sub-effects in order and concatenate their results.
    Sequence {
        #[serde(default)]
        actions: Vec<EffectDefinition>,
    },

    /// Runtime branch.
    If {
        condition: Predicate,
        #[serde(default)]
        then_actions: Vec<EffectDefinition>,
        #[serde(default)]
        else_actions: Vec<EffectDefinition>,
    },

    /// Iterate over the selector's targets, rebinding `self`/`it` to each.
    ForEach {
        selector: Selector,
        #[serde(default)]
        body: Vec<EffectDefinition>,
    },

    /// Engine mutation primitive; see [StateOp].
    ModifyState {
        op: StateOp,
        #[serde(default)]
        args: Map<String, Value>,
    },
}

impl EffectDefinition {
    pub fn kind(&self) -> EffectKind {
        EffectKind::from(self)
    }
}

/// A named parameter accepted by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleParameter {
    pub name: String,
    #[serde(default)]
    pub default: Option<Value>,
}

/// A rule defines what mechanically happens when executed: a named,
/// parameterized list of effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<RuleParameter>,
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
}
