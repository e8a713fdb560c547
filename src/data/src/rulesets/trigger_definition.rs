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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::DefinitionId;
use crate::rulesets::expressions::Predicate;
use crate::rulesets::rule_definition::EffectDefinition;

/// When a reaction resolves relative to its triggering event.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    /// Resolves before the event is applied.
    Pre,
    /// Resolves after the event is applied.
    #[default]
    Post,
}

/// How the `caused_by` attribution of a reaction is resolved.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriggerScope {
    /// The component that caused the event, falling back to the active
    /// player.
    #[default]
    #[serde(rename = "self")]
    SelfObject,
    /// One reaction per player.
    All,
    /// Every player other than the causing one.
    Opponent,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Event,
    StateBased,
}

/// Event filter of an event-type trigger.
///
/// Every key in `filters` must be equal-compared against the event payload
/// for the trigger to match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriggerWhen {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

/// Activation context limiting when a trigger is listening.
///
/// Absent fields impose no restriction. The owning component must be active
/// regardless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivationContext {
    /// Zones the owning component must be in.
    #[serde(default)]
    pub zones: Option<Vec<String>>,
    /// Phase definition ids during which the trigger listens.
    #[serde(default)]
    pub phases: Option<Vec<DefinitionId>>,
    /// Arbitrary additional predicate, evaluated with the owning component
    /// as `self`.
    #[serde(default)]
    pub condition: Option<Predicate>,
}

/// Definition of a trigger attached to a component.
///
/// Event-type triggers carry a `when` filter and react to events on the
/// bus. State-based triggers carry a standing `condition` and are evaluated
/// by the state-watcher engine after stack quiescence; they have no `when`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriggerDefinition {
    pub id: DefinitionId,
    #[serde(default)]
    pub trigger_type: TriggerKind,
    #[serde(default)]
    pub when: Option<TriggerWhen>,
    #[serde(default)]
    pub conditions: Vec<Predicate>,
    /// Standing predicate of a state-based trigger.
    #[serde(default)]
    pub condition: Option<Predicate>,
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub scope: TriggerScope,
    #[serde(default)]
    pub active_while: Option<ActivationContext>,
}

impl TriggerDefinition {
    /// True for triggers evaluated by the state-watcher engine rather than
    /// the event bus.
    pub fn is_state_based(&self) -> bool {
        self.trigger_type == TriggerKind::StateBased
            || (self.when.is_none() && self.condition.is_some())
    }
}
