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

use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::{ComponentId, DefinitionId, EventId, ReactionId};
use crate::rulesets::expressions::Predicate;
use crate::rulesets::rule_definition::EffectDefinition;
use crate::rulesets::trigger_definition::{Timing, TriggerWhen};

/// The fixed control-plane event lexicon, plus ruleset-defined types.
///
/// Serialized as the bare event type string, so rulesets can introduce new
/// payload-level event types without any schema change; the engine carries
/// those as [EventType::Custom].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum EventType {
    MatchStarted,
    TurnStarted,
    TurnEndRequested,
    TurnEnded,
    NextTurn,
    PhaseStarted,
    PhaseEndRequested,
    PhaseEnded,
    NextPhase,
    ExecuteAction,
    ActionExecuted,
    RuleExecuted,
    CardMoved,
    CardEntered,
    ResourceChanged,
    DamageDealt,
    EndGame,
    GameEnded,
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::MatchStarted => "MatchStarted",
            EventType::TurnStarted => "TurnStarted",
            EventType::TurnEndRequested => "TurnEndRequested",
            EventType::TurnEnded => "TurnEnded",
            EventType::NextTurn => "NextTurn",
            EventType::PhaseStarted => "PhaseStarted",
            EventType::PhaseEndRequested => "PhaseEndRequested",
            EventType::PhaseEnded => "PhaseEnded",
            EventType::NextPhase => "NextPhase",
            EventType::ExecuteAction => "ExecuteAction",
            EventType::ActionExecuted => "ActionExecuted",
            EventType::RuleExecuted => "RuleExecuted",
            EventType::CardMoved => "CardMoved",
            EventType::CardEntered => "CardEntered",
            EventType::ResourceChanged => "ResourceChanged",
            EventType::DamageDealt => "DamageDealt",
            EventType::EndGame => "EndGame",
            EventType::GameEnded => "GameEnded",
            EventType::Custom(name) => name,
        }
    }

    /// True for event types in the system lexicon.
    pub fn is_system(&self) -> bool {
        !matches!(self, EventType::Custom(_))
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            "MatchStarted" => EventType::MatchStarted,
            "TurnStarted" => EventType::TurnStarted,
            "TurnEndRequested" => EventType::TurnEndRequested,
            "TurnEnded" => EventType::TurnEnded,
            "NextTurn" => EventType::NextTurn,
            "PhaseStarted" => EventType::PhaseStarted,
            "PhaseEndRequested" => EventType::PhaseEndRequested,
            "PhaseEnded" => EventType::PhaseEnded,
            "NextPhase" => EventType::NextPhase,
            "ExecuteAction" => EventType::ExecuteAction,
            "ActionExecuted" => EventType::ActionExecuted,
            "RuleExecuted" => EventType::RuleExecuted,
            "CardMoved" => EventType::CardMoved,
            "CardEntered" => EventType::CardEntered,
            "ResourceChanged" => EventType::ResourceChanged,
            "DamageDealt" => EventType::DamageDealt,
            "EndGame" => EventType::EndGame,
            "GameEnded" => EventType::GameEnded,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(EventType::from(name.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Applied,
    Prevented,
    Failed,
}

/// Kind tag for an [ObjectRef].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Player,
    Card,
    Zone,
    Component,
}

/// Reference to a match object, used for cause attribution.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: ComponentId,
}

impl ObjectRef {
    pub fn player(id: ComponentId) -> Self {
        Self { kind: ObjectKind::Player, id }
    }

    pub fn component(id: ComponentId) -> Self {
        Self { kind: ObjectKind::Component, id }
    }
}

/// Payload map of an event.
pub type EventPayload = Map<String, Value>;

/// Extracts the object out of a `json!({..})` literal, for payload
/// construction.
pub fn payload_object(value: Value) -> EventPayload {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// An immutable record of something that happened or is about to happen.
///
/// The id is assigned by the event registry on registration and the order
/// by the stack's monotonic counter at push time; within a match the pair
/// `(id, type, order)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub payload: EventPayload,
    #[serde(default)]
    pub caused_by: Option<ObjectRef>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub order: u64,
}

impl Event {
    pub fn new(event_type: EventType, payload: EventPayload) -> Self {
        Self {
            id: EventId::default(),
            event_type,
            payload,
            caused_by: None,
            status: EventStatus::Pending,
            order: 0,
        }
    }

    pub fn caused_by(mut self, cause: ObjectRef) -> Self {
        self.caused_by = Some(cause);
        self
    }

    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// The rule-side record of a trigger firing: the effect pipeline to execute
/// and its cause attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: ReactionId,
    /// Id of the trigger definition that fired.
    pub trigger_id: DefinitionId,
    pub when: Option<TriggerWhen>,
    #[serde(default)]
    pub conditions: Vec<Predicate>,
    pub effects: Vec<EffectDefinition>,
    pub timing: Timing,
    pub caused_by: ObjectRef,
    /// Component whose trigger produced this reaction.
    pub source: ComponentId,
}
