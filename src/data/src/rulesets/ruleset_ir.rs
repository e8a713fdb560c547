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

use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::MatchError;
use crate::core::primitives::DefinitionId;
use crate::rulesets::action_definition::ActionDefinition;
use crate::rulesets::component_definition::{ComponentDefinition, ComponentTag};
use crate::rulesets::rule_definition::RuleDefinition;
use crate::rulesets::trigger_definition::TriggerDefinition;
use crate::rulesets::validate;

/// Definition of a game step within a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseExitType {
    /// The phase ends when no legal actions remain and the phase workflow
    /// permits exit.
    #[default]
    ExitOnNoActions,
    /// The phase ends only on an explicit player request.
    UserExit,
}

/// Definition of a game phase in the declarative turn structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PhaseDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exit_type: PhaseExitType,
}

/// Declarative turn structure: the phase list the default Game/Turn/Phase
/// workflow hierarchy is synthesized from when the game component does not
/// declare an explicit workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TurnStructure {
    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
    #[serde(default)]
    pub initial_phase_id: Option<DefinitionId>,
    #[serde(default)]
    pub max_turns_per_player: Option<u32>,
}

/// Complete ruleset intermediate representation.
///
/// Every definition carries an integer id unique within its kind and
/// cross-references are by id. Unknown fields are ignored and any field
/// ordering is accepted, so newer authoring pipelines can add fields without
/// breaking older engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RulesetIR {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub turn_structure: TurnStructure,
    #[serde(default)]
    pub game_component: Option<ComponentDefinition>,
    #[serde(default)]
    pub component_definitions: Vec<ComponentDefinition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    #[serde(default)]
    pub constants: Map<String, Value>,
    #[serde(default)]
    pub system_triggers: Vec<TriggerDefinition>,
}

impl RulesetIR {
    /// Loads a ruleset from its serialized form, synthesizing the default
    /// workflow hierarchy where needed and validating the result.
    pub fn from_value(value: Value) -> Result<Self, MatchError> {
        let mut ruleset: RulesetIR = serde_json::from_value(value)
            .map_err(|e| MatchError::MalformedRuleset(e.to_string()))?;
        validate::synthesize_workflows(&mut ruleset);
        validate::validate(&ruleset)?;
        Ok(ruleset)
    }

    /// JSON schema of the serialized form, for use by authoring pipelines.
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(RulesetIR)
    }

    pub fn action(&self, id: DefinitionId) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn rule(&self, id: DefinitionId) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn phase(&self, id: DefinitionId) -> Option<&PhaseDefinition> {
        self.turn_structure.phases.iter().find(|p| p.id == id)
    }

    /// Looks up a component definition by id, including the game component.
    pub fn component(&self, id: DefinitionId) -> Option<&ComponentDefinition> {
        if let Some(game) = &self.game_component {
            if game.id == id {
                return Some(game);
            }
        }
        self.component_definitions.iter().find(|c| c.id == id)
    }

    pub fn components_with_tag(
        &self,
        tag: ComponentTag,
    ) -> impl Iterator<Item = &ComponentDefinition> {
        self.component_definitions.iter().filter(move |c| c.tag == tag)
    }

    /// The player definition used to instantiate player components.
    pub fn player_definition(&self) -> Option<&ComponentDefinition> {
        self.components_with_tag(ComponentTag::Player).next()
    }

    /// Highest definition id in use across all definition kinds.
    pub fn max_definition_id(&self) -> u32 {
        let mut max = 0;
        let mut consider = |id: DefinitionId| max = max.max(id.0);
        if let Some(game) = &self.game_component {
            consider(game.id);
        }
        for c in &self.component_definitions {
            consider(c.id);
        }
        for a in &self.actions {
            consider(a.id);
        }
        for r in &self.rules {
            consider(r.id);
        }
        for p in &self.turn_structure.phases {
            consider(p.id);
        }
        max
    }
}
