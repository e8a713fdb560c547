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

//! Stateless stepping of component workflow graphs.
//!
//! All functions receive the match state; the workflow position lives on
//! the component instance. Event emission at transition points (turn and
//! phase boundaries) is the match actor's job, not the executor's.

use data::core::errors::MatchError;
use data::core::primitives::{ComponentId, DefinitionId};
use data::match_states::match_state::MatchState;
use data::match_states::workflow_state::WorkflowState;
use data::rulesets::component_definition::ComponentDefinition;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::workflow::{WorkflowEdge, WorkflowNode, END_NODE_ID};
use itertools::Itertools;
use tracing::debug;
use utils::outcome::{Outcome, Value, OK};
use utils::with_error::WithError;

use crate::queries::eval::{predicate_holds, EvalContext};

/// Result of stepping a workflow.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    /// A transition was taken; stepping can continue.
    Advanced,
    /// No enabled non-Input transition exists; player input is required.
    Blocked,
    /// The workflow transitioned to the end node.
    Ended,
}

/// Positions a component at the start of its definition's workflow.
///
/// Re-entering resets the position and history but keeps the graph.
pub fn enter_workflow(
    state: &mut MatchState,
    component_id: ComponentId,
    definition: &ComponentDefinition,
) -> Outcome {
    let graph = definition.workflow_graph.clone().unwrap_or_default();
    let component = state
        .component_mut(component_id)
        .with_error(|| format!("cannot enter workflow of unknown component {component_id:?}"))?;
    match &mut component.workflow {
        Some(workflow) => workflow.reset(),
        None => component.workflow = Some(WorkflowState::from_graph(graph)),
    }
    OK
}

/// The current workflow node of a component, if it has entered a workflow.
pub fn current_node(state: &MatchState, component_id: ComponentId) -> Option<WorkflowNode> {
    state.component(component_id)?.workflow.as_ref()?.current_node()
}

/// All enabled transitions from the component's current node, ordered by
/// priority descending and then by declaration order.
///
/// Simple edges are always enabled. Condition edges are enabled when their
/// predicate holds, Input edges when their optional predicate holds, but
/// Input edges are only taken by [take_input_edge], never by
/// [step_workflow].
pub fn valid_transitions(
    ruleset: &RulesetIR,
    state: &MatchState,
    component_id: ComponentId,
) -> Vec<WorkflowEdge> {
    let Some(component) = state.component(component_id) else {
        return vec![];
    };
    let Some(workflow) = &component.workflow else {
        return vec![];
    };

    let ctx = EvalContext::with_source(component_id);
    workflow
        .outgoing_edges()
        .into_iter()
        .filter(|edge| match edge.condition() {
            Some(condition) => predicate_holds(ruleset, state, &ctx, condition),
            None => true,
        })
        .cloned()
        .sorted_by_key(|edge| std::cmp::Reverse(edge.priority()))
        .collect()
}

/// Transitions the component to a target node.
///
/// Legal only if an enabled outgoing edge from the current node points to
/// the target; anything else is an invariant violation.
pub fn transition_to_node(
    ruleset: &RulesetIR,
    state: &mut MatchState,
    component_id: ComponentId,
    target_node_id: &str,
) -> Outcome {
    let enabled = valid_transitions(ruleset, state, component_id)
        .iter()
        .any(|edge| edge.to_node_id() == target_node_id);
    if !enabled {
        return Err(MatchError::Internal(format!(
            "transition to {target_node_id} is not enabled from the current node"
        ))
        .into());
    }

    let component = state
        .component_mut(component_id)
        .with_error(|| format!("cannot transition unknown component {component_id:?}"))?;
    let workflow = component
        .workflow
        .as_mut()
        .with_error(|| "component has not entered a workflow".to_string())?;
    debug!(?component_id, target_node_id, "Workflow transition");
    workflow.enter_node(target_node_id);
    OK
}

/// Takes the highest-priority enabled non-Input transition.
pub fn step_workflow(
    ruleset: &RulesetIR,
    state: &mut MatchState,
    component_id: ComponentId,
) -> Value<StepOutcome> {
    let target = valid_transitions(ruleset, state, component_id)
        .iter()
        .find(|edge| !edge.is_input())
        .map(|edge| edge.to_node_id().to_string());

    match target {
        None => Ok(StepOutcome::Blocked),
        Some(target) => {
            transition_to_node(ruleset, state, component_id, &target)?;
            if target == END_NODE_ID {
                Ok(StepOutcome::Ended)
            } else {
                Ok(StepOutcome::Advanced)
            }
        }
    }
}

/// Takes an Input edge activated by a player, validating that the named
/// input is available from the current node.
pub fn take_input_edge(
    ruleset: &RulesetIR,
    state: &mut MatchState,
    component_id: ComponentId,
    input_definition_id: DefinitionId,
) -> Value<StepOutcome> {
    let target = valid_transitions(ruleset, state, component_id)
        .iter()
        .find_map(|edge| match edge {
            WorkflowEdge::Input { base, trigger_input_id, .. }
                if *trigger_input_id == input_definition_id =>
            {
                Some(base.to_node_id.clone())
            }
            _ => None,
        });

    match target {
        None => Err(MatchError::InputMismatch(format!(
            "input {input_definition_id} is not available from the current node"
        ))
        .into()),
        Some(target) => {
            transition_to_node(ruleset, state, component_id, &target)?;
            if target == END_NODE_ID {
                Ok(StepOutcome::Ended)
            } else {
                Ok(StepOutcome::Advanced)
            }
        }
    }
}

/// True iff the component's workflow can exit from its current node: an
/// enabled edge reaches the end node in one step, or the graph declares no
/// nodes at all.
pub fn can_exit_workflow(
    ruleset: &RulesetIR,
    state: &MatchState,
    component_id: ComponentId,
) -> bool {
    let Some(component) = state.component(component_id) else {
        return false;
    };
    let Some(workflow) = &component.workflow else {
        return false;
    };
    if workflow.graph.is_empty() {
        return true;
    }
    valid_transitions(ruleset, state, component_id)
        .iter()
        .any(|edge| edge.to_node_id() == END_NODE_ID)
}
