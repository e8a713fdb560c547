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

//! The single-writer actor that executes one match.
//!
//! All mutation flows through the actor: it steps the game component's
//! workflow, drains the resolution stack to quiescence, checks state-based
//! watchers, and yields only when player input is required or the match
//! ends.

use std::collections::{HashMap, HashSet};

use data::actions::player_action::PlayerAction;
use data::core::errors::{match_error_from, MatchError};
use data::core::primitives::{ComponentId, DefinitionId, EventId, InputId, MatchId, ReactionId};
use data::match_states::event::{payload_object, Event, EventType, ObjectRef, Reaction};
use data::match_states::match_state::{MatchState, MatchStatus};
use data::match_states::pending_input::{InputKind, PendingInput};
use data::match_states::registries::{EventRegistry, ReactionRegistry};
use data::match_states::stack::{ResolutionStack, StackItem, StackRef};
use data::rulesets::action_definition::SelectableObjectType;
use data::rulesets::component_definition::ComponentDefinition;
use data::rulesets::ruleset_ir::{PhaseExitType, RulesetIR};
use data::rulesets::trigger_definition::Timing;
use data::rulesets::workflow::{WorkflowEdge, END_NODE_ID};
use rules::effects::rule_executor;
use rules::mutations::{apply, resources, setup};
use rules::queries::legal_actions::{self, AvailableAction, ObjectAction};
use rules::triggers::event_bus::EventBus;
use rules::triggers::state_watchers::StateWatchers;
use rules::workflows::workflow_executor::{self, StepOutcome};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, warn};
use utils::outcome::{Outcome, StopCondition, Value as Out, OK};
use utils::with_error::WithError;

/// Maximum depth of nested stack resolutions.
pub const MAX_RECURSION_DEPTH: u32 = 100;

/// Maximum stack pops within one top-level resolution cycle.
pub const MAX_CYCLE_STEPS: u32 = 100;

/// Maximum state-watcher rounds after stack quiescence.
pub const MAX_WATCHER_ITERATIONS: u32 = 100;

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GameLoopResult {
    /// The match is suspended on a pending player input or a player
    /// action.
    WaitingForInput,
    /// The match has finished.
    GameEnded,
}

/// Result of a successful `process_action` or `submit_input` call.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub result: GameLoopResult,
    /// Events appended to the log during this call, in apply order.
    pub events: Vec<Event>,
}

/// Single-writer orchestrator owning all state of one match.
#[derive(Debug)]
pub struct MatchActor {
    ruleset: RulesetIR,
    ruleset_hash: String,
    state: MatchState,
    bus: EventBus,
    watchers: StateWatchers,
    stack: ResolutionStack,
    events: EventRegistry,
    reactions: ReactionRegistry,
    pending_inputs: Vec<PendingInput>,
    /// Events whose pre-reactions have been discovered but which have not
    /// resolved yet.
    activated_events: HashSet<EventId>,
    /// Turn components by definition, reused across turns.
    turn_components: HashMap<DefinitionId, ComponentId>,
    recursion_depth: u32,
    cycle_steps: u32,
    game_ended: bool,
    game_over_emitted: bool,
    next_input_id: u64,
}

impl MatchActor {
    /// Loads the ruleset and prepares an actor; no components exist until
    /// [Self::begin_game].
    pub fn new(id: MatchId, ruleset: Value, seed: Option<u64>) -> Result<Self, MatchError> {
        let ruleset_hash = crate::snapshot::ruleset_hash(&ruleset);
        let ruleset = RulesetIR::from_value(ruleset)?;
        let seed = seed.unwrap_or_else(|| seed_from_match_id(id));
        let mut state = MatchState::new(id, seed);
        state.constants = ruleset.constants.clone();

        Ok(Self {
            ruleset,
            ruleset_hash,
            state,
            bus: EventBus::default(),
            watchers: StateWatchers::default(),
            stack: ResolutionStack::default(),
            events: EventRegistry::default(),
            reactions: ReactionRegistry::default(),
            pending_inputs: vec![],
            activated_events: HashSet::new(),
            turn_components: HashMap::new(),
            recursion_depth: 0,
            cycle_steps: 0,
            game_ended: false,
            game_over_emitted: false,
            next_input_id: 0,
        })
    }

    // ------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------

    /// Initializes state from the ruleset, registers every component's
    /// triggers, emits `MatchStarted`, and runs until blocked.
    #[instrument(level = "debug", skip(self))]
    pub fn begin_game(&mut self) -> Result<GameLoopResult, MatchError> {
        if self.state.status != MatchStatus::Setup {
            return Err(MatchError::InvalidAction("match has already begun".to_string()));
        }

        let created = setup::instantiate_components(&self.ruleset, &mut self.state)?;
        for component in created {
            self.register_component_triggers(component);
        }
        self.register_system_triggers();

        let started = Event::new(
            EventType::MatchStarted,
            payload_object(json!({ "match_id": self.state.id.0 })),
        );
        let resolved = self.push_event_and_resolve(started);
        self.absorb_halt(resolved)?;

        self.run_loop()
    }

    /// Validates and executes a player action, then advances the match as
    /// far as it can go without further input.
    #[instrument(level = "debug", skip(self))]
    pub fn process_action(&mut self, action: &PlayerAction) -> Result<ActionOutcome, MatchError> {
        self.require_playing()?;
        if !self.pending_inputs.is_empty() {
            return Err(MatchError::InvalidAction(
                "match is suspended on a pending input".to_string(),
            ));
        }
        legal_actions::validate_action(&self.ruleset, &self.state, action)?;

        let costs = self
            .ruleset
            .action(action.action)
            .map(|definition| definition.costs.clone())
            .unwrap_or_default();
        resources::pay(&self.ruleset, &mut self.state, action.player_id, &costs)?;
        self.watchers.mark_dirty();

        let log_start = self.state.event_log.len();
        let event = Event::new(
            EventType::ExecuteAction,
            payload_object(json!({
                "action_id": action.action.0,
                "player_id": action.player_id,
            })),
        )
        .caused_by(ObjectRef::player(action.player_id));
        let resolved = self.push_event_and_resolve(event);
        self.absorb_halt(resolved)?;

        let result = self.run_loop()?;
        Ok(ActionOutcome { result, events: self.state.event_log[log_start..].to_vec() })
    }

    /// Completes a pending input and continues the paused resolution.
    #[instrument(level = "debug", skip(self, answers))]
    pub fn submit_input(
        &mut self,
        input_id: InputId,
        answers: &Map<String, Value>,
    ) -> Result<ActionOutcome, MatchError> {
        self.require_playing()?;
        let index = self
            .pending_inputs
            .iter()
            .position(|input| input.id == input_id)
            .ok_or_else(|| MatchError::InputMismatch(format!("no pending input {input_id}")))?;
        validate_input_answers(&self.pending_inputs[index], answers)?;
        let pending = self.pending_inputs.remove(index);

        // Record the answers where later edge conditions can see them.
        if let Some(component) = self.state.component_mut(pending.component) {
            if let Some(workflow) = &mut component.workflow {
                workflow
                    .metadata
                    .insert("last_input".to_string(), Value::Object(answers.clone()));
            }
        }

        let log_start = self.state.event_log.len();
        let step = workflow_executor::take_input_edge(
            &self.ruleset,
            &mut self.state,
            pending.component,
            pending.input_definition_id,
        );
        let outcome = match step {
            Ok(outcome) => outcome,
            Err(condition) => {
                // The edge is no longer available; restore the input so the
                // caller can retry.
                self.pending_inputs.insert(index, pending);
                return Err(
                    match_error_from(condition)
                        .unwrap_or_else(|| MatchError::Internal("input halt".to_string())),
                );
            }
        };

        if outcome == StepOutcome::Ended {
            let finished = if Some(pending.component) == self.state.current_phase {
                self.exit_phase()
            } else if Some(pending.component) == self.state.current_turn {
                self.end_turn()
            } else {
                OK
            };
            self.absorb_halt(finished)?;
        }

        let result = self.run_loop()?;
        Ok(ActionOutcome { result, events: self.state.event_log[log_start..].to_vec() })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn current_state(&self) -> &MatchState {
        &self.state
    }

    /// JSON view of the current state snapshot.
    pub fn state_json(&self) -> Value {
        serde_json::to_value(&self.state).unwrap_or(Value::Null)
    }

    pub fn available_actions(&self, player: ComponentId) -> Vec<AvailableAction> {
        legal_actions::available_actions(&self.ruleset, &self.state, player)
    }

    pub fn actions_for_object(
        &self,
        player: ComponentId,
        object_kind: SelectableObjectType,
        object_id: ComponentId,
    ) -> Vec<ObjectAction> {
        legal_actions::actions_for_object(&self.ruleset, &self.state, player, object_kind, object_id)
    }

    pub fn event_log(&self) -> &[Event] {
        &self.state.event_log
    }

    pub fn pending_input(&self) -> Option<&PendingInput> {
        self.pending_inputs.first()
    }

    pub fn ruleset(&self) -> &RulesetIR {
        &self.ruleset
    }

    pub fn snapshot(&self) -> crate::snapshot::MatchSnapshot {
        crate::snapshot::MatchSnapshot {
            match_id: self.state.id,
            seed: self.state.seed,
            ruleset_hash: self.ruleset_hash.clone(),
            event_log: self.state.event_log.clone(),
            pending_inputs: self.pending_inputs.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    /// Runs until player input is required or the match ends, translating
    /// halt conditions into the caller-facing result.
    fn run_loop(&mut self) -> Result<GameLoopResult, MatchError> {
        match self.run_until_blocked() {
            Ok(result) => Ok(result),
            Err(StopCondition::Prompt) => Ok(GameLoopResult::WaitingForInput),
            Err(StopCondition::GameOver) => {
                self.game_ended = true;
                let finished = self.finish_game();
                self.absorb_halt(finished)?;
                Ok(GameLoopResult::GameEnded)
            }
            Err(condition) => {
                self.absorb_halt(Err(condition))?;
                Ok(GameLoopResult::WaitingForInput)
            }
        }
    }

    /// Steps the game component's workflow until blocked or ended.
    fn run_until_blocked(&mut self) -> Out<GameLoopResult> {
        loop {
            if self.game_ended {
                self.finish_game()?;
                return Ok(GameLoopResult::GameEnded);
            }
            if !self.pending_inputs.is_empty() {
                return Ok(GameLoopResult::WaitingForInput);
            }
            match self.step_game()? {
                StepOutcome::Advanced => {}
                StepOutcome::Blocked => return Ok(GameLoopResult::WaitingForInput),
                StepOutcome::Ended => {
                    self.finish_game()?;
                    return Ok(GameLoopResult::GameEnded);
                }
            }
        }
    }

    /// One step of the Game → Turn → Phase hierarchy, innermost first.
    fn step_game(&mut self) -> Out<StepOutcome> {
        if let Some(phase) = self.state.current_phase {
            return self.step_phase(phase);
        }
        if self.state.current_turn.is_some() {
            return self.step_turn();
        }
        self.step_root()
    }

    /// Steps the Game component's own workflow.
    fn step_root(&mut self) -> Out<StepOutcome> {
        let game = self
            .state
            .game_component
            .with_error(|| "match has no game component".to_string())?;

        if self.state.component(game).map(|c| c.workflow.is_none()).unwrap_or(true) {
            let definition = self.game_definition()?;
            workflow_executor::enter_workflow(&mut self.state, game, &definition)?;
        }

        if let Some(node) = workflow_executor::current_node(&self.state, game) {
            if node.id == END_NODE_ID {
                return Ok(StepOutcome::Ended);
            }
            if let Some(turn_definition_id) = node.component_definition_id {
                if !self.turns_exhausted(turn_definition_id) {
                    self.begin_turn(turn_definition_id)?;
                    return Ok(StepOutcome::Advanced);
                }
                // Turn cap reached: fall through and step past the node.
            }
        }

        match workflow_executor::step_workflow(&self.ruleset, &mut self.state, game)? {
            StepOutcome::Advanced => Ok(StepOutcome::Advanced),
            StepOutcome::Ended => Ok(StepOutcome::Ended),
            StepOutcome::Blocked => {
                if self.ensure_pending_input(game) {
                    Ok(StepOutcome::Blocked)
                } else {
                    // A game workflow with no enabled transitions and no
                    // inputs cannot make progress.
                    Ok(StepOutcome::Ended)
                }
            }
        }
    }

    /// Advances the current Turn component's workflow: enters the phase
    /// linked from the current node, or steps onward.
    fn step_turn(&mut self) -> Out<StepOutcome> {
        let turn = self.state.current_turn.with_error(|| "no current turn".to_string())?;

        if let Some(node) = workflow_executor::current_node(&self.state, turn) {
            if let Some(phase_definition_id) = node.component_definition_id {
                if self.state.current_phase.is_none() {
                    self.enter_phase(phase_definition_id)?;
                    return Ok(StepOutcome::Advanced);
                }
            }
        }

        match workflow_executor::step_workflow(&self.ruleset, &mut self.state, turn)? {
            StepOutcome::Advanced => Ok(StepOutcome::Advanced),
            StepOutcome::Ended => {
                self.end_turn()?;
                Ok(StepOutcome::Advanced)
            }
            StepOutcome::Blocked => {
                if self.ensure_pending_input(turn) {
                    Ok(StepOutcome::Blocked)
                } else {
                    self.end_turn()?;
                    Ok(StepOutcome::Advanced)
                }
            }
        }
    }

    /// Steps the current Phase component: advance its workflow, wait on
    /// inputs, or auto-exit when no legal actions remain.
    fn step_phase(&mut self, phase: ComponentId) -> Out<StepOutcome> {
        match workflow_executor::step_workflow(&self.ruleset, &mut self.state, phase)? {
            StepOutcome::Advanced => return Ok(StepOutcome::Advanced),
            StepOutcome::Ended => {
                self.exit_phase()?;
                return Ok(StepOutcome::Advanced);
            }
            StepOutcome::Blocked => {}
        }

        if self.ensure_pending_input(phase) {
            return Ok(StepOutcome::Blocked);
        }

        if self.phase_can_exit() {
            self.exit_phase()?;
            return Ok(StepOutcome::Advanced);
        }
        Ok(StepOutcome::Blocked)
    }

    /// The phase can exit iff no legal actions remain for the active
    /// player, the declared exit type allows it, and the phase workflow
    /// permits exit.
    fn phase_can_exit(&self) -> bool {
        if let Some(player) = self.state.active_player {
            if !legal_actions::available_actions(&self.ruleset, &self.state, player).is_empty() {
                return false;
            }
        }
        if let Some(phase_id) = self.state.current_phase_id {
            if let Some(phase) = self.ruleset.phase(phase_id) {
                if phase.exit_type == PhaseExitType::UserExit {
                    return false;
                }
            }
        }
        match self.state.current_phase {
            Some(phase) => workflow_executor::can_exit_workflow(&self.ruleset, &self.state, phase),
            None => true,
        }
    }

    // ------------------------------------------------------------------
    // Turn and phase boundaries
    // ------------------------------------------------------------------

    fn begin_turn(&mut self, definition_id: DefinitionId) -> Outcome {
        let definition = self.definition(definition_id)?;
        let turn = match self.turn_components.get(&definition_id) {
            Some(turn) => *turn,
            None => {
                let turn = self.state.components.create(&definition, None, None);
                self.register_component_triggers(turn);
                self.turn_components.insert(definition_id, turn);
                turn
            }
        };
        workflow_executor::enter_workflow(&mut self.state, turn, &definition)?;
        self.state.current_turn = Some(turn);

        debug!(turn_number = self.state.turn_number, "Turn started");
        self.push_event_and_resolve(Event::new(
            EventType::TurnStarted,
            payload_object(json!({
                "turn_number": self.state.turn_number,
                "turn": definition.name,
            })),
        ))
    }

    /// Ends the current turn: emits `TurnEnded`, advances the turn number,
    /// rotates the active player, and applies per-turn resource
    /// housekeeping.
    fn end_turn(&mut self) -> Outcome {
        let Some(_) = self.state.current_turn.take() else {
            warn!("end_turn with no current turn, skipping");
            return OK;
        };

        self.push_event_and_resolve(Event::new(
            EventType::TurnEnded,
            payload_object(json!({ "turn_number": self.state.turn_number })),
        ))?;

        self.state.turn_number += 1;
        self.rotate_active_player();
        resources::turn_rollover(&self.ruleset, &mut self.state);
        self.watchers.mark_dirty();
        OK
    }

    fn enter_phase(&mut self, definition_id: DefinitionId) -> Outcome {
        let definition = self.definition(definition_id)?;
        let phase = self.state.components.create(&definition, None, None);
        self.register_component_triggers(phase);
        workflow_executor::enter_workflow(&mut self.state, phase, &definition)?;

        let phase_id = phase_payload_id(&definition);
        self.state.current_phase = Some(phase);
        self.state.current_phase_id = Some(DefinitionId(phase_id as u32));

        debug!(phase = %definition.name, "Phase started");
        self.push_event_and_resolve(Event::new(
            EventType::PhaseStarted,
            payload_object(json!({
                "phase": definition.name,
                "phase_id": phase_id,
            })),
        ))
    }

    /// Exits the current phase: emits `PhaseEnded`, destroys the phase
    /// component, and advances the enclosing turn workflow one step.
    fn exit_phase(&mut self) -> Outcome {
        let Some(phase) = self.state.current_phase.take() else {
            warn!("exit_phase with no current phase, skipping");
            return OK;
        };
        let (name, phase_id) = match self.state.component(phase) {
            Some(component) => (
                component.name.clone(),
                component.property_i64("phase_id").unwrap_or(component.definition_id.0 as i64),
            ),
            None => ("unknown".to_string(), 0),
        };

        debug!(phase = %name, "Phase ended");
        self.push_event_and_resolve(Event::new(
            EventType::PhaseEnded,
            payload_object(json!({ "phase": name, "phase_id": phase_id })),
        ))?;

        self.bus.unsubscribe_all_from_component(phase);
        self.watchers.unregister_watchers_from_source(phase);
        self.state.components.destroy(phase);
        self.state.current_phase_id = None;

        if self.game_ended {
            return OK;
        }
        let Some(turn) = self.state.current_turn else {
            return OK;
        };
        match workflow_executor::step_workflow(&self.ruleset, &mut self.state, turn)? {
            StepOutcome::Advanced => OK,
            StepOutcome::Ended => self.end_turn(),
            StepOutcome::Blocked => {
                self.ensure_pending_input(turn);
                OK
            }
        }
    }

    /// Emits the final `GameEnded` event exactly once and closes out the
    /// match.
    fn finish_game(&mut self) -> Outcome {
        if self.game_over_emitted {
            return OK;
        }
        self.game_over_emitted = true;
        self.game_ended = true;
        debug!("Game ended");
        self.push_event_and_resolve(Event::new(
            EventType::GameEnded,
            payload_object(json!({ "game_id": self.state.id.0 })),
        ))
    }

    fn rotate_active_player(&mut self) {
        let Some(active) = self.state.active_player else {
            return;
        };
        if self.state.player_ids.is_empty() {
            return;
        }
        let index = self
            .state
            .player_ids
            .iter()
            .position(|p| *p == active)
            .unwrap_or(0);
        let next = (index + 1) % self.state.player_ids.len();
        self.state.active_player = Some(self.state.player_ids[next]);
    }

    /// True when the turn definition's (or turn structure's) turn cap has
    /// been spent.
    fn turns_exhausted(&self, turn_definition_id: DefinitionId) -> bool {
        let max_turns = self
            .ruleset
            .component(turn_definition_id)
            .and_then(|definition| definition.max_turns_per_player)
            .or(self.ruleset.turn_structure.max_turns_per_player);
        match max_turns {
            Some(max) => self.state.turn_number > max,
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Stack resolution
    // ------------------------------------------------------------------

    /// Registers an event, stamps its order from the stack counter, and
    /// pushes its handle.
    fn push_event(&mut self, event: Event) -> EventId {
        let id = self.events.register(event);
        let order = self.stack.next_order();
        if let Some(event) = self.events.get_mut(id) {
            event.order = order;
        }
        self.stack.push(StackItem {
            reference: StackRef::Event(id),
            created_at_order: order,
            flags: Map::new(),
        });
        id
    }

    fn push_event_and_resolve(&mut self, event: Event) -> Outcome {
        self.push_event(event);
        self.resolve_stack()
    }

    /// Drains the stack to quiescence, then repeatedly runs state-based
    /// watchers until neither produces further work.
    ///
    /// Re-entrant: applying an event may call back into the actor (phase
    /// exit, turn end), which resolves nested. The recursion guard fails
    /// fast on pathological rulesets.
    fn resolve_stack(&mut self) -> Outcome {
        self.recursion_depth += 1;
        if self.recursion_depth == 1 {
            self.cycle_steps = 0;
        }
        let result = self.resolve_stack_guarded();
        self.recursion_depth -= 1;
        result
    }

    fn resolve_stack_guarded(&mut self) -> Outcome {
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(MatchError::ResolutionOverflow(format!(
                "nested resolution exceeded depth {MAX_RECURSION_DEPTH}"
            ))
            .into());
        }

        let mut watcher_iterations = 0;
        loop {
            self.drain_stack()?;
            if self.game_ended {
                return OK;
            }

            let fired = self.watchers.check_watchers(&self.ruleset, &self.state);
            if fired.is_empty() {
                return OK;
            }
            watcher_iterations += 1;
            if watcher_iterations > MAX_WATCHER_ITERATIONS {
                return Err(MatchError::ResolutionOverflow(format!(
                    "state watchers exceeded {MAX_WATCHER_ITERATIONS} rounds"
                ))
                .into());
            }

            debug!(count = fired.len(), "State watchers triggered");
            for watcher in fired {
                let caused_by = ObjectRef::component(watcher.source);
                let produced = rule_executor::run_effects(
                    &self.ruleset,
                    &self.state,
                    &watcher.trigger.effects,
                    caused_by,
                )?;
                for event in produced.into_iter().rev() {
                    self.push_event(event);
                }
            }
        }
    }

    /// The core LIFO loop: peek for pre-reaction discovery, pop, resolve.
    fn drain_stack(&mut self) -> Outcome {
        while let Some(top) = self.stack.peek().cloned() {
            self.cycle_steps += 1;
            if self.cycle_steps > MAX_CYCLE_STEPS {
                return Err(MatchError::ResolutionOverflow(format!(
                    "resolution cycle exceeded {MAX_CYCLE_STEPS} steps"
                ))
                .into());
            }

            match top.reference {
                StackRef::Event(id) => {
                    if !self.activated_events.contains(&id) {
                        self.activated_events.insert(id);
                        let pre = self.discover_pre_reactions(id);
                        if !pre.is_empty() {
                            // Push in reverse so the first registered
                            // reaction resolves first, before the event.
                            for reaction in pre.into_iter().rev() {
                                let reaction_id = self.reactions.register(reaction);
                                self.stack.push_ref(StackRef::Reaction(reaction_id));
                            }
                            continue;
                        }
                    }
                    self.stack.pop();
                    self.activated_events.remove(&id);
                    let result = self.resolve_event(id);
                    // Scope-guarded cleanup: reclaim on failure too.
                    self.events.unregister(id);
                    result?;
                }
                StackRef::Reaction(id) => {
                    self.stack.pop();
                    let result = self.resolve_reaction(id);
                    self.reactions.unregister(id);
                    result?;
                }
            }
        }
        OK
    }

    fn discover_pre_reactions(&self, id: EventId) -> Vec<Reaction> {
        let Some(event) = self.events.get(id) else {
            return vec![];
        };
        self.bus
            .dispatch(&self.ruleset, &self.state, event)
            .into_iter()
            .filter(|reaction| reaction.timing == Timing::Pre)
            .collect()
    }

    /// Applies one event: post-reaction discovery, state mutation,
    /// workflow-control semantics, then post-reactions.
    fn resolve_event(&mut self, id: EventId) -> Outcome {
        let Some(event) = self.events.get(id).cloned() else {
            warn!(%id, "event missing from registry, dropping stack item");
            return OK;
        };
        debug!(event_type = %event.event_type, "Resolving event");

        let post: Vec<Reaction> = self
            .bus
            .dispatch(&self.ruleset, &self.state, &event)
            .into_iter()
            .filter(|reaction| reaction.timing == Timing::Post)
            .collect();

        apply::apply(&self.ruleset, &mut self.state, &event);
        self.watchers.mark_dirty();

        match &event.event_type {
            EventType::NextPhase | EventType::PhaseEndRequested => self.exit_phase()?,
            EventType::NextTurn | EventType::TurnEndRequested => self.end_turn()?,
            EventType::EndGame => {
                self.game_ended = true;
                self.stack.clear();
            }
            EventType::ExecuteAction => self.run_action_rules(&event)?,
            EventType::CardMoved => {
                // Entering a zone is its own observable moment for
                // triggers ("when a card enters play").
                if let (Some(card), Some(zone)) =
                    (event.payload_field("card_id"), event.payload_field("to_zone"))
                {
                    let mut entered = Event::new(
                        EventType::CardEntered,
                        payload_object(json!({ "card_id": card, "zone": zone })),
                    );
                    entered.caused_by = event.caused_by;
                    self.push_event(entered);
                }
            }
            _ => {}
        }

        for reaction in post.into_iter().rev() {
            let reaction_id = self.reactions.register(reaction);
            self.stack.push_ref(StackRef::Reaction(reaction_id));
        }
        OK
    }

    /// Runs the bound action definition's rule list, pushing produced
    /// events in reverse so the first resolves first.
    fn run_action_rules(&mut self, event: &Event) -> Outcome {
        let action_id = event
            .payload_field("action_id")
            .and_then(Value::as_u64)
            .map(|id| DefinitionId(id as u32));
        let Some(definition) = action_id.and_then(|id| self.ruleset.action(id)).cloned() else {
            warn!("ExecuteAction references an unknown action, dropping");
            return OK;
        };
        let caused_by = event
            .caused_by
            .or(self.state.active_player.map(ObjectRef::player))
            .with_error(|| "no cause for action execution".to_string())?;

        let mut produced = vec![];
        for rule_id in &definition.execute_rules {
            produced.extend(rule_executor::execute_rule(
                &self.ruleset,
                &self.state,
                *rule_id,
                caused_by,
            )?);
        }
        produced.push(
            Event::new(
                EventType::ActionExecuted,
                payload_object(json!({
                    "action_id": definition.id.0,
                    "player_id": caused_by.id,
                })),
            )
            .caused_by(caused_by),
        );

        for event in produced.into_iter().rev() {
            self.push_event(event);
        }
        OK
    }

    /// Executes a reaction's effect pipeline, pushing produced events in
    /// reverse.
    fn resolve_reaction(&mut self, id: ReactionId) -> Outcome {
        let Some(reaction) = self.reactions.get(id).cloned() else {
            warn!(%id, "reaction missing from registry, dropping stack item");
            return OK;
        };
        debug!(trigger = %reaction.trigger_id, "Resolving reaction");

        let produced = rule_executor::run_effects(
            &self.ruleset,
            &self.state,
            &reaction.effects,
            reaction.caused_by,
        )?;
        for event in produced.into_iter().rev() {
            self.push_event(event);
        }
        self.watchers.mark_dirty();
        OK
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Creates a pending input for the component's current Input edges, if
    /// any. Returns true when the component is (now) waiting on an input.
    fn ensure_pending_input(&mut self, component: ComponentId) -> bool {
        if self.pending_inputs.iter().any(|input| input.component == component) {
            return true;
        }

        let edge = workflow_executor::valid_transitions(&self.ruleset, &self.state, component)
            .into_iter()
            .find(|edge| edge.is_input());
        let Some(WorkflowEdge::Input { trigger_input_id, kind, constraints, .. }) = edge else {
            return false;
        };

        self.next_input_id += 1;
        let for_players = input_players(&constraints, &self.state.player_ids, self.state.active_player);
        let pending = PendingInput::builder()
            .id(InputId(self.next_input_id))
            .input_definition_id(trigger_input_id)
            .component(component)
            .for_players(for_players)
            .kind(kind)
            .constraints(constraints)
            .build();
        debug!(input = %pending.id, "Pending input created");
        self.pending_inputs.push(pending);
        true
    }

    // ------------------------------------------------------------------
    // Registration and plumbing
    // ------------------------------------------------------------------

    /// Registers a component's event triggers with the bus and its
    /// state-based triggers with the watcher engine.
    fn register_component_triggers(&mut self, component_id: ComponentId) {
        let Some(component) = self.state.component(component_id) else {
            return;
        };
        let triggers = component.triggers.clone();
        let metadata = component.metadata.clone();
        for trigger in triggers {
            if trigger.is_state_based() {
                self.watchers.register_watcher(trigger, component_id);
            } else if let Some(when) = &trigger.when {
                let event_type = EventType::from(when.event_type.as_str());
                self.bus.subscribe(event_type, trigger, component_id, metadata.clone());
            }
        }
    }

    /// System triggers attach to the game component.
    fn register_system_triggers(&mut self) {
        let Some(game) = self.state.game_component else {
            return;
        };
        for trigger in self.ruleset.system_triggers.clone() {
            if trigger.is_state_based() {
                self.watchers.register_watcher(trigger, game);
            } else if let Some(when) = &trigger.when {
                let event_type = EventType::from(when.event_type.as_str());
                self.bus.subscribe(event_type, trigger, game, Map::new());
            }
        }
    }

    fn game_definition(&self) -> Out<ComponentDefinition> {
        self.ruleset
            .game_component
            .clone()
            .with_error(|| "ruleset has no game component".to_string())
    }

    fn definition(&self, id: DefinitionId) -> Out<ComponentDefinition> {
        self.ruleset
            .component(id)
            .cloned()
            .with_error(|| format!("unknown component definition {id}"))
    }

    fn require_playing(&self) -> Result<(), MatchError> {
        match self.state.status {
            MatchStatus::Playing => Ok(()),
            MatchStatus::Setup => {
                Err(MatchError::InvalidAction("match has not begun".to_string()))
            }
            MatchStatus::GameOver => {
                Err(MatchError::InvalidAction("match is over".to_string()))
            }
            MatchStatus::Failed => {
                Err(MatchError::InvalidAction("match is in a failed state".to_string()))
            }
        }
    }

    /// Converts an internal halt into the caller-facing error, marking the
    /// match failed on fatal kinds.
    fn absorb_halt(&mut self, outcome: Outcome) -> Result<(), MatchError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(StopCondition::Prompt) => Ok(()),
            Err(StopCondition::GameOver) => {
                self.game_ended = true;
                Ok(())
            }
            Err(StopCondition::Error(report)) => {
                let error = report
                    .downcast::<MatchError>()
                    .unwrap_or_else(|r| MatchError::Internal(r.to_string()));
                if matches!(
                    error,
                    MatchError::ResolutionOverflow(_) | MatchError::Internal(_)
                ) {
                    warn!(%error, "match failed");
                    self.state.status = MatchStatus::Failed;
                    self.game_ended = true;
                }
                Err(error)
            }
        }
    }
}

/// Stable seed derived from the match id when the host provides none.
fn seed_from_match_id(id: MatchId) -> u64 {
    let bytes = id.0.as_bytes();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(seed)
}

/// The numeric phase id carried in `PhaseStarted`/`PhaseEnded` payloads:
/// the turn-structure phase id when the definition records one, the
/// definition id otherwise.
fn phase_payload_id(definition: &ComponentDefinition) -> i64 {
    definition
        .properties
        .get("phase_id")
        .and_then(Value::as_i64)
        .unwrap_or(definition.id.0 as i64)
}

/// Player set answering an input: everyone when the constraints say
/// `"players": "all"`, otherwise the active player.
fn input_players(
    constraints: &Map<String, Value>,
    players: &[ComponentId],
    active: Option<ComponentId>,
) -> Vec<ComponentId> {
    match constraints.get("players").and_then(Value::as_str) {
        Some("all") => players.to_vec(),
        _ => active.into_iter().collect(),
    }
}

/// Light structural validation of submitted answers against the input's
/// constraints.
fn validate_input_answers(
    pending: &PendingInput,
    answers: &Map<String, Value>,
) -> Result<(), MatchError> {
    if answers.is_empty() && pending.kind != InputKind::Confirm {
        return Err(MatchError::InputMismatch("no answers submitted".to_string()));
    }
    if let Some(options) = pending.constraints.get("options").and_then(Value::as_array) {
        for value in answers.values() {
            let chosen: Vec<&Value> = match value {
                Value::Array(values) => values.iter().collect(),
                other => vec![other],
            };
            for choice in chosen {
                if !options.contains(choice) {
                    return Err(MatchError::InputMismatch(format!(
                        "answer {choice} is not among the allowed options"
                    )));
                }
            }
        }
    }
    Ok(())
}
