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

//! Evaluation of the ruleset expression language against match state.

use data::core::primitives::ComponentId;
use data::match_states::event::Event;
use data::match_states::match_state::MatchState;
use data::rulesets::expressions::{NumExpr, Predicate, Selector};
use data::rulesets::ruleset_ir::RulesetIR;
use tracing::warn;
use utils::outcome::Value;
use utils::{fail, with_error::WithError};

/// The bindings an expression is evaluated under.
///
/// `source` is the component `self` (or `it`, inside a filter) resolves to.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalContext<'a> {
    pub source: Option<ComponentId>,
    pub event: Option<&'a Event>,
}

impl<'a> EvalContext<'a> {
    pub fn with_source(source: ComponentId) -> Self {
        Self { source: Some(source), event: None }
    }

    /// Rebinds `self`/`it` to a new source, keeping the event binding.
    pub fn rebound(&self, source: ComponentId) -> Self {
        Self { source: Some(source), event: self.event }
    }
}

/// Evaluates a numeric expression.
pub fn evaluate_num(
    ruleset: &RulesetIR,
    state: &MatchState,
    ctx: &EvalContext<'_>,
    expr: &NumExpr,
) -> Value<i64> {
    match expr {
        NumExpr::Const { value } => Ok(*value),
        NumExpr::Prop { path } => {
            let source = ctx.source.with_error(|| {
                format!("property access {:?} evaluated without a source binding", path)
            })?;
            resolve_property(ruleset, state, source, &path.1)
        }
        NumExpr::Add { a, b } => {
            Ok(evaluate_num(ruleset, state, ctx, a)? + evaluate_num(ruleset, state, ctx, b)?)
        }
        NumExpr::Sub { a, b } => {
            Ok(evaluate_num(ruleset, state, ctx, a)? - evaluate_num(ruleset, state, ctx, b)?)
        }
    }
}

/// Resolves a numeric field on a component: the property bag first, then
/// the current amount of a resource with a matching name, then the built-in
/// `turn_number`.
fn resolve_property(
    ruleset: &RulesetIR,
    state: &MatchState,
    source: ComponentId,
    field: &str,
) -> Value<i64> {
    let component =
        state.component(source).with_error(|| "unknown component in expression".to_string())?;
    if let Some(value) = component.property_i64(field) {
        return Ok(value);
    }
    if let Some(definition) = ruleset.component(component.definition_id) {
        if let Some(resource) = definition.resources.iter().find(|r| r.name == field) {
            if let Some(instance) = component.resources.get(&resource.id) {
                return Ok(instance.current);
            }
        }
    }
    if field == "turn_number" {
        return Ok(state.turn_number as i64);
    }
    fail!("component {} has no numeric field {field}", component.name)
}

/// Evaluates a boolean expression.
pub fn evaluate_predicate(
    ruleset: &RulesetIR,
    state: &MatchState,
    ctx: &EvalContext<'_>,
    predicate: &Predicate,
) -> Value<bool> {
    match predicate {
        Predicate::Gt { a, b } => {
            Ok(evaluate_num(ruleset, state, ctx, a)? > evaluate_num(ruleset, state, ctx, b)?)
        }
        Predicate::Eq { a, b } => {
            Ok(evaluate_num(ruleset, state, ctx, a)? == evaluate_num(ruleset, state, ctx, b)?)
        }
        Predicate::And { all } => {
            for p in all {
                if !evaluate_predicate(ruleset, state, ctx, p)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Evaluates a predicate, treating evaluation failure as "does not hold".
///
/// Used where a broken condition in a ruleset should disable its owner
/// rather than halt the match: trigger conditions, edge conditions,
/// watcher conditions.
pub fn predicate_holds(
    ruleset: &RulesetIR,
    state: &MatchState,
    ctx: &EvalContext<'_>,
    predicate: &Predicate,
) -> bool {
    match evaluate_predicate(ruleset, state, ctx, predicate) {
        Ok(result) => result,
        Err(condition) => {
            warn!(?condition, "condition evaluation failed, treating as false");
            false
        }
    }
}

/// Evaluates a selector to the components it currently yields.
///
/// Union results are deduplicated preserving first-occurrence order, so
/// selector evaluation stays deterministic.
pub fn evaluate_selector(
    ruleset: &RulesetIR,
    state: &MatchState,
    ctx: &EvalContext<'_>,
    selector: &Selector,
) -> Value<Vec<ComponentId>> {
    match selector {
        Selector::Zone { name } => Ok(state.components.in_zone(name).to_vec()),
        Selector::Filter { input, predicate } => {
            let mut result = vec![];
            for candidate in evaluate_selector(ruleset, state, ctx, input)? {
                let sub = ctx.rebound(candidate);
                if evaluate_predicate(ruleset, state, &sub, predicate)? {
                    result.push(candidate);
                }
            }
            Ok(result)
        }
        Selector::Union { selectors } => {
            let mut result: Vec<ComponentId> = vec![];
            for s in selectors {
                for id in evaluate_selector(ruleset, state, ctx, s)? {
                    if !result.contains(&id) {
                        result.push(id);
                    }
                }
            }
            Ok(result)
        }
    }
}
