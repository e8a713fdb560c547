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

use color_eyre::Report;
use thiserror::Error;
use utils::outcome::StopCondition;

/// Error taxonomy for match execution.
///
/// Query APIs return these directly. The resolution pipeline reports fatal
/// kinds through [StopCondition::Error]; non-fatal inconsistencies
/// ([MatchError::UnknownReference]) are logged and dropped so that slightly
/// malformed rulesets can still make progress.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    /// Schema violation detected at load; fatal for the match.
    #[error("malformed ruleset: {0}")]
    MalformedRuleset(String),

    /// Action fails preconditions, costs, or targeting. No state mutation
    /// occurred and no event was emitted.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Submitted answers fail the pending input's constraints. The caller
    /// may retry.
    #[error("input mismatch: {0}")]
    InputMismatch(String),

    /// An event, reaction, rule, or component id was not found in its
    /// registry at resolution time.
    #[error("unknown {kind} reference: {id}")]
    UnknownReference { kind: &'static str, id: u64 },

    /// Recursion depth or state-watcher iteration cap exceeded. The match
    /// transitions to a failed state and no further actions are accepted.
    #[error("resolution overflow: {0}")]
    ResolutionOverflow(String),

    /// Invariant violation; fatal for the match.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MatchError> for StopCondition {
    fn from(error: MatchError) -> Self {
        StopCondition::Error(Report::new(error))
    }
}

/// Extracts the typed [MatchError] from a halt condition at the API
/// boundary. Prompt and game-over halts are not errors and map to `None`.
pub fn match_error_from(condition: StopCondition) -> Option<MatchError> {
    match condition {
        StopCondition::Prompt | StopCondition::GameOver => None,
        StopCondition::Error(report) => Some(
            report.downcast::<MatchError>().unwrap_or_else(|r| MatchError::Internal(r.to_string())),
        ),
    }
}
