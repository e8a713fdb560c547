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

use color_eyre::eyre::eyre;

use crate::outcome::{StopCondition, Value};

/// Converts an [Option] into a [Value], attaching a lazily-evaluated error
/// message to the `None` case.
pub trait WithError<T> {
    fn with_error(self, message: impl FnOnce() -> String) -> Value<T>;
}

impl<T> WithError<T> for Option<T> {
    fn with_error(self, message: impl FnOnce() -> String) -> Value<T> {
        match self {
            Some(value) => Ok(value),
            None => Err(StopCondition::Error(eyre!(message()))),
        }
    }
}
