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

pub mod outcome;
pub mod with_error;

/// Returns an error with the provided format string from the current function
/// if the `$expr` condition is not true.
#[macro_export]
macro_rules! verify {
    ($expr:expr, $($arg:tt)*) => {
        if !($expr) {
            return Err($crate::outcome::StopCondition::Error(
                ::color_eyre::eyre::eyre!($($arg)*),
            ));
        }
    };
}

/// Returns an error with the provided format string from the current function.
#[macro_export]
macro_rules! fail {
    ($($arg:tt)*) => {
        return Err($crate::outcome::StopCondition::Error(
            ::color_eyre::eyre::eyre!($($arg)*),
        ))
    };
}
