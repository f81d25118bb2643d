// Copyright 2025 0xjcf
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crate-wide error taxonomy.
//!
//! One `thiserror`-derived enum covers every failure mode in the design,
//! rather than a bespoke error type per module.

use thiserror::Error;

use crate::graph::StateId;

/// Which kind of callback failed, for [`EngineError::ActionFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Entry,
    Exit,
    Transition,
    Initial,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Entry => "entry",
            ActionKind::Exit => "exit",
            ActionKind::Transition => "transition",
            ActionKind::Initial => "initial",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed state graph: {0}")]
    MalformedGraph(String),

    #[error("runtime has not been started")]
    NotStarted,

    #[error("runtime has already been started")]
    AlreadyStarted,

    #[error("event queue is full")]
    QueueFull,

    #[error("parallel region {region} exceeded its {phase} deadline")]
    RegionTimeout { region: StateId, phase: &'static str },

    #[error("history state {history_state} has no recorded configuration and no default")]
    HistoryUnresolved { history_state: StateId },

    #[error("{kind} action on state {state} failed: {message}")]
    ActionFailure {
        state: StateId,
        kind: ActionKind,
        message: String,
    },
}
