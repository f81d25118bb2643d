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

//! Optional diagnostic hook. Not part of the core contract (the engine
//! works fine with the default no-op) but lets a caller observe macrostep
//! boundaries, microstep counts, and discarded-history events without the
//! engine depending on any particular logging backend.

use crate::graph::StateId;

#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    MacrostepStarted { leaf: StateId, event_id: crate::event::EventId },
    MacrostepStable { leaf: StateId, microsteps: u32 },
    MicrostepLimitExceeded { leaf: StateId },
    HistoryUnresolved { history_state: StateId },
    RegionTimeout { region: StateId, phase: &'static str },
}

pub trait Diagnostics: Send + Sync {
    fn on_event(&self, _event: DiagnosticEvent) {}
}

/// Default diagnostics backend: forwards everything to `tracing`.
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn on_event(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::MacrostepStarted { leaf, event_id } => {
                tracing::trace!(leaf, event_id, "macrostep started");
            }
            DiagnosticEvent::MacrostepStable { leaf, microsteps } => {
                tracing::trace!(leaf, microsteps, "macrostep stable");
            }
            DiagnosticEvent::MicrostepLimitExceeded { leaf } => {
                tracing::error!(leaf, "microstep limit exceeded, macrostep terminated");
            }
            DiagnosticEvent::HistoryUnresolved { history_state } => {
                tracing::warn!(history_state, "history target unresolved, transition failed");
            }
            DiagnosticEvent::RegionTimeout { region, phase } => {
                tracing::error!(region, phase, "parallel region exceeded its deadline");
            }
        }
    }
}

/// Diagnostics backend that silently drops every event, useful in tests
/// that only care about the resulting configuration.
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {}
