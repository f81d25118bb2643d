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

//! A hierarchical statechart engine: SCXML-style semantics (compound,
//! parallel, final, and history pseudo-states) over a dense integer state
//! graph, driven by either of two interchangeable dispatch runtimes.
//!
//! Building a chart is a two-step process: assemble a `Vec<StateInput<Ctx>>`
//! (directly, or incrementally via [`graph::GraphBuilder`]) and pass it to
//! [`graph::StateGraph::build`]. The resulting graph is immutable and can be
//! shared freely (wrap it in an `Arc`) across as many [`executor::Engine`]
//! instances, or runtime front-ends, as needed.

pub mod action;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod executor;
pub mod graph;
pub mod history;
pub mod parallel;
pub mod path;
pub mod runtime;
pub mod selector;

pub use action::{action, guard, ActionResult, BoxedAction, BoxedGuard};
pub use diagnostics::{DiagnosticEvent, Diagnostics, NoopDiagnostics, TracingDiagnostics};
pub use error::{ActionKind, EngineError};
pub use event::{done_event_id, Event, EventId, ANY_EVENT, MAX_MICROSTEPS, NO_EVENT};
pub use executor::Engine;
pub use graph::{GraphBuilder, StateGraph, StateId, StateInput, StateKind, StateNode, Transition, NONE_ID};
pub use runtime::event_driven::EventDrivenRuntime;
pub use runtime::tick::TickRuntime;
pub use runtime::{EventDrivenConfig, TickConfig};
