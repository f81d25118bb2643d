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

//! Boxed, value-carrying callables for guards, entry/exit actions, and
//! transition actions.
//!
//! Modeled as `Arc<dyn Fn(...) -> Result<...>>` rather than a trait object
//! per callback kind, following the "dynamic dispatch of actions/guards"
//! design note: a callable may be absent, represented by `None` rather than
//! a dedicated no-op variant.

use std::sync::Arc;

use crate::event::Event;
use crate::graph::StateId;

/// Result type for entry/exit/transition actions.
pub type ActionResult = Result<(), String>;

/// `(context, event-or-none, from, to) -> Result<(), String>`
pub type BoxedAction<Ctx> =
    Arc<dyn Fn(&mut Ctx, Option<&Event>, StateId, StateId) -> ActionResult + Send + Sync>;

/// `(context, event-or-none, from, to) -> Result<bool, String>`
pub type BoxedGuard<Ctx> =
    Arc<dyn Fn(&Ctx, Option<&Event>, StateId, StateId) -> Result<bool, String> + Send + Sync>;

/// Wrap a plain closure as a [`BoxedAction`].
pub fn action<Ctx, F>(f: F) -> BoxedAction<Ctx>
where
    F: Fn(&mut Ctx, Option<&Event>, StateId, StateId) -> ActionResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a plain closure as a [`BoxedGuard`].
pub fn guard<Ctx, F>(f: F) -> BoxedGuard<Ctx>
where
    F: Fn(&Ctx, Option<&Event>, StateId, StateId) -> Result<bool, String> + Send + Sync + 'static,
{
    Arc::new(f)
}
