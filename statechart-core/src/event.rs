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

//! Event ids, sentinels, and the event envelope delivered to the engine.

use std::sync::Arc;

use crate::graph::StateId;

/// Identifier for an event. Negative ids are reserved for synthetic events
/// (done events, the wildcard sentinel); ordinary external event ids are
/// non-negative.
pub type EventId = i64;

/// Sentinel marking an eventless transition. Never produced by an external
/// caller; only [`crate::executor`] searches for it during microstep
/// processing.
pub const NO_EVENT: EventId = 0;

/// Wildcard sentinel: a transition carrying this id matches any event except
/// [`NO_EVENT`].
pub const ANY_EVENT: EventId = EventId::MIN;

/// Hard cap on eventless/internal iterations within a single macrostep.
pub const MAX_MICROSTEPS: u32 = 100;

/// Maps a compound/parallel state id to the deterministic id of its done
/// event: callers subscribe to this id to react to completion of `state`.
#[must_use]
pub fn done_event_id(state: StateId) -> EventId {
    -(1_000_000 + i64::from(state))
}

/// Returns true when `event` matches a transition declared for `declared`.
#[must_use]
pub fn event_matches(declared: EventId, incoming: EventId) -> bool {
    if declared == ANY_EVENT {
        incoming != NO_EVENT
    } else {
        declared == incoming
    }
}

/// An event flowing through the engine: an id, an opaque payload, and an
/// optional address (0 = broadcast, non-zero targets one parallel region).
#[derive(Clone)]
pub struct Event {
    pub id: EventId,
    pub payload: Option<Arc<dyn std::any::Any + Send + Sync>>,
    pub address: StateId,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("has_payload", &self.payload.is_some())
            .field("address", &self.address)
            .finish()
    }
}

impl Event {
    #[must_use]
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            payload: None,
            address: 0,
        }
    }

    #[must_use]
    pub fn with_payload(id: EventId, payload: Arc<dyn std::any::Any + Send + Sync>) -> Self {
        Self {
            id,
            payload: Some(payload),
            address: 0,
        }
    }

    #[must_use]
    pub fn addressed(mut self, address: StateId) -> Self {
        self.address = address;
        self
    }

    pub(crate) fn eventless() -> Self {
        Self::new(NO_EVENT)
    }
}
