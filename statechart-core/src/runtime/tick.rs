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

//! Tick-based runtime (C6b): a bounded batch of pending events, applied in
//! one deterministic burst per fixed-period tick.
//!
//! `send_event` tags each event with a monotonic sequence number and the
//! caller's priority, then appends to the batch (`QueueFull` once the batch
//! reaches `max_events_per_tick`, never a silent drop). Each call to
//! [`TickRuntime::tick`]:
//!
//! 1. takes the whole batch and sorts it by `(priority desc, sequence asc)`
//!    with a stable sort so same-priority events keep arrival order;
//! 2. applies each event's initial transition via [`Engine::apply_event_no_drain`];
//! 3. drains the internal queue and eventless transitions once, via
//!    [`Engine::drain_to_stable`];
//! 4. increments the tick counter.
//!
//! Transition logic runs single-threaded on whichever thread calls `tick`;
//! the only synchronization is the batch mutex guarding concurrent
//! `send_event` callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::EngineError;
use crate::event::Event;
use crate::executor::Engine;
use crate::graph::{StateGraph, StateId};

use super::TickConfig;

struct QueuedEvent {
    sequence: u64,
    priority: i32,
    event: Event,
}

struct Shared<Ctx> {
    engine: Engine<Ctx>,
    ctx: Ctx,
}

pub struct TickRuntime<Ctx> {
    shared: Mutex<Shared<Ctx>>,
    batch: Mutex<Vec<QueuedEvent>>,
    sequence: AtomicU64,
    tick_number: AtomicU64,
    config: TickConfig,
}

impl<Ctx> TickRuntime<Ctx> {
    /// Start the chart.
    ///
    /// # Errors
    /// Whatever [`Engine::start`] returns.
    pub fn new(graph: Arc<StateGraph<Ctx>>, mut ctx: Ctx, config: TickConfig) -> Result<Self, EngineError> {
        let mut engine = Engine::new(graph);
        engine.start(&mut ctx)?;
        Ok(Self {
            shared: Mutex::new(Shared { engine, ctx }),
            batch: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            tick_number: AtomicU64::new(0),
            config,
        })
    }

    /// Append `event` to the pending batch with the given priority. Higher
    /// priority is serviced first within a tick; same-priority events keep
    /// submission order. Non-blocking.
    ///
    /// # Errors
    /// [`EngineError::QueueFull`] if the batch is already at
    /// `max_events_per_tick`.
    pub fn send_event(&self, event: Event, priority: i32) -> Result<(), EngineError> {
        let mut batch = self.batch.lock().expect("tick batch mutex poisoned");
        if batch.len() >= self.config.max_events_per_tick {
            return Err(EngineError::QueueFull);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        batch.push(QueuedEvent {
            sequence,
            priority,
            event,
        });
        Ok(())
    }

    /// Process one tick: sort and apply the current batch, drain to
    /// stability once, advance the tick counter.
    ///
    /// # Errors
    /// An action/guard failure surfaced as [`EngineError::ActionFailure`].
    /// A panic raised from inside an action is caught; the tick is
    /// abandoned and the next tick proceeds normally.
    pub fn tick(&self) -> Result<(), EngineError> {
        let tick_number = self.tick_number.load(Ordering::Relaxed);
        let _span = tracing::info_span!("runtime", runtime = "tick", tick_number).entered();

        let mut batch = {
            let mut guard = self.batch.lock().expect("tick batch mutex poisoned");
            std::mem::take(&mut *guard)
        };
        batch.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.sequence.cmp(&b.sequence)));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut guard = self.shared.lock().expect("tick engine mutex poisoned");
            for queued in &batch {
                guard.engine.apply_event_no_drain(&queued.event, &mut guard.ctx)?;
            }
            let diag_leaf = guard.engine.current_state().unwrap_or(crate::graph::NONE_ID);
            guard.engine.drain_to_stable(diag_leaf, &mut guard.ctx)
        }));

        self.tick_number.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(inner) => inner,
            Err(_) => {
                tracing::error!(tick_number, "panic inside tick, tick abandoned");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn tick_number(&self) -> u64 {
        self.tick_number.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn tick_period(&self) -> std::time::Duration {
        self.config.tick_period
    }

    pub fn is_in_state(&self, id: StateId) -> bool {
        self.shared.lock().expect("tick engine mutex poisoned").engine.is_in_state(id)
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.shared.lock().expect("tick engine mutex poisoned").engine.current_state()
    }

    /// # Errors
    /// Whatever [`Engine::stop`] returns.
    pub fn stop(&self) -> Result<(), EngineError> {
        let mut guard = self.shared.lock().expect("tick engine mutex poisoned");
        guard.engine.stop(&mut guard.ctx)
    }
}
