//! Live recorder: forwards battle events to a record manager
//!
//! | event            | manager call   |
//! |------------------|----------------|
//! | BattleStarted    | `begin`        |
//! | TurnEnded        | `record_turn`  |
//! | BattleCompleted  | `finalize`     |
//! | BattleFinished   | `close_writer` |

use crate::events::{BattleEvent, BattleEventDispatcher, BattleListener, ListenerId};
use crate::manager::RecordManager;
use battlerec_core::Result;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

struct Forwarder {
    manager: Arc<Mutex<RecordManager>>,
    enabled: bool,
}

impl BattleListener for Forwarder {
    fn on_event(&self, event: &BattleEvent) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut manager = self.manager.lock();
        match event {
            BattleEvent::BattleStarted {
                rules,
                robot_count,
                battle_id,
            } => manager.begin(rules.clone(), *robot_count, *battle_id),
            BattleEvent::TurnEnded {
                snapshot,
                round,
                time,
            } => manager.record_turn(snapshot, *round, *time)?,
            BattleEvent::BattleCompleted { results } => manager.finalize(results.clone()),
            BattleEvent::BattleFinished { .. } => manager.close_writer(),
        }
        Ok(())
    }
}

/// Records every battle published on the dispatcher it is attached to
///
/// A recorder is attached to at most one dispatcher; it detaches itself when
/// dropped.
pub struct BattleRecorder {
    forwarder: Arc<Forwarder>,
    attachment: Option<(Weak<BattleEventDispatcher>, ListenerId)>,
}

impl BattleRecorder {
    /// Create a detached recorder feeding `manager`
    ///
    /// The manager's `enabled` setting decides whether events are recorded.
    pub fn new(manager: Arc<Mutex<RecordManager>>) -> Self {
        let enabled = manager.lock().config().enabled;
        Self {
            forwarder: Arc::new(Forwarder { manager, enabled }),
            attachment: None,
        }
    }

    /// Manager receiving the events
    pub fn manager(&self) -> &Arc<Mutex<RecordManager>> {
        &self.forwarder.manager
    }

    /// True if events are forwarded at all
    pub fn is_enabled(&self) -> bool {
        self.forwarder.enabled
    }

    /// Listen on `dispatcher`, leaving any previous dispatcher first
    ///
    /// Attaching to the current dispatcher again does nothing.
    pub fn attach(&mut self, dispatcher: &Arc<BattleEventDispatcher>) {
        if self.is_attached_to(dispatcher) {
            return;
        }
        self.detach();
        let listener: Arc<dyn BattleListener> = self.forwarder.clone();
        let id = dispatcher.add_listener(listener);
        self.attachment = Some((Arc::downgrade(dispatcher), id));
        debug!(target: "battlerec::recorder", enabled = self.forwarder.enabled, "Recorder attached");
    }

    /// Stop listening; does nothing when not attached
    pub fn detach(&mut self) {
        if let Some((dispatcher, id)) = self.attachment.take() {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.remove_listener(id);
            }
            debug!(target: "battlerec::recorder", "Recorder detached");
        }
    }

    /// True while attached to a live dispatcher
    pub fn is_attached(&self) -> bool {
        self.attachment
            .as_ref()
            .map_or(false, |(dispatcher, _)| dispatcher.strong_count() > 0)
    }

    fn is_attached_to(&self, dispatcher: &Arc<BattleEventDispatcher>) -> bool {
        self.attachment
            .as_ref()
            .map_or(false, |(current, _)| {
                std::ptr::eq(current.as_ptr(), Arc::as_ptr(dispatcher))
            })
    }
}

impl Drop for BattleRecorder {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for BattleRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleRecorder")
            .field("enabled", &self.forwarder.enabled)
            .field("attached", &self.is_attached())
            .finish()
    }
}
