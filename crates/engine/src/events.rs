//! Battle lifecycle events and their dispatcher
//!
//! The simulation publishes one [`BattleEvent`] per lifecycle step through a
//! [`BattleEventDispatcher`]. Listeners run in registration order.

use battlerec_core::{BattleId, BattleResults, BattleRules, Result, TurnSnapshot};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// One step of a battle's lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    /// A battle is about to run its first round
    BattleStarted {
        /// Rules in effect
        rules: BattleRules,
        /// Robots taking part
        robot_count: u32,
        /// Identifier of the battle
        battle_id: BattleId,
    },
    /// A turn has been simulated
    TurnEnded {
        /// State at the end of the turn
        snapshot: TurnSnapshot,
        /// Round index
        round: u32,
        /// Turn index within the round
        time: u32,
    },
    /// Every round has been fought
    BattleCompleted {
        /// Final per-robot results
        results: Vec<BattleResults>,
    },
    /// The battle is over, completed or not
    BattleFinished {
        /// True if the battle was stopped before completion
        aborted: bool,
    },
}

impl BattleEvent {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            BattleEvent::BattleStarted { .. } => "battle_started",
            BattleEvent::TurnEnded { .. } => "turn_ended",
            BattleEvent::BattleCompleted { .. } => "battle_completed",
            BattleEvent::BattleFinished { .. } => "battle_finished",
        }
    }
}

/// Receiver of battle events
pub trait BattleListener: Send + Sync {
    /// Handle one event; an error stops dispatch and reaches the publisher
    fn on_event(&self, event: &BattleEvent) -> Result<()>;
}

/// Handle returned by [`BattleEventDispatcher::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered registry of listeners
#[derive(Default)]
pub struct BattleEventDispatcher {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn BattleListener>)>>,
    next_id: AtomicU64,
}

impl BattleEventDispatcher {
    /// Create a dispatcher with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` after every existing one
    pub fn add_listener(&self, listener: Arc<dyn BattleListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Unregister a listener; returns false if it was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver `event` to every listener in registration order
    ///
    /// The registry is not locked while listeners run, so a listener may add
    /// or remove listeners; such changes apply from the next event on.
    pub fn dispatch(&self, event: &BattleEvent) -> Result<()> {
        let listeners: Vec<Arc<dyn BattleListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        trace!(target: "battlerec::recorder", event = event.name(), listeners = listeners.len(), "Dispatching");
        for listener in listeners {
            listener.on_event(event)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BattleEventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
