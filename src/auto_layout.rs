//! Decides when the editor's edits should re-run the layout.
//!
//! Edits are classified by [`ChangeKind`]; each kind can be switched on or
//! off. Accepted edits arm a single-shot debounce deadline that every further
//! accepted edit pushes back, so a burst of changes costs one layout. The
//! owner drives time through [`AutoLayoutManager::tick`] from its event loop
//! (or the `*_at` variants with an explicit clock in tests).

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::config::AutoLayoutConfig;
use crate::ir::DiagramData;
use crate::layout::LayoutManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    NodeAdded,
    NodeRemoved,
    NodeResized,
    EdgeAdded,
    EdgeRemoved,
}

impl ChangeKind {
    fn enabled_in(self, config: &AutoLayoutConfig) -> bool {
        match self {
            Self::NodeAdded => config.on_node_add,
            Self::NodeRemoved => config.on_node_remove,
            Self::NodeResized => config.on_node_resize,
            Self::EdgeAdded => config.on_edge_add,
            Self::EdgeRemoved => config.on_edge_remove,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn FnMut(&DiagramData) -> anyhow::Result<()>>;

struct PendingLayout {
    data: DiagramData,
    deadline: Instant,
}

pub struct AutoLayoutManager {
    config: AutoLayoutConfig,
    layout: LayoutManager,
    pending: Option<PendingLayout>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
    destroyed: bool,
}

impl AutoLayoutManager {
    pub fn new(config: AutoLayoutConfig, layout: LayoutManager) -> Self {
        Self {
            config,
            layout,
            pending: None,
            subscribers: Vec::new(),
            next_id: 0,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &AutoLayoutConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.destroyed
    }

    /// Disabling drops any layout waiting on the debounce.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        if !enabled {
            self.pending = None;
        }
    }

    pub fn trigger(&mut self, data: &DiagramData, change: ChangeKind) -> bool {
        self.trigger_at(data, change, Instant::now())
    }

    /// Record an edit. Returns whether a layout is now scheduled because of
    /// it; the newest data replaces any earlier pending snapshot.
    pub fn trigger_at(&mut self, data: &DiagramData, change: ChangeKind, now: Instant) -> bool {
        if !self.is_enabled() || !change.enabled_in(&self.config) {
            return false;
        }
        let deadline = now + self.config.debounce();
        tracing::debug!(?change, debounce_ms = self.config.debounce_ms, "auto layout scheduled");
        self.pending = Some(PendingLayout {
            data: data.clone(),
            deadline,
        });
        true
    }

    pub fn tick(&mut self) -> Option<DiagramData> {
        self.tick_at(Instant::now())
    }

    /// Run the pending layout once its quiet period has elapsed.
    pub fn tick_at(&mut self, now: Instant) -> Option<DiagramData> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due || self.destroyed {
            return None;
        }
        let pending = self.pending.take()?;
        tracing::debug!(nodes = pending.data.nodes.len(), "debounced auto layout firing");
        let result = self.layout.auto_layout(&pending.data);
        self.notify(&result);
        Some(result)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn time_until_layout(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.deadline.saturating_duration_since(now))
    }

    /// Lay out immediately, skipping the debounce and the per-change
    /// switches. Cancels whatever was pending.
    pub fn force_layout(&mut self, data: &DiagramData) -> DiagramData {
        self.pending = None;
        let result = self.layout.auto_layout(data);
        self.notify(&result);
        result
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DiagramData) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// After this no layout is pending and no subscriber is ever called.
    pub fn destroy(&mut self) {
        self.pending = None;
        self.subscribers.clear();
        self.destroyed = true;
    }

    fn notify(&mut self, data: &DiagramData) {
        if self.destroyed {
            return;
        }
        for (id, callback) in &mut self.subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(data))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(subscriber = id.0, error = %err, "layout subscriber failed");
                }
                Err(_) => {
                    tracing::warn!(subscriber = id.0, "layout subscriber panicked");
                }
            }
        }
    }
}

impl std::fmt::Debug for AutoLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoLayoutManager")
            .field("config", &self.config)
            .field("pending", &self.pending.is_some())
            .field("subscribers", &self.subscribers.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
