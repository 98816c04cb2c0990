use basket_types::BasketEvent;
use parking_lot::RwLock;

/// Receives the events of committed operations, in commit order.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: BasketEvent);
}

/// In-memory event log.
pub struct MemoryEventLog {
    entries: RwLock<Vec<BasketEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// All events published so far.
    pub fn events(&self) -> Vec<BasketEvent> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemoryEventLog {
    fn publish(&self, event: BasketEvent) {
        self.entries.write().push(event);
    }
}
