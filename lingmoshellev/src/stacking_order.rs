//! Accumulates `org_kde_lingmo_stacking_order` batches and publishes them whole.
//!
//! A batch begins when a stacking order object is requested, collects one
//! uuid per `window` event and ends with `done`. Consumers only ever see the
//! last completed batch.

use crate::window::WindowId;

/// Identifies one accumulation; carried as user data of the stacking order proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackingOrderToken(u64);

/// Events of one `org_kde_lingmo_stacking_order` object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackingOrderEvent {
    Window(String),
    Done,
}

#[derive(Debug, Default)]
pub struct StackingOrderTracker {
    serial: u64,
    pending: Option<(StackingOrderToken, Vec<WindowId>)>,
    published: Vec<WindowId>,
}

impl StackingOrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new accumulation. A batch still in flight is thrown away.
    pub fn begin(&mut self) -> StackingOrderToken {
        self.serial += 1;
        let token = StackingOrderToken(self.serial);
        if let Some((discarded, _)) = self.pending.replace((token, Vec::new())) {
            log::debug!("stacking order batch {:?} superseded", discarded);
        }
        token
    }

    /// Returns false when `token` does not belong to the running accumulation.
    pub fn append(&mut self, token: StackingOrderToken, uuid: WindowId) -> bool {
        match self.pending.as_mut() {
            Some((current, list)) if *current == token => {
                list.push(uuid);
                true
            }
            _ => false,
        }
    }

    /// Close the accumulation. Returns true if the published order changed.
    pub fn finish(&mut self, token: StackingOrderToken) -> bool {
        match self.pending.take() {
            Some((current, list)) if current == token => self.publish(list),
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Replace the snapshot directly, as the legacy uuid list event does.
    /// A batch in flight keeps accumulating and still publishes on `done`.
    pub fn replace(&mut self, list: Vec<WindowId>) -> bool {
        self.publish(list)
    }

    pub fn is_accumulating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn current(&self) -> &[WindowId] {
        &self.published
    }

    fn publish(&mut self, list: Vec<WindowId>) -> bool {
        if list == self.published {
            return false;
        }
        self.published = list;
        true
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
        self.published.clear();
    }
}
