//! Derived swipe deck.
//!
//! The queue is never persisted. It is rebuilt from the catalogue on
//! session start, filter change, and reset, which keeps it consistent with
//! the exclusion rule by construction: a card the user already decided on
//! can never come back around.

use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::data::ContentCatalog;
use crate::state::ProgressState;

/// Upcoming idea cards, in catalogue order, minus everything already
/// swiped, optionally narrowed to one category.
#[derive(Debug, Clone, Default)]
pub struct CardQueue {
    filter: Option<String>,
    pending: VecDeque<String>,
}

impl CardQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active category filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Rebuild from catalogue order, dropping every card with a recorded
    /// decision and everything outside the active filter.
    pub fn rebuild(&mut self, catalog: &ContentCatalog, state: &ProgressState) {
        self.pending = catalog
            .ideas
            .iter()
            .filter(|card| {
                self.filter
                    .as_deref()
                    .is_none_or(|category| card.category == category)
            })
            .filter(|card| !state.has_decided(&card.id))
            .map(|card| card.id.clone())
            .collect();
    }

    /// Swap the category filter and rebuild from the head of the newly
    /// filtered sequence.
    pub fn set_filter(
        &mut self,
        filter: Option<String>,
        catalog: &ContentCatalog,
        state: &ProgressState,
    ) {
        self.filter = filter;
        self.rebuild(catalog, state);
    }

    /// The display window: up to the next three card ids.
    #[must_use]
    pub fn peek(&self) -> SmallVec<[&str; 3]> {
        self.pending.iter().take(3).map(String::as_str).collect()
    }

    /// Consume the head of the queue.
    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
