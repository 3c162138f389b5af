//! Fire-and-forget activity hooks.
//!
//! The services report patent views here. Observers must not fail or block
//! the operation that triggered them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::UserId;

pub trait ActivityObserver: Send + Sync {
  fn record_patent_view(&self, _user_id: Option<UserId>, _filing_id: i64) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ActivityObserver for NoopObserver {}

/// In-process counters. Each event is logged with the running total.
#[derive(Debug, Default)]
pub struct ActivityCounters {
  patent_views: AtomicU64,
}

impl ActivityCounters {
  pub fn patent_views(&self) -> u64 { self.patent_views.load(Ordering::Relaxed) }
}

impl ActivityObserver for ActivityCounters {
  fn record_patent_view(&self, user_id: Option<UserId>, filing_id: i64) {
    let total = self.patent_views.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::debug!(?user_id, filing_id, total, "patent view recorded");
  }
}
