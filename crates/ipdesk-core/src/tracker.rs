//! Tracked filings, a user's watch list of externally sourced IP assets.
//!
//! Search results for the same application can arrive several times, each
//! pass more or less complete than the last. [`reconcile`] folds every pass
//! into a single row per (user, application number) that only ever gains
//! information: a known date is never regressed to null, and a pass that adds
//! nothing causes no write at all.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  UserId,
  derive::{renewal_date, term_expiry, tracker_status},
  status::FilingStatus,
};

/// Source tag for rows created from IP search results.
pub const SOURCE_IP_SEARCH: &str = "IP_SEARCH";

/// Renewals due within this many days (inclusive) count as due.
pub const RENEWAL_DUE_DAYS: i64 = 30;

// ─── Asset details ───────────────────────────────────────────────────────────

/// The externally sourced description of an asset. Also the body of a
/// `track` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDetails {
  pub title:              Option<String>,
  pub abstract_text:      Option<String>,
  /// Free text, as the source reports it.
  pub inventors:          Option<String>,
  pub assignee:           Option<String>,
  /// Deduplication key together with the user id. Rows without one are
  /// never deduplicated.
  pub application_number: Option<String>,
  pub jurisdiction:       Option<String>,
  /// `patent`, `trademark`, ...
  pub ip_type:            Option<String>,
  pub filing_date:        Option<NaiveDate>,
  pub priority_date:      Option<NaiveDate>,
  pub publication_date:   Option<NaiveDate>,
  pub grant_date:         Option<NaiveDate>,
}

pub type TrackRequest = AssetDetails;

// ─── Stored rows ─────────────────────────────────────────────────────────────

/// A persisted tracker row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFiling {
  pub tracker_id:     i64,
  pub user_id:        UserId,
  #[serde(flatten)]
  pub details:        AssetDetails,
  pub expiry_date:    Option<NaiveDate>,
  pub renewal_date:   Option<NaiveDate>,
  pub current_status: FilingStatus,
  pub source:         String,
  pub tracked_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// A row ready for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackedFiling {
  pub user_id:        UserId,
  pub details:        AssetDetails,
  pub expiry_date:    Option<NaiveDate>,
  pub renewal_date:   Option<NaiveDate>,
  pub current_status: FilingStatus,
  pub source:         String,
  pub tracked_at:     DateTime<Utc>,
}

impl NewTrackedFiling {
  /// Derive expiry, renewal and status for a first sighting.
  pub fn from_details(user_id: UserId, details: AssetDetails, now: DateTime<Utc>) -> Self {
    let expiry = term_expiry(details.filing_date, details.grant_date);
    Self {
      user_id,
      expiry_date: expiry,
      renewal_date: expiry.map(renewal_date),
      current_status: tracker_status(details.grant_date, expiry, now.date_naive()),
      source: SOURCE_IP_SEARCH.to_owned(),
      details,
      tracked_at: now,
    }
  }
}

/// Overwrite `slot` when `incoming` is present and different.
fn merge_field<T: PartialEq + Copy>(slot: &mut Option<T>, incoming: Option<T>) -> bool {
  match incoming {
    Some(value) if *slot != Some(value) => {
      *slot = Some(value);
      true
    }
    _ => false,
  }
}

impl TrackedFiling {
  /// Fold a later sighting into this row. Returns `true` if anything
  /// changed, in which case `updated_at` is set to `now`.
  pub fn merge(&mut self, incoming: &AssetDetails, now: DateTime<Utc>) -> bool {
    let details = &mut self.details;
    let mut changed = false;
    changed |= merge_field(&mut details.filing_date, incoming.filing_date);
    changed |= merge_field(&mut details.priority_date, incoming.priority_date);
    changed |= merge_field(&mut details.publication_date, incoming.publication_date);
    changed |= merge_field(&mut details.grant_date, incoming.grant_date);

    // Incoming dates were merged above, so they already take precedence.
    let expiry = term_expiry(details.filing_date, details.grant_date);
    changed |= merge_field(&mut self.expiry_date, expiry);
    changed |= merge_field(&mut self.renewal_date, expiry.map(renewal_date));

    let status =
      tracker_status(details.grant_date, self.expiry_date, now.date_naive());
    if status != self.current_status {
      self.current_status = status;
      changed = true;
    }

    if changed {
      self.updated_at = now;
    }
    changed
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// What the store must do for one `track` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
  Insert(NewTrackedFiling),
  /// The merged row; write it back.
  Update(TrackedFiling),
  /// Nothing new; no write.
  Unchanged(TrackedFiling),
}

/// Decide how `incoming` lands given the current row for the same
/// (user, application number), if any.
pub fn reconcile(
  user_id: UserId,
  existing: Option<TrackedFiling>,
  incoming: &AssetDetails,
  now: DateTime<Utc>,
) -> Reconciliation {
  match existing {
    None => Reconciliation::Insert(NewTrackedFiling::from_details(
      user_id,
      incoming.clone(),
      now,
    )),
    Some(mut row) => {
      if row.merge(incoming, now) {
        Reconciliation::Update(row)
      } else {
        Reconciliation::Unchanged(row)
      }
    }
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// The tracker row as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerView {
  pub tracker_id:     i64,
  #[serde(flatten)]
  pub details:        AssetDetails,
  pub expiry_date:    Option<NaiveDate>,
  pub renewal_date:   Option<NaiveDate>,
  pub current_status: FilingStatus,
  pub source:         String,
  pub tracked_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl From<TrackedFiling> for TrackerView {
  fn from(t: TrackedFiling) -> Self {
    Self {
      tracker_id:     t.tracker_id,
      details:        t.details,
      expiry_date:    t.expiry_date,
      renewal_date:   t.renewal_date,
      current_status: t.current_status,
      source:         t.source,
      tracked_at:     t.tracked_at,
      updated_at:     t.updated_at,
    }
  }
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Headline counts over a user's tracked filings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
  pub total:       usize,
  pub granted:     usize,
  pub renewal_due: usize,
  pub expired:     usize,
}

impl Dashboard {
  pub fn aggregate<'a>(
    rows: impl IntoIterator<Item = &'a TrackedFiling>,
    today: NaiveDate,
  ) -> Self {
    let mut d = Self::default();
    for row in rows {
      d.total += 1;
      if row.details.grant_date.is_some() {
        d.granted += 1;
      }
      if let Some(renewal) = row.renewal_date
        && renewal >= today
        && (renewal - today).num_days() <= RENEWAL_DUE_DAYS
      {
        d.renewal_due += 1;
      }
      if row.expiry_date.is_some_and(|e| e < today) {
        d.expired += 1;
      }
    }
    d
  }
}
