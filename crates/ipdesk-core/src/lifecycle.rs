//! Filing lifecycle transitions.
//!
//! Everything here is a pure function over a [`Filing`] (or the parts needed
//! to build one). Storage backends call these inside a single transaction so
//! each read-modify-write is atomic.
//!
//! ```text
//!              create ──► FILED / EXPIRING SOON / EXPIRED   (derived)
//!                              │
//!     admin set_feedback(fields) ──► Pending Response
//!                              │
//!              user update ───►  Under Review
//!                              │
//!     admin set_status(...) ──► any state; GRANTED stamps grant_date
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, UserId,
  derive::{derive_status, expiry_from_filing},
  filing::{Filing, FilingContent, FilingRequest},
  status::FilingStatus,
};

// ─── Creation ────────────────────────────────────────────────────────────────

/// A validated filing ready for insertion. The store assigns the id, the
/// application number, the inventor ids and the timestamps.
#[derive(Debug, Clone)]
pub struct NewFiling {
  pub user_id:     UserId,
  pub content:     FilingContent,
  pub inventors:   Vec<String>,
  pub filing_date: NaiveDate,
  pub expiry_date: NaiveDate,
  pub grant_date:  Option<NaiveDate>,
  /// Stored before the first derivation runs.
  pub status:      FilingStatus,
}

impl NewFiling {
  /// Apply creation defaults: the filing date is today unless given, and the
  /// expiry is twenty years after it unless given.
  pub fn prepare(user_id: UserId, req: &FilingRequest, today: NaiveDate) -> Self {
    let filing_date = req.filing_date.unwrap_or(today);
    Self {
      user_id,
      content: FilingContent::from_request(req),
      inventors: req.inventors.clone(),
      filing_date,
      expiry_date: req.expiry_date.unwrap_or_else(|| expiry_from_filing(filing_date)),
      grant_date: req.grant_date,
      status: FilingStatus::FILED,
    }
  }
}

/// The status to persist right after insertion.
pub fn initial_status(filing: &Filing, today: NaiveDate) -> FilingStatus {
  filing.derived_status(today)
}

// ─── Resubmission ────────────────────────────────────────────────────────────

/// Apply an owner's update to `filing`.
///
/// Inventor links are the store's concern; see
/// [`FilingRequest::inventor_names`]. A filing waiting on the applicant
/// (`Pending Response`) moves to `Under Review` and its requested fields are
/// cleared; any other filing has its status re-derived.
pub fn apply_update(filing: &mut Filing, req: &FilingRequest, now: DateTime<Utc>) {
  let today = now.date_naive();

  filing.content.apply_request(req);

  if let Some(filing_date) = req.filing_date {
    filing.filing_date = filing_date;
  }
  if let Some(grant_date) = req.grant_date {
    filing.grant_date = Some(grant_date);
  }
  if let Some(expiry) = req.expiry_date {
    filing.expiry_date = Some(expiry);
  } else if filing.expiry_date.is_none() {
    filing.expiry_date = Some(expiry_from_filing(filing.filing_date));
  }

  if filing.status == FilingStatus::PENDING_RESPONSE {
    filing.status = FilingStatus::UNDER_REVIEW;
    filing.requested_update_fields.clear();
  } else {
    filing.status = derive_status(&filing.facts(), today);
  }

  filing.updated_at = now;
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// Parse an admin-supplied status. Any non-blank text is accepted.
pub fn admin_status(raw: &str) -> Result<FilingStatus> {
  if raw.trim().is_empty() {
    return Err(Error::invalid("status", "is required"));
  }
  Ok(FilingStatus::parse(raw))
}

/// Set the stored status verbatim. Entering `GRANTED` without a grant date
/// stamps today's date; an existing grant date is never moved.
pub fn set_status(filing: &mut Filing, status: FilingStatus, now: DateTime<Utc>) {
  if status == FilingStatus::GRANTED && filing.grant_date.is_none() {
    filing.grant_date = Some(now.date_naive());
  }
  filing.status = status;
  filing.updated_at = now;
}

/// Record reviewer feedback.
///
/// When `requested_fields` is given it replaces the stored list and, unless
/// the filing is already `GRANTED` or `REJECTED`, sends it back to the
/// applicant as `Pending Response`.
pub fn set_feedback(
  filing: &mut Filing,
  feedback: Option<String>,
  requested_fields: Option<Vec<String>>,
  now: DateTime<Utc>,
) {
  filing.admin_feedback = feedback;

  if let Some(fields) = requested_fields {
    filing.requested_update_fields = fields;
    let settled = filing.status == FilingStatus::GRANTED
      || filing.status == FilingStatus::REJECTED;
    if !settled {
      filing.status = FilingStatus::PENDING_RESPONSE;
    }
  }

  filing.updated_at = now;
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

/// An administrative action applied to many filings at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkAction {
  Delete,
  UpdateStatus(FilingStatus),
}

impl BulkAction {
  /// Parse the wire form: `DELETE`, or `UPDATE_STATUS` with a status value.
  pub fn parse(action: &str, value: Option<&str>) -> Result<Self> {
    if action.eq_ignore_ascii_case("DELETE") {
      Ok(Self::Delete)
    } else if action.eq_ignore_ascii_case("UPDATE_STATUS") {
      let raw = value.ok_or_else(|| Error::invalid("value", "is required"))?;
      Ok(Self::UpdateStatus(admin_status(raw)?))
    } else {
      Err(Error::invalid("action", format!("unknown bulk action {action:?}")))
    }
  }
}

/// One row that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
  pub filing_id: i64,
  pub message:   String,
}

/// Per-row result of a bulk action. Rows are independent: a failure does not
/// roll back rows already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
  pub applied: Vec<i64>,
  /// Ids with no matching filing.
  pub skipped: Vec<i64>,
  pub failed:  Vec<BulkFailure>,
}
