//! Status derivation and the patent-term date arithmetic behind it.
//!
//! [`derive_status`] is the single source of truth for a filing's reported
//! status; creation, updates, admin writes and every read-path mapping call
//! it. The tracker helpers at the bottom use the same term constants.

use chrono::{Months, NaiveDate};

use crate::status::FilingStatus;

/// A patent runs for twenty years from its filing date.
pub const TERM_MONTHS: u32 = 20 * 12;

/// Expiries this close (inclusive) are reported as `EXPIRING SOON`, and
/// renewals fall due this long before expiry.
pub const WARNING_MONTHS: u32 = 6;

// ─── Filing status ───────────────────────────────────────────────────────────

/// The subset of a filing the deriver looks at.
#[derive(Debug, Clone, Copy)]
pub struct FilingFacts<'a> {
  pub grant_date:    Option<NaiveDate>,
  pub expiry_date:   Option<NaiveDate>,
  pub stored_status: &'a FilingStatus,
}

/// Compute a filing's lifecycle status. Never fails; `FILED` is the fallback.
///
/// In priority order: a grant date wins, then any manual status is kept,
/// then the expiry date decides between `EXPIRED`, `EXPIRING SOON` and
/// `FILED`.
pub fn derive_status(facts: &FilingFacts<'_>, today: NaiveDate) -> FilingStatus {
  if facts.grant_date.is_some() {
    return FilingStatus::GRANTED;
  }

  if facts.stored_status.is_manual() {
    return facts.stored_status.clone();
  }

  if let Some(expiry) = facts.expiry_date {
    if today > expiry {
      return FilingStatus::EXPIRED;
    }
    if expiry <= add_months(today, WARNING_MONTHS) {
      return FilingStatus::EXPIRING_SOON;
    }
  }

  FilingStatus::FILED
}

// ─── Term arithmetic ─────────────────────────────────────────────────────────

/// Calendar-month addition; month-end dates clamp (Feb 29 + 1y = Feb 28).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
  date
    .checked_add_months(Months::new(months))
    .unwrap_or(NaiveDate::MAX)
}

pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
  date
    .checked_sub_months(Months::new(months))
    .unwrap_or(NaiveDate::MIN)
}

/// Default expiry for a filing: twenty years after `filing_date`.
pub fn expiry_from_filing(filing_date: NaiveDate) -> NaiveDate {
  add_months(filing_date, TERM_MONTHS)
}

/// Expiry for a tracked asset: from the filing date when known, otherwise
/// from the grant date.
pub fn term_expiry(
  filing_date: Option<NaiveDate>,
  grant_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
  filing_date.or(grant_date).map(expiry_from_filing)
}

/// The renewal date for a known expiry.
pub fn renewal_date(expiry: NaiveDate) -> NaiveDate {
  sub_months(expiry, WARNING_MONTHS)
}

/// The three-rule status used for tracked assets: `GRANTED` when a grant
/// date is known, `EXPIRED` when the expiry is in the past, else `FILED`.
pub fn tracker_status(
  grant_date: Option<NaiveDate>,
  expiry_date: Option<NaiveDate>,
  today: NaiveDate,
) -> FilingStatus {
  match (grant_date, expiry_date) {
    (Some(_), _) => FilingStatus::GRANTED,
    (None, Some(expiry)) if expiry < today => FilingStatus::EXPIRED,
    _ => FilingStatus::FILED,
  }
}
