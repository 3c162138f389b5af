//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision, so they
//! sort lexically. Calendar dates are `YYYY-MM-DD`. Statuses are stored in
//! their canonical spelling.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use ipdesk_core::{
  filing::{
    Address, CorrespondenceAddress, Filing, FilingContent, Inventor, PaymentStatus,
  },
  status::FilingStatus,
  tracker::{AssetDetails, TrackedFiling},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn encode_opt_date(d: Option<NaiveDate>) -> Option<String> { d.map(encode_date) }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(decode_date).transpose()
}

// ─── PaymentStatus ───────────────────────────────────────────────────────────

pub fn encode_payment_status(p: PaymentStatus) -> &'static str {
  match p {
    PaymentStatus::Unpaid => "unpaid",
    PaymentStatus::Paid => "paid",
  }
}

pub fn decode_payment_status(s: &str) -> Result<PaymentStatus> {
  match s {
    "unpaid" => Ok(PaymentStatus::Unpaid),
    "paid" => Ok(PaymentStatus::Paid),
    other => Err(Error::Decode { kind: "payment status", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a filing row, in order.
pub const FILING_COLUMNS: &str = "
  filing_id, user_id, application_number,
  applicant_name, applicant_type, nationality,
  address_street, address_city, address_state, address_postal_code,
  correspondence_same, correspondence_street, correspondence_city,
  correspondence_state, correspondence_postal_code,
  email, phone, filing_role, is_inventor, id_type, id_number,
  patent_type, jurisdiction, technical_field, title, abstract_text,
  problem_statement, novelty, priority_claim, priority_application_number,
  priority_date, specification_path, claims_path,
  payment_method, payment_status, total_fee,
  filing_date, expiry_date, grant_date, status, admin_feedback,
  created_at, updated_at";

/// Raw values read directly from a `filings` row.
pub struct RawFiling {
  pub filing_id:          i64,
  pub user_id:            i64,
  pub application_number: String,

  pub applicant_name:             String,
  pub applicant_type:             String,
  pub nationality:                String,
  pub address_street:             String,
  pub address_city:               String,
  pub address_state:              String,
  pub address_postal_code:        String,
  pub correspondence_same:        bool,
  pub correspondence_street:      Option<String>,
  pub correspondence_city:        Option<String>,
  pub correspondence_state:       Option<String>,
  pub correspondence_postal_code: Option<String>,
  pub email:                      String,
  pub phone:                      String,
  pub filing_role:                String,
  pub is_inventor:                bool,
  pub id_type:                    String,
  pub id_number:                  String,

  pub patent_type:                 String,
  pub jurisdiction:                String,
  pub technical_field:             String,
  pub title:                       String,
  pub abstract_text:               String,
  pub problem_statement:           Option<String>,
  pub novelty:                     Option<String>,
  pub priority_claim:              bool,
  pub priority_application_number: Option<String>,
  pub priority_date:               Option<String>,
  pub specification_path:          Option<String>,
  pub claims_path:                 Option<String>,

  pub payment_method: Option<String>,
  pub payment_status: String,
  pub total_fee:      Option<f64>,

  pub filing_date:    String,
  pub expiry_date:    Option<String>,
  pub grant_date:     Option<String>,
  pub status:         String,
  pub admin_feedback: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawFiling {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      filing_id:          r.get("filing_id")?,
      user_id:            r.get("user_id")?,
      application_number: r.get("application_number")?,

      applicant_name:             r.get("applicant_name")?,
      applicant_type:             r.get("applicant_type")?,
      nationality:                r.get("nationality")?,
      address_street:             r.get("address_street")?,
      address_city:               r.get("address_city")?,
      address_state:              r.get("address_state")?,
      address_postal_code:        r.get("address_postal_code")?,
      correspondence_same:        r.get("correspondence_same")?,
      correspondence_street:      r.get("correspondence_street")?,
      correspondence_city:        r.get("correspondence_city")?,
      correspondence_state:       r.get("correspondence_state")?,
      correspondence_postal_code: r.get("correspondence_postal_code")?,
      email:                      r.get("email")?,
      phone:                      r.get("phone")?,
      filing_role:                r.get("filing_role")?,
      is_inventor:                r.get("is_inventor")?,
      id_type:                    r.get("id_type")?,
      id_number:                  r.get("id_number")?,

      patent_type:                 r.get("patent_type")?,
      jurisdiction:                r.get("jurisdiction")?,
      technical_field:             r.get("technical_field")?,
      title:                       r.get("title")?,
      abstract_text:               r.get("abstract_text")?,
      problem_statement:           r.get("problem_statement")?,
      novelty:                     r.get("novelty")?,
      priority_claim:              r.get("priority_claim")?,
      priority_application_number: r.get("priority_application_number")?,
      priority_date:               r.get("priority_date")?,
      specification_path:          r.get("specification_path")?,
      claims_path:                 r.get("claims_path")?,

      payment_method: r.get("payment_method")?,
      payment_status: r.get("payment_status")?,
      total_fee:      r.get("total_fee")?,

      filing_date:    r.get("filing_date")?,
      expiry_date:    r.get("expiry_date")?,
      grant_date:     r.get("grant_date")?,
      status:         r.get("status")?,
      admin_feedback: r.get("admin_feedback")?,
      created_at:     r.get("created_at")?,
      updated_at:     r.get("updated_at")?,
    })
  }

  /// Decode, attaching the rows loaded from the child tables.
  pub fn into_filing(
    self,
    inventors: Vec<Inventor>,
    drawing_paths: Vec<String>,
    requested_update_fields: Vec<String>,
  ) -> Result<Filing> {
    let content = FilingContent {
      applicant_name: self.applicant_name,
      applicant_type: self.applicant_type,
      nationality: self.nationality,
      address: Address {
        street:      self.address_street,
        city:        self.address_city,
        state:       self.address_state,
        postal_code: self.address_postal_code,
      },
      correspondence_same: self.correspondence_same,
      correspondence: CorrespondenceAddress {
        street:      self.correspondence_street,
        city:        self.correspondence_city,
        state:       self.correspondence_state,
        postal_code: self.correspondence_postal_code,
      },
      email: self.email,
      phone: self.phone,
      filing_role: self.filing_role,
      is_inventor: self.is_inventor,
      id_type: self.id_type,
      id_number: self.id_number,

      patent_type: self.patent_type,
      jurisdiction: self.jurisdiction,
      technical_field: self.technical_field,
      title: self.title,
      abstract_text: self.abstract_text,
      problem_statement: self.problem_statement,
      novelty: self.novelty,
      priority_claim: self.priority_claim,
      priority_application_number: self.priority_application_number,
      priority_date: decode_opt_date(self.priority_date.as_deref())?,

      specification_path: self.specification_path,
      claims_path: self.claims_path,
      drawing_paths,

      payment_method: self.payment_method,
      payment_status: decode_payment_status(&self.payment_status)?,
      total_fee: self.total_fee,
    };

    Ok(Filing {
      filing_id: self.filing_id,
      user_id: self.user_id,
      application_number: self.application_number,
      content,
      inventors,
      filing_date: decode_date(&self.filing_date)?,
      expiry_date: decode_opt_date(self.expiry_date.as_deref())?,
      grant_date: decode_opt_date(self.grant_date.as_deref())?,
      status: FilingStatus::parse(&self.status),
      admin_feedback: self.admin_feedback,
      requested_update_fields,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Columns selected for a tracker row, in order.
pub const TRACKER_COLUMNS: &str = "
  tracker_id, user_id, title, abstract_text, inventors, assignee,
  application_number, jurisdiction, ip_type,
  filing_date, priority_date, publication_date, grant_date,
  expiry_date, renewal_date, current_status, source, tracked_at, updated_at";

/// Raw values read directly from a `filing_trackers` row.
pub struct RawTracker {
  pub tracker_id:         i64,
  pub user_id:            i64,
  pub title:              Option<String>,
  pub abstract_text:      Option<String>,
  pub inventors:          Option<String>,
  pub assignee:           Option<String>,
  pub application_number: Option<String>,
  pub jurisdiction:       Option<String>,
  pub ip_type:            Option<String>,
  pub filing_date:        Option<String>,
  pub priority_date:      Option<String>,
  pub publication_date:   Option<String>,
  pub grant_date:         Option<String>,
  pub expiry_date:        Option<String>,
  pub renewal_date:       Option<String>,
  pub current_status:     String,
  pub source:             String,
  pub tracked_at:         String,
  pub updated_at:         String,
}

impl RawTracker {
  pub fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tracker_id:         r.get("tracker_id")?,
      user_id:            r.get("user_id")?,
      title:              r.get("title")?,
      abstract_text:      r.get("abstract_text")?,
      inventors:          r.get("inventors")?,
      assignee:           r.get("assignee")?,
      application_number: r.get("application_number")?,
      jurisdiction:       r.get("jurisdiction")?,
      ip_type:            r.get("ip_type")?,
      filing_date:        r.get("filing_date")?,
      priority_date:      r.get("priority_date")?,
      publication_date:   r.get("publication_date")?,
      grant_date:         r.get("grant_date")?,
      expiry_date:        r.get("expiry_date")?,
      renewal_date:       r.get("renewal_date")?,
      current_status:     r.get("current_status")?,
      source:             r.get("source")?,
      tracked_at:         r.get("tracked_at")?,
      updated_at:         r.get("updated_at")?,
    })
  }

  pub fn into_tracked(self) -> Result<TrackedFiling> {
    Ok(TrackedFiling {
      tracker_id: self.tracker_id,
      user_id: self.user_id,
      details: AssetDetails {
        title:              self.title,
        abstract_text:      self.abstract_text,
        inventors:          self.inventors,
        assignee:           self.assignee,
        application_number: self.application_number,
        jurisdiction:       self.jurisdiction,
        ip_type:            self.ip_type,
        filing_date:        decode_opt_date(self.filing_date.as_deref())?,
        priority_date:      decode_opt_date(self.priority_date.as_deref())?,
        publication_date:   decode_opt_date(self.publication_date.as_deref())?,
        grant_date:         decode_opt_date(self.grant_date.as_deref())?,
      },
      expiry_date: decode_opt_date(self.expiry_date.as_deref())?,
      renewal_date: decode_opt_date(self.renewal_date.as_deref())?,
      current_status: FilingStatus::parse(&self.current_status),
      source: self.source,
      tracked_at: decode_dt(&self.tracked_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = DateTime::parse_from_rfc3339("2025-03-15T09:30:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let b = a + chrono::Duration::milliseconds(500);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn bad_date_is_reported() {
    assert!(matches!(decode_date("15/03/2025"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_payment_status_is_reported() {
    assert!(matches!(
      decode_payment_status("refunded"),
      Err(Error::Decode { kind: "payment status", .. })
    ));
  }
}
