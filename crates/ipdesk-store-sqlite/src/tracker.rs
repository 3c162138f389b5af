//! [`TrackerStore`] for [`SqliteStore`].

use chrono::{DateTime, Utc};
use ipdesk_core::{
  UserId,
  tracker::{AssetDetails, NewTrackedFiling, Reconciliation, TrackedFiling, reconcile},
  store::TrackerStore,
};
use rusqlite::{Connection, OptionalExtension as _, named_params, params};

use crate::{
  Result, SqliteStore,
  encode::{RawTracker, TRACKER_COLUMNS, encode_dt, encode_opt_date},
};

fn find_by_application(
  conn: &Connection,
  user_id: UserId,
  application_number: &str,
) -> Result<Option<TrackedFiling>> {
  conn
    .query_row(
      &format!(
        "SELECT {TRACKER_COLUMNS} FROM filing_trackers
         WHERE user_id = ?1 AND application_number = ?2"
      ),
      params![user_id, application_number],
      RawTracker::from_row,
    )
    .optional()?
    .map(RawTracker::into_tracked)
    .transpose()
}

fn insert_tracked(conn: &Connection, new: NewTrackedFiling) -> Result<TrackedFiling> {
  let d = &new.details;
  conn.execute(
    "INSERT INTO filing_trackers (
       user_id, title, abstract_text, inventors, assignee, application_number,
       jurisdiction, ip_type, filing_date, priority_date, publication_date,
       grant_date, expiry_date, renewal_date, current_status, source,
       tracked_at, updated_at
     ) VALUES (
       :user_id, :title, :abstract_text, :inventors, :assignee, :application_number,
       :jurisdiction, :ip_type, :filing_date, :priority_date, :publication_date,
       :grant_date, :expiry_date, :renewal_date, :current_status, :source,
       :tracked_at, :tracked_at
     )",
    named_params! {
      ":user_id": new.user_id,
      ":title": d.title,
      ":abstract_text": d.abstract_text,
      ":inventors": d.inventors,
      ":assignee": d.assignee,
      ":application_number": d.application_number,
      ":jurisdiction": d.jurisdiction,
      ":ip_type": d.ip_type,
      ":filing_date": encode_opt_date(d.filing_date),
      ":priority_date": encode_opt_date(d.priority_date),
      ":publication_date": encode_opt_date(d.publication_date),
      ":grant_date": encode_opt_date(d.grant_date),
      ":expiry_date": encode_opt_date(new.expiry_date),
      ":renewal_date": encode_opt_date(new.renewal_date),
      ":current_status": new.current_status.as_str(),
      ":source": new.source,
      ":tracked_at": encode_dt(new.tracked_at),
    },
  )?;

  Ok(TrackedFiling {
    tracker_id:     conn.last_insert_rowid(),
    user_id:        new.user_id,
    details:        new.details,
    expiry_date:    new.expiry_date,
    renewal_date:   new.renewal_date,
    current_status: new.current_status,
    source:         new.source,
    tracked_at:     new.tracked_at,
    updated_at:     new.tracked_at,
  })
}

/// Write back the columns a merge may change.
fn write_merged(conn: &Connection, t: &TrackedFiling) -> Result<()> {
  let d = &t.details;
  conn.execute(
    "UPDATE filing_trackers SET
       filing_date = :filing_date,
       priority_date = :priority_date,
       publication_date = :publication_date,
       grant_date = :grant_date,
       expiry_date = :expiry_date,
       renewal_date = :renewal_date,
       current_status = :current_status,
       updated_at = :updated_at
     WHERE tracker_id = :tracker_id",
    named_params! {
      ":filing_date": encode_opt_date(d.filing_date),
      ":priority_date": encode_opt_date(d.priority_date),
      ":publication_date": encode_opt_date(d.publication_date),
      ":grant_date": encode_opt_date(d.grant_date),
      ":expiry_date": encode_opt_date(t.expiry_date),
      ":renewal_date": encode_opt_date(t.renewal_date),
      ":current_status": t.current_status.as_str(),
      ":updated_at": encode_dt(t.updated_at),
      ":tracker_id": t.tracker_id,
    },
  )?;
  Ok(())
}

fn track(
  conn: &Connection,
  user_id: UserId,
  details: &AssetDetails,
  now: DateTime<Utc>,
) -> Result<TrackedFiling> {
  let existing = match details.application_number.as_deref() {
    Some(number) => find_by_application(conn, user_id, number)?,
    None => None,
  };
  match reconcile(user_id, existing, details, now) {
    Reconciliation::Insert(new) => insert_tracked(conn, new),
    Reconciliation::Update(row) => {
      write_merged(conn, &row)?;
      Ok(row)
    }
    Reconciliation::Unchanged(row) => Ok(row),
  }
}

impl TrackerStore for SqliteStore {
  type Error = crate::Error;

  async fn track(
    &self,
    user_id: UserId,
    details: AssetDetails,
    now: DateTime<Utc>,
  ) -> Result<TrackedFiling> {
    let row = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row = track(&tx, user_id, &details, now)?;
        tx.commit()?;
        Ok(row)
      })
      .await?;
    Ok(row)
  }

  async fn list_tracked(&self, user_id: UserId) -> Result<Vec<TrackedFiling>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TRACKER_COLUMNS} FROM filing_trackers
           WHERE user_id = ?1
           ORDER BY tracked_at DESC, tracker_id DESC"
        ))?;
        let rows = stmt
          .query_map(params![user_id], RawTracker::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTracker::into_tracked).collect()
  }

  async fn get_tracked(&self, id: i64, user_id: UserId) -> Result<Option<TrackedFiling>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {TRACKER_COLUMNS} FROM filing_trackers
               WHERE tracker_id = ?1 AND user_id = ?2"
            ),
            params![id, user_id],
            RawTracker::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawTracker::into_tracked).transpose()
  }
}
