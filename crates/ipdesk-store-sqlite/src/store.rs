//! [`SqliteStore`], the SQLite implementation of [`FilingStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use ipdesk_core::{
  UserId,
  filing::{Filing, FilingRequest, Inventor},
  lifecycle::{self, NewFiling},
  status::FilingStatus,
  store::FilingStore,
};
use rusqlite::{Connection, OptionalExtension as _, named_params, params};

use crate::{
  Result,
  encode::{
    FILING_COLUMNS, RawFiling, encode_date, encode_dt, encode_opt_date,
    encode_payment_status,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An ipdesk store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// runs on the connection's own thread, so writes are serialised.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// Plain functions over a borrowed connection so they compose inside one
// transaction (`Transaction` derefs to `Connection`).

pub(crate) fn load_filing(
  conn: &Connection,
  id: i64,
  owner: Option<UserId>,
) -> Result<Option<Filing>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {FILING_COLUMNS} FROM filings
         WHERE filing_id = ?1 AND (?2 IS NULL OR user_id = ?2)"
      ),
      params![id, owner],
      RawFiling::from_row,
    )
    .optional()?;
  raw.map(|r| hydrate(conn, r)).transpose()
}

fn list_filings(conn: &Connection, owner: Option<UserId>) -> Result<Vec<Filing>> {
  let raws = {
    let mut stmt = conn.prepare(&format!(
      "SELECT {FILING_COLUMNS} FROM filings
       WHERE ?1 IS NULL OR user_id = ?1
       ORDER BY created_at DESC, filing_id DESC"
    ))?;
    stmt
      .query_map(params![owner], RawFiling::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  raws.into_iter().map(|r| hydrate(conn, r)).collect()
}

fn hydrate(conn: &Connection, raw: RawFiling) -> Result<Filing> {
  let id = raw.filing_id;
  let inventors = load_inventors(conn, id)?;
  let drawings = load_ordered(conn, "filing_drawings", "path", id)?;
  let requested = load_ordered(conn, "filing_requested_updates", "field", id)?;
  raw.into_filing(inventors, drawings, requested)
}

fn load_inventors(conn: &Connection, filing_id: i64) -> Result<Vec<Inventor>> {
  let mut stmt = conn.prepare(
    "SELECT i.inventor_id, i.name
     FROM filing_inventors fi
     JOIN inventors i ON i.inventor_id = fi.inventor_id
     WHERE fi.filing_id = ?1
     ORDER BY fi.position",
  )?;
  let rows = stmt
    .query_map(params![filing_id], |r| {
      Ok(Inventor { inventor_id: r.get(0)?, name: r.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Read a `(filing_id, position, <column>)` child table in order.
fn load_ordered(
  conn: &Connection,
  table: &str,
  column: &str,
  filing_id: i64,
) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {column} FROM {table} WHERE filing_id = ?1 ORDER BY position"
  ))?;
  let rows = stmt
    .query_map(params![filing_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

fn replace_ordered(
  conn: &Connection,
  table: &str,
  column: &str,
  filing_id: i64,
  values: &[String],
) -> Result<()> {
  conn.execute(&format!("DELETE FROM {table} WHERE filing_id = ?1"), params![filing_id])?;
  let mut stmt = conn.prepare(&format!(
    "INSERT INTO {table} (filing_id, position, {column}) VALUES (?1, ?2, ?3)"
  ))?;
  for (position, value) in values.iter().enumerate() {
    stmt.execute(params![filing_id, position as i64, value])?;
  }
  Ok(())
}

/// Replace a filing's inventor links, resolving each name against the shared
/// directory by exact match and creating missing entries.
fn link_inventors(conn: &Connection, filing_id: i64, names: &[String]) -> Result<()> {
  conn.execute("DELETE FROM filing_inventors WHERE filing_id = ?1", params![filing_id])?;
  for (position, name) in names.iter().enumerate() {
    conn.execute(
      "INSERT INTO inventors (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
      params![name],
    )?;
    let inventor_id: i64 = conn.query_row(
      "SELECT inventor_id FROM inventors WHERE name = ?1",
      params![name],
      |r| r.get(0),
    )?;
    // A name listed twice links once, at its first position.
    conn.execute(
      "INSERT OR IGNORE INTO filing_inventors (filing_id, inventor_id, position)
       VALUES (?1, ?2, ?3)",
      params![filing_id, inventor_id, position as i64],
    )?;
  }
  Ok(())
}

/// `APP-<unix millis>`, bumped past any number already taken.
fn next_application_number(conn: &Connection, now: DateTime<Utc>) -> Result<String> {
  let mut millis = now.timestamp_millis();
  loop {
    let candidate = format!("APP-{millis}");
    let taken: bool = conn.query_row(
      "SELECT EXISTS (SELECT 1 FROM filings WHERE application_number = ?1)",
      params![candidate],
      |r| r.get(0),
    )?;
    if !taken {
      return Ok(candidate);
    }
    millis += 1;
  }
}

/// Write every mutable column of `filing`, plus its drawings and requested
/// fields. Inventor links are written separately.
fn write_filing(conn: &Connection, f: &Filing) -> Result<()> {
  let c = &f.content;
  conn.execute(
    "UPDATE filings SET
       applicant_name = :applicant_name,
       applicant_type = :applicant_type,
       nationality = :nationality,
       address_street = :address_street,
       address_city = :address_city,
       address_state = :address_state,
       address_postal_code = :address_postal_code,
       correspondence_same = :correspondence_same,
       correspondence_street = :correspondence_street,
       correspondence_city = :correspondence_city,
       correspondence_state = :correspondence_state,
       correspondence_postal_code = :correspondence_postal_code,
       email = :email,
       phone = :phone,
       filing_role = :filing_role,
       is_inventor = :is_inventor,
       id_type = :id_type,
       id_number = :id_number,
       patent_type = :patent_type,
       jurisdiction = :jurisdiction,
       technical_field = :technical_field,
       title = :title,
       abstract_text = :abstract_text,
       problem_statement = :problem_statement,
       novelty = :novelty,
       priority_claim = :priority_claim,
       priority_application_number = :priority_application_number,
       priority_date = :priority_date,
       specification_path = :specification_path,
       claims_path = :claims_path,
       payment_method = :payment_method,
       payment_status = :payment_status,
       total_fee = :total_fee,
       filing_date = :filing_date,
       expiry_date = :expiry_date,
       grant_date = :grant_date,
       status = :status,
       admin_feedback = :admin_feedback,
       updated_at = :updated_at
     WHERE filing_id = :filing_id",
    named_params! {
      ":applicant_name": c.applicant_name,
      ":applicant_type": c.applicant_type,
      ":nationality": c.nationality,
      ":address_street": c.address.street,
      ":address_city": c.address.city,
      ":address_state": c.address.state,
      ":address_postal_code": c.address.postal_code,
      ":correspondence_same": c.correspondence_same,
      ":correspondence_street": c.correspondence.street,
      ":correspondence_city": c.correspondence.city,
      ":correspondence_state": c.correspondence.state,
      ":correspondence_postal_code": c.correspondence.postal_code,
      ":email": c.email,
      ":phone": c.phone,
      ":filing_role": c.filing_role,
      ":is_inventor": c.is_inventor,
      ":id_type": c.id_type,
      ":id_number": c.id_number,
      ":patent_type": c.patent_type,
      ":jurisdiction": c.jurisdiction,
      ":technical_field": c.technical_field,
      ":title": c.title,
      ":abstract_text": c.abstract_text,
      ":problem_statement": c.problem_statement,
      ":novelty": c.novelty,
      ":priority_claim": c.priority_claim,
      ":priority_application_number": c.priority_application_number,
      ":priority_date": encode_opt_date(c.priority_date),
      ":specification_path": c.specification_path,
      ":claims_path": c.claims_path,
      ":payment_method": c.payment_method,
      ":payment_status": encode_payment_status(c.payment_status),
      ":total_fee": c.total_fee,
      ":filing_date": encode_date(f.filing_date),
      ":expiry_date": encode_opt_date(f.expiry_date),
      ":grant_date": encode_opt_date(f.grant_date),
      ":status": f.status.as_str(),
      ":admin_feedback": f.admin_feedback,
      ":updated_at": encode_dt(f.updated_at),
      ":filing_id": f.filing_id,
    },
  )?;
  replace_ordered(conn, "filing_drawings", "path", f.filing_id, &c.drawing_paths)?;
  replace_ordered(
    conn,
    "filing_requested_updates",
    "field",
    f.filing_id,
    &f.requested_update_fields,
  )?;
  Ok(())
}

fn insert_filing(conn: &Connection, new: NewFiling, now: DateTime<Utc>) -> Result<Filing> {
  let application_number = next_application_number(conn, now)?;
  conn.execute(
    "INSERT INTO filings (user_id, application_number, filing_date, status, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    params![
      new.user_id,
      application_number,
      encode_date(new.filing_date),
      new.status.as_str(),
      encode_dt(now),
    ],
  )?;
  let filing_id = conn.last_insert_rowid();

  link_inventors(conn, filing_id, &new.inventors)?;

  let mut filing = Filing {
    filing_id,
    user_id: new.user_id,
    application_number,
    content: new.content,
    inventors: load_inventors(conn, filing_id)?,
    filing_date: new.filing_date,
    expiry_date: Some(new.expiry_date),
    grant_date: new.grant_date,
    status: new.status,
    admin_feedback: None,
    requested_update_fields: Vec::new(),
    created_at: now,
    updated_at: now,
  };
  filing.status = lifecycle::initial_status(&filing, now.date_naive());
  write_filing(conn, &filing)?;
  Ok(filing)
}

fn update_filing(
  conn: &Connection,
  id: i64,
  owner: UserId,
  request: &FilingRequest,
  now: DateTime<Utc>,
) -> Result<Option<Filing>> {
  let Some(mut filing) = load_filing(conn, id, Some(owner))? else {
    return Ok(None);
  };
  lifecycle::apply_update(&mut filing, request, now);
  if let Some(names) = request.inventor_names() {
    link_inventors(conn, id, names)?;
    filing.inventors = load_inventors(conn, id)?;
  }
  write_filing(conn, &filing)?;
  Ok(Some(filing))
}

/// Load any filing, apply `change`, and write it back.
fn modify_filing(
  conn: &Connection,
  id: i64,
  change: impl FnOnce(&mut Filing),
) -> Result<Option<Filing>> {
  let Some(mut filing) = load_filing(conn, id, None)? else {
    return Ok(None);
  };
  change(&mut filing);
  write_filing(conn, &filing)?;
  Ok(Some(filing))
}

// ─── FilingStore impl ────────────────────────────────────────────────────────

impl FilingStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_filing(&self, new: NewFiling, now: DateTime<Utc>) -> Result<Filing> {
    let filing = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let filing = insert_filing(&tx, new, now)?;
        tx.commit()?;
        Ok(filing)
      })
      .await?;
    Ok(filing)
  }

  async fn get_filing(&self, id: i64, owner: Option<UserId>) -> Result<Option<Filing>> {
    let filing = self
      .conn
      .call(move |conn| Ok(load_filing(conn, id, owner)?))
      .await?;
    Ok(filing)
  }

  async fn list_filings(&self, owner: Option<UserId>) -> Result<Vec<Filing>> {
    let filings = self
      .conn
      .call(move |conn| Ok(list_filings(conn, owner)?))
      .await?;
    Ok(filings)
  }

  async fn update_filing(
    &self,
    id: i64,
    owner: UserId,
    request: FilingRequest,
    now: DateTime<Utc>,
  ) -> Result<Option<Filing>> {
    let filing = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let filing = update_filing(&tx, id, owner, &request, now)?;
        tx.commit()?;
        Ok(filing)
      })
      .await?;
    Ok(filing)
  }

  async fn set_filing_status(
    &self,
    id: i64,
    status: FilingStatus,
    now: DateTime<Utc>,
  ) -> Result<Option<Filing>> {
    let filing = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let filing =
          modify_filing(&tx, id, |f| lifecycle::set_status(f, status, now))?;
        tx.commit()?;
        Ok(filing)
      })
      .await?;
    Ok(filing)
  }

  async fn set_filing_feedback(
    &self,
    id: i64,
    feedback: Option<String>,
    requested_fields: Option<Vec<String>>,
    now: DateTime<Utc>,
  ) -> Result<Option<Filing>> {
    let filing = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let filing = modify_filing(&tx, id, |f| {
          lifecycle::set_feedback(f, feedback, requested_fields, now)
        })?;
        tx.commit()?;
        Ok(filing)
      })
      .await?;
    Ok(filing)
  }

  async fn delete_filing(&self, id: i64, owner: Option<UserId>) -> Result<bool> {
    // Child rows go with the filing via ON DELETE CASCADE.
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM filings WHERE filing_id = ?1 AND (?2 IS NULL OR user_id = ?2)",
          params![id, owner],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }
}
