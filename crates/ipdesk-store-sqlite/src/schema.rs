//! SQL schema for the ipdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS filings (
    filing_id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id                     INTEGER NOT NULL,
    application_number          TEXT    NOT NULL UNIQUE,   -- APP-<unix millis>

    applicant_name              TEXT    NOT NULL DEFAULT '',
    applicant_type              TEXT    NOT NULL DEFAULT '',
    nationality                 TEXT    NOT NULL DEFAULT '',
    address_street              TEXT    NOT NULL DEFAULT '',
    address_city                TEXT    NOT NULL DEFAULT '',
    address_state               TEXT    NOT NULL DEFAULT '',
    address_postal_code         TEXT    NOT NULL DEFAULT '',
    correspondence_same         INTEGER NOT NULL DEFAULT 1,
    correspondence_street       TEXT,
    correspondence_city         TEXT,
    correspondence_state        TEXT,
    correspondence_postal_code  TEXT,
    email                       TEXT    NOT NULL DEFAULT '',
    phone                       TEXT    NOT NULL DEFAULT '',
    filing_role                 TEXT    NOT NULL DEFAULT '',
    is_inventor                 INTEGER NOT NULL DEFAULT 1,
    id_type                     TEXT    NOT NULL DEFAULT '',
    id_number                   TEXT    NOT NULL DEFAULT '',

    patent_type                 TEXT    NOT NULL DEFAULT '',
    jurisdiction                TEXT    NOT NULL DEFAULT '',
    technical_field             TEXT    NOT NULL DEFAULT '',
    title                       TEXT    NOT NULL DEFAULT '',
    abstract_text               TEXT    NOT NULL DEFAULT '',
    problem_statement           TEXT,
    novelty                     TEXT,
    priority_claim              INTEGER NOT NULL DEFAULT 0,
    priority_application_number TEXT,
    priority_date               TEXT,                      -- YYYY-MM-DD

    specification_path          TEXT,
    claims_path                 TEXT,

    payment_method              TEXT,
    payment_status              TEXT    NOT NULL DEFAULT 'unpaid',
    total_fee                   REAL,

    filing_date                 TEXT    NOT NULL,
    expiry_date                 TEXT,
    grant_date                  TEXT,
    status                      TEXT    NOT NULL,
    admin_feedback              TEXT,
    created_at                  TEXT    NOT NULL,          -- RFC 3339 UTC
    updated_at                  TEXT    NOT NULL
);

-- Shared directory; filings link to inventors by exact name.
CREATE TABLE IF NOT EXISTS inventors (
    inventor_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS filing_inventors (
    filing_id   INTEGER NOT NULL REFERENCES filings(filing_id) ON DELETE CASCADE,
    inventor_id INTEGER NOT NULL REFERENCES inventors(inventor_id),
    position    INTEGER NOT NULL,
    PRIMARY KEY (filing_id, inventor_id)
);

CREATE TABLE IF NOT EXISTS filing_drawings (
    filing_id INTEGER NOT NULL REFERENCES filings(filing_id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    path      TEXT    NOT NULL,
    PRIMARY KEY (filing_id, position)
);

CREATE TABLE IF NOT EXISTS filing_requested_updates (
    filing_id INTEGER NOT NULL REFERENCES filings(filing_id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    field     TEXT    NOT NULL,
    PRIMARY KEY (filing_id, position)
);

-- NULL application numbers are never deduplicated: SQLite treats NULLs as
-- distinct under UNIQUE.
CREATE TABLE IF NOT EXISTS filing_trackers (
    tracker_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id            INTEGER NOT NULL,
    title              TEXT,
    abstract_text      TEXT,
    inventors          TEXT,
    assignee           TEXT,
    application_number TEXT,
    jurisdiction       TEXT,
    ip_type            TEXT,
    filing_date        TEXT,
    priority_date      TEXT,
    publication_date   TEXT,
    grant_date         TEXT,
    expiry_date        TEXT,
    renewal_date       TEXT,
    current_status     TEXT NOT NULL,
    source             TEXT NOT NULL,
    tracked_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    UNIQUE (user_id, application_number)
);

CREATE INDEX IF NOT EXISTS filings_user_idx  ON filings(user_id);
CREATE INDEX IF NOT EXISTS trackers_user_idx ON filing_trackers(user_id);

PRAGMA user_version = 1;
";
