//! SQL schema for the appraisal SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    full_name     TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone         TEXT NOT NULL,
    role          TEXT NOT NULL,   -- 'staff' | 'hod' | 'committee' | 'faculty'
    staff_number  TEXT,
    faculty       TEXT NOT NULL,
    department    TEXT NOT NULL,
    category      TEXT NOT NULL DEFAULT 'junior',
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

-- One row per appraisal. Filterable fields are columns; nested payloads are
-- JSON. Rows are replaced wholesale on update.
CREATE TABLE IF NOT EXISTS appraisals (
    appraisal_id          TEXT PRIMARY KEY,
    staff_id              TEXT NOT NULL,
    staff_name            TEXT NOT NULL,
    faculty               TEXT NOT NULL,
    department            TEXT NOT NULL,
    staff_category        TEXT NOT NULL,
    status                TEXT NOT NULL,
    submitted_at          TEXT NOT NULL,   -- RFC 3339 UTC, fixed nanos
    data_json             TEXT NOT NULL,
    documents_json        TEXT NOT NULL DEFAULT '[]',
    hod_evaluation_json   TEXT,
    staff_review_json     TEXT,
    committee_review_json TEXT,
    faculty_review_json   TEXT,
    traits_evaluation_id  TEXT
);

-- Never updated after insert.
CREATE TABLE IF NOT EXISTS traits_evaluations (
    evaluation_id TEXT PRIMARY KEY,
    staff_id      TEXT NOT NULL,
    appraisal_id  TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    body_json     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id    TEXT PRIMARY KEY,
    updated_at TEXT NOT NULL,
    body_json  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS appraisals_staff_idx   ON appraisals(staff_id, submitted_at);
CREATE INDEX IF NOT EXISTS appraisals_queue_idx   ON appraisals(faculty, department, status);
CREATE INDEX IF NOT EXISTS traits_staff_idx       ON traits_evaluations(staff_id, created_at);

PRAGMA user_version = 1;
";
