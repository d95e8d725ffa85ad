//! SQL schema for the People Intel SQLite store.
//!
//! [`SCHEMA`] is idempotent thanks to `IF NOT EXISTS` and is applied when a
//! local store is opened or when `intel-admin migrate` runs. [`PRAGMAS`] is
//! applied to every connection, including host-provided ones.

/// Per-connection settings.
pub const PRAGMAS: &str = "
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
";

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Reference data ──────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS countries (
    code TEXT PRIMARY KEY,           -- ISO 3166-1 alpha-2
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS states (
    code         TEXT NOT NULL,
    name         TEXT NOT NULL,
    country_code TEXT NOT NULL REFERENCES countries(code),
    PRIMARY KEY (code, country_code)
);

CREATE TABLE IF NOT EXISTS cities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    city        TEXT NOT NULL,
    city_ascii  TEXT NOT NULL,       -- diacritics stripped, lower-cased
    state_code  TEXT NOT NULL,
    county_name TEXT,
    lat         REAL,
    lng         REAL,
    population  INTEGER,
    density     REAL,
    timezone    TEXT
);

-- Imports and lookups always match on this pair.
CREATE UNIQUE INDEX IF NOT EXISTS cities_match_idx ON cities(city_ascii, state_code);

-- ── People ──────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    last_name     TEXT,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role          TEXT NOT NULL DEFAULT 'viewer'
                  CHECK (role IN ('admin', 'editor', 'viewer', 'external', 'suspended')),
    password_hash TEXT,              -- argon2 PHC string; NULL cannot sign in
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,     -- SHA-256 of the bearer token, hex
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    website      TEXT,
    linkedin_url TEXT,
    industry     TEXT,
    size         TEXT,
    description  TEXT,
    logo_url     TEXT,
    country_code TEXT,
    state_code   TEXT,
    city_id      INTEGER REFERENCES cities(id),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS companies_name_idx ON companies(name COLLATE NOCASE);

-- Contacts are soft-deleted only: is_active flips, the row stays.
-- Exactly one of (country_code, state_code, city_id) for US locations or
-- (location_country, location_state, location_city) for the rest is set.
CREATE TABLE IF NOT EXISTS contacts (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    email             TEXT,
    email_secondary   TEXT,
    linkedin_url      TEXT,
    facebook_url      TEXT,
    instagram_url     TEXT,
    imdb_url          TEXT,
    wikipedia_url     TEXT,
    biography         TEXT,
    priority          TEXT NOT NULL DEFAULT 'NONE'
                      CHECK (priority IN ('HIGH', 'MEDIUM', 'LOW', 'NONE')),
    seen_film         INTEGER NOT NULL DEFAULT 0,
    doc_branch_member INTEGER NOT NULL DEFAULT 0,
    country_code      TEXT,
    state_code        TEXT,
    city_id           INTEGER REFERENCES cities(id),
    location_country  TEXT,
    location_state    TEXT,
    location_city     TEXT,
    is_active         INTEGER NOT NULL DEFAULT 1,
    inactive_reason   TEXT,
    inactive_at       TEXT,
    company_id        INTEGER REFERENCES companies(id),
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    CHECK (country_code IS NULL
           OR (location_country IS NULL AND location_state IS NULL AND location_city IS NULL))
);

CREATE INDEX IF NOT EXISTS contacts_created_idx  ON contacts(created_at, id);
CREATE INDEX IF NOT EXISTS contacts_priority_idx ON contacts(priority);
CREATE INDEX IF NOT EXISTS contacts_company_idx  ON contacts(company_id);

CREATE TABLE IF NOT EXISTS contact_assignments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id  INTEGER NOT NULL REFERENCES contacts(id),
    user_id     INTEGER NOT NULL REFERENCES users(id),
    assigned_at TEXT NOT NULL,
    UNIQUE (contact_id, user_id)
);

CREATE TABLE IF NOT EXISTS notes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL REFERENCES contacts(id),
    user_id    INTEGER NOT NULL REFERENCES users(id),
    scope      TEXT NOT NULL DEFAULT 'general'
               CHECK (scope IN ('general', 'hemal', 'yetkin', 'private')),
    content    TEXT NOT NULL,
    is_edited  INTEGER NOT NULL DEFAULT 0,
    edited_at  TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notes_contact_idx ON notes(contact_id);

CREATE TABLE IF NOT EXISTS contact_relationships (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id         INTEGER NOT NULL REFERENCES contacts(id),
    related_contact_id INTEGER NOT NULL REFERENCES contacts(id),
    relationship_type  TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    CHECK (contact_id != related_contact_id)
);

-- ── Append-only logs ────────────────────────────────────────────────────────
-- No UPDATE or DELETE is ever issued against these tables.

CREATE TABLE IF NOT EXISTS contact_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL REFERENCES contacts(id),
    action     TEXT NOT NULL CHECK (action IN ('created', 'updated', 'deactivated')),
    changes    TEXT,                 -- JSON
    reason     TEXT,
    user_id    INTEGER REFERENCES users(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_contact_idx ON contact_history(contact_id);

CREATE TABLE IF NOT EXISTS outreach_events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id  INTEGER NOT NULL REFERENCES contacts(id),
    event_type  TEXT NOT NULL,
    channel     TEXT,
    description TEXT,
    user_id     INTEGER REFERENCES users(id),
    occurred_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS outreach_contact_idx ON outreach_events(contact_id);

PRAGMA user_version = 1;
";
