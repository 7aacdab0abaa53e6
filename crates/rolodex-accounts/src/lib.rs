//! Account model for the Rolodex service.
//!
//! Implements the `accounts` table mapping, validated deserialization from
//! JSON payloads, serialization back to the flat six-key mapping the API
//! speaks, and the [`Record`] lifecycle (create/update/delete/find/all)
//! plus an exact-match name lookup.
//!
//! All persistence goes through an explicit [`rusqlite::Connection`]; this
//! crate holds no session state of its own.

use chrono::{Local, NaiveDate};
use rolodex_db::Record;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors produced while deserializing an account payload.
///
/// These are the only errors `deserialize` can return, and they are never
/// retried or escalated; the HTTP layer maps them straight to `400`.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field was absent or null. Fields are checked in schema
    /// order, so an empty payload is reported as missing `name`.
    #[error("invalid account: missing {0}")]
    MissingField(&'static str),

    /// The payload was not a JSON object, or a present field had the wrong
    /// type.
    #[error("invalid account: request body contained bad or no data ({0})")]
    Malformed(String),

    /// `date_joined` was present but not an ISO-8601 calendar date.
    #[error("invalid account: date_joined '{value}' is not an ISO-8601 date: {source}")]
    BadDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors that can occur during account persistence operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Storage failures pass through untranslated; callers decide policy.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No persisted account has the given id.
    #[error("account not found: {0}")]
    NotFound(i64),

    /// `update` or `delete` was called on a transient account.
    #[error("account has not been created yet")]
    NotPersisted,
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Primary key, assigned by storage on create. `None` while transient.
    pub id: Option<i64>,
    /// Display name. Required.
    pub name: String,
    /// Contact email. Required.
    pub email: String,
    /// Postal address. Required.
    pub address: String,
    /// Phone number, if the customer supplied one.
    pub phone_number: Option<String>,
    /// The date the account was opened (ISO-8601 calendar date).
    pub date_joined: NaiveDate,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Account {} id=[{}]>", self.name, id),
            None => write!(f, "<Account {} id=[transient]>", self.name),
        }
    }
}

impl Account {
    /// Serializes the account into the flat six-key mapping the API speaks.
    ///
    /// `date_joined` is rendered as `YYYY-MM-DD`; `id` and `phone_number`
    /// are null when absent. No side effects.
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "address": self.address,
            "phone_number": self.phone_number,
            "date_joined": self.date_joined.to_string(),
        })
    }

    /// Builds a transient account from a JSON payload, validating as it goes.
    ///
    /// `name`, `email`, and `address` must be present and non-null;
    /// `phone_number` and `date_joined` are optional. A missing
    /// `date_joined` defaults to the current date at the moment of this
    /// call. The returned account always has `id: None` — deserialization
    /// never touches storage.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingField`] for an absent required field (named
    /// in the error), [`ValidationError::Malformed`] for a non-object
    /// payload or a wrongly-typed field, [`ValidationError::BadDate`] for
    /// an unparseable `date_joined`.
    pub fn deserialize(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or_else(|| {
            ValidationError::Malformed(format!("expected a JSON object, got {}", type_name(value)))
        })?;

        let name = require_string(obj, "name")?;
        let email = require_string(obj, "email")?;
        let address = require_string(obj, "address")?;
        let phone_number = optional_string(obj, "phone_number")?;

        let date_joined = match optional_string(obj, "date_joined")? {
            Some(raw) => raw.parse().map_err(|source| ValidationError::BadDate {
                value: raw,
                source,
            })?,
            None => Local::now().date_naive(),
        };

        Ok(Self {
            id: None,
            name,
            email,
            address,
            phone_number,
            date_joined,
        })
    }

    /// Returns all accounts whose name exactly equals `name`.
    ///
    /// Case-sensitive; no match yields an empty vec, never an error.
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>, AccountError> {
        tracing::info!(name, "querying accounts by name");

        let mut stmt = conn.prepare(
            "SELECT id, name, email, address, phone_number, date_joined
             FROM accounts WHERE name = ?1",
        )?;

        let rows = stmt.query_map([name], map_row_to_account)?;
        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }
}

impl Record for Account {
    type Error = AccountError;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn create(&mut self, conn: &Connection) -> Result<(), AccountError> {
        tracing::info!(account = %self, "creating account");

        conn.execute(
            "INSERT INTO accounts (name, email, address, phone_number, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.name,
                self.email,
                self.address,
                self.phone_number,
                self.date_joined.to_string(),
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    fn update(&self, conn: &Connection) -> Result<(), AccountError> {
        let id = self.id.ok_or(AccountError::NotPersisted)?;
        tracing::info!(account = %self, "updating account");

        let count = conn.execute(
            "UPDATE accounts
             SET name = ?1, email = ?2, address = ?3, phone_number = ?4, date_joined = ?5
             WHERE id = ?6",
            params![
                self.name,
                self.email,
                self.address,
                self.phone_number,
                self.date_joined.to_string(),
                id,
            ],
        )?;
        if count == 0 {
            return Err(AccountError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&self, conn: &Connection) -> Result<(), AccountError> {
        let id = self.id.ok_or(AccountError::NotPersisted)?;
        tracing::info!(account = %self, "deleting account");

        let count = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
        if count == 0 {
            return Err(AccountError::NotFound(id));
        }
        Ok(())
    }

    fn find(conn: &Connection, id: i64) -> Result<Option<Self>, AccountError> {
        tracing::info!(id, "finding account by id");

        conn.query_row(
            "SELECT id, name, email, address, phone_number, date_joined
             FROM accounts WHERE id = ?1",
            [id],
            map_row_to_account,
        )
        .optional()
        .map_err(AccountError::from)
    }

    fn all(conn: &Connection) -> Result<Vec<Self>, AccountError> {
        tracing::info!("fetching all accounts");

        let mut stmt = conn.prepare(
            "SELECT id, name, email, address, phone_number, date_joined FROM accounts",
        )?;

        let rows = stmt.query_map([], map_row_to_account)?;
        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }
}

fn map_row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let date_raw: String = row.get(5)?;
    let date_joined: NaiveDate = date_raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Account {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        phone_number: row.get(4)?,
        date_joined,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn require_string(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::Malformed(format!(
            "field '{key}' must be a string, got {}",
            type_name(other)
        ))),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::Malformed(format!(
            "field '{key}' must be a string, got {}",
            type_name(other)
        ))),
    }
}
