//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the find/insert/update/delete primitives over `contacts`.
//! - Translate SQLite constraint failures into semantic conflicts.
//!
//! # Invariants
//! - Writes only accept `ContactFields` that already passed validation.
//! - Replace overwrites all five fields; partial patches do not exist.
//! - Read paths reject invalid persisted ids instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::contact::{Contact, ContactFields, ContactId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    favorite_color,
    birthday
FROM contacts";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "first_name",
    "last_name",
    "email",
    "favorite_color",
    "birthday",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ContactId),
    /// Another contact already uses this (normalized) email.
    DuplicateEmail(String),
    /// A contact with this id already exists.
    DuplicateId(ContactId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::DuplicateEmail(_) => write!(f, "contact email already in use"),
            Self::DuplicateId(id) => write!(f, "contact id already in use: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for contact CRUD operations.
pub trait ContactRepository {
    /// Lists every contact in store order.
    fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Looks up a contact by its normalized email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Contact>>;
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    /// Overwrites all fields of an existing contact.
    fn replace_contact(&self, id: ContactId, fields: &ContactFields) -> RepoResult<()>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();

        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }

        Ok(contacts)
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Contact>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM contacts WHERE email = ?1;",
                [email],
                |row| row.get(0),
            )
            .optional()?;

        match id_text {
            Some(text) => self.get_contact(parse_id(&text)?),
            None => Ok(None),
        }
    }

    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        let fields = &contact.fields;
        self.conn
            .execute(
                "INSERT INTO contacts (
                    id,
                    first_name,
                    last_name,
                    email,
                    favorite_color,
                    birthday
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    contact.id.to_string(),
                    fields.first_name.as_str(),
                    fields.last_name.as_str(),
                    fields.email.as_str(),
                    fields.favorite_color.as_str(),
                    fields.birthday.as_str(),
                ],
            )
            .map_err(|err| map_constraint_error(err, contact.id, &fields.email))?;

        Ok(contact.id)
    }

    fn replace_contact(&self, id: ContactId, fields: &ContactFields) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE contacts
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    email = ?3,
                    favorite_color = ?4,
                    birthday = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?6;",
                params![
                    fields.first_name.as_str(),
                    fields.last_name.as_str(),
                    fields.email.as_str(),
                    fields.favorite_color.as_str(),
                    fields.birthday.as_str(),
                    id.to_string(),
                ],
            )
            .map_err(|err| map_constraint_error(err, id, &fields.email))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let id_text: String = row.get("id")?;
    let id = parse_id(&id_text)?;

    Ok(Contact {
        id,
        fields: ContactFields {
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            favorite_color: row.get("favorite_color")?,
            birthday: row.get("birthday")?,
        },
    })
}

fn parse_id(text: &str) -> RepoResult<ContactId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid id value `{text}` in contacts.id")))
}

/// Maps UNIQUE / PRIMARY KEY violations to semantic conflicts.
fn map_constraint_error(err: rusqlite::Error, id: ContactId, email: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains("contacts.email") {
                return RepoError::DuplicateEmail(email.to_string());
            }
            if message.contains("contacts.id") {
                return RepoError::DuplicateId(id);
            }
        }
    }
    err.into()
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "contacts")? {
        return Err(RepoError::MissingRequiredTable("contacts"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "contacts", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "contacts",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
