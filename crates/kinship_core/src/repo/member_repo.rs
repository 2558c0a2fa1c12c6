//! Member repository contract and SQLite implementation.

use crate::db::DbError;
use crate::graph::{MemberStore, StoreError};
use crate::model::member::FamilyMember;
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MEMBER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    gender,
    image_reference,
    parents_json,
    spouses_json,
    children_json,
    siblings_json,
    is_implicit,
    level
FROM family_members
ORDER BY name ASC";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Store(StoreError),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; open the database with open_db")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted member data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::InvalidData(_) => None,
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

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Whole-store persistence.
pub trait MemberRepository {
    /// Reads every persisted member into a fresh store.
    fn load_store(&self) -> RepoResult<MemberStore>;
    /// Replaces every persisted member with the content of `store`.
    fn save_store(&self, store: &MemberStore) -> RepoResult<usize>;
    /// Number of persisted members.
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'family_members'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("family_members"));
        }
        Ok(Self { conn })
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn load_store(&self) -> RepoResult<MemberStore> {
        let mut stmt = self.conn.prepare(MEMBER_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut store = MemberStore::new();
        while let Some(row) = rows.next()? {
            store.insert(&parse_member_row(row)?)?;
        }
        Ok(store)
    }

    fn save_store(&self, store: &MemberStore) -> RepoResult<usize> {
        let members = store.members();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM family_members;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO family_members (
                    uuid,
                    name,
                    gender,
                    image_reference,
                    parents_json,
                    spouses_json,
                    children_json,
                    siblings_json,
                    is_implicit,
                    level
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            )?;
            for member in &members {
                insert.execute(params![
                    member.id.to_string(),
                    member.name.as_str(),
                    member.gender.as_deref(),
                    member.image_reference.as_deref(),
                    names_to_json(&member.parents)?,
                    names_to_json(&member.spouses)?,
                    names_to_json(&member.children)?,
                    names_to_json(&member.siblings)?,
                    i64::from(member.is_implicit),
                    member.level,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=store_save module=repo status=ok members={}",
            members.len()
        );
        Ok(members.len())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM family_members;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative member count `{count}`")))
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<FamilyMember> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in family_members.uuid"
        ))
    })?;

    let is_implicit = match row.get::<_, i64>("is_implicit")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_implicit value `{other}` in family_members.is_implicit"
            )));
        }
    };

    let mut member = FamilyMember::with_id(id, row.get::<_, String>("name")?);
    member.gender = row.get("gender")?;
    member.image_reference = row.get("image_reference")?;
    member.parents = names_from_json(row, "parents_json")?;
    member.spouses = names_from_json(row, "spouses_json")?;
    member.children = names_from_json(row, "children_json")?;
    member.siblings = names_from_json(row, "siblings_json")?;
    member.is_implicit = is_implicit;
    member.level = row.get("level")?;
    Ok(member)
}

fn names_to_json(names: &[String]) -> RepoResult<String> {
    serde_json::to_string(names)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode relation list: {err}")))
}

fn names_from_json(row: &Row<'_>, column: &'static str) -> RepoResult<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|err| {
        RepoError::InvalidData(format!("invalid relation list in family_members.{column}: {err}"))
    })
}
