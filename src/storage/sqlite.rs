//! SQLite storage backend

use super::traits::{
    admit_analysis, admit_question, CollectionStore, OpenStore, StorageError, StorageResult,
};
use crate::model::{
    Analysis, AnalysisId, MarketQuestion, QuestionId, QuestionStatus, ResearchResponse,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed collection store
///
/// Each item is stored as a JSON document next to a few indexed columns.
/// The autoincrement `seq` column preserves insertion order, which the
/// list operations return. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS analyses (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                body_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS market_questions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                analysis_name TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                body_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_status ON analyses(status);
            CREATE INDEX IF NOT EXISTS idx_questions_analysis ON market_questions(analysis_name);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn load_question(conn: &Connection, id: &QuestionId) -> StorageResult<Option<MarketQuestion>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body_json FROM market_questions WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl CollectionStore for SqliteStore {
    fn list_analyses(&self) -> StorageResult<Vec<Analysis>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT body_json FROM analyses ORDER BY seq")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StorageError::from))
            .collect()
    }

    fn get_analysis(&self, id: &AnalysisId) -> StorageResult<Option<Analysis>> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body_json FROM analyses WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }

    fn insert_analysis(&self, analysis: &Analysis) -> StorageResult<()> {
        admit_analysis(analysis)?;
        let body = serde_json::to_string(analysis)?;
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM analyses WHERE id = ?1",
            params![analysis.id.as_str()],
            |row| row.get(0),
        )?;
        if exists {
            return Err(StorageError::Duplicate(analysis.id.to_string()));
        }
        conn.execute(
            "INSERT INTO analyses (id, name, status, created_at, body_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                analysis.id.as_str(),
                analysis.name,
                analysis.status.as_str(),
                analysis.created_at.to_rfc3339(),
                body,
            ],
        )?;
        debug!(id = %analysis.id, "analysis row inserted");
        Ok(())
    }

    fn list_market_questions(&self) -> StorageResult<Vec<MarketQuestion>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT body_json FROM market_questions ORDER BY seq")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|json| serde_json::from_str(json).map_err(StorageError::from))
            .collect()
    }

    fn get_market_question(&self, id: &QuestionId) -> StorageResult<Option<MarketQuestion>> {
        let conn = self.lock()?;
        Self::load_question(&conn, id)
    }

    fn insert_market_question(&self, question: &MarketQuestion) -> StorageResult<()> {
        admit_question(question)?;
        let body = serde_json::to_string(question)?;
        let conn = self.lock()?;
        if Self::load_question(&conn, &question.id)?.is_some() {
            return Err(StorageError::Duplicate(question.id.to_string()));
        }
        conn.execute(
            "INSERT INTO market_questions (id, analysis_name, status, created_at, body_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                question.id.as_str(),
                question.analysis_name,
                question.status.as_str(),
                question.created_at.to_rfc3339(),
                body,
            ],
        )?;
        debug!(id = %question.id, "market question row inserted");
        Ok(())
    }

    fn add_response(
        &self,
        id: &QuestionId,
        response: ResearchResponse,
    ) -> StorageResult<MarketQuestion> {
        let conn = self.lock()?;
        let mut question = Self::load_question(&conn, id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        question.add_response(response);
        conn.execute(
            "UPDATE market_questions SET status = ?1, body_json = ?2 WHERE id = ?3",
            params![
                question.status.as_str(),
                serde_json::to_string(&question)?,
                id.as_str(),
            ],
        )?;
        Ok(question)
    }

    fn set_question_status(
        &self,
        id: &QuestionId,
        status: QuestionStatus,
    ) -> StorageResult<MarketQuestion> {
        let conn = self.lock()?;
        let mut question = Self::load_question(&conn, id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        question.status = status;
        conn.execute(
            "UPDATE market_questions SET status = ?1, body_json = ?2 WHERE id = ?3",
            params![
                status.as_str(),
                serde_json::to_string(&question)?,
                id.as_str(),
            ],
        )?;
        debug!(id = %id, status = %status, "market question status updated");
        Ok(question)
    }
}
