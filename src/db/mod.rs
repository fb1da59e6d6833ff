pub mod connection;

use crate::error::AppError;
use crate::telemetry::ds::{Document, SETTINGS_KEY};
use crate::telemetry::settings::merge_partial;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Document store used by every telemetry operation.
///
/// Documents are schema-less JSON objects. Readings come back with `_id` set
/// to the store identifier; the settings singleton comes back without its key.
#[async_trait]
pub trait DatabaseTrait: Send + Sync {
    /// Appends a reading. `timestamp_ms` orders readings; the returned
    /// document is the stored shape.
    async fn insert_reading(&self, doc: Document, timestamp_ms: i64) -> Result<Document, AppError>;
    /// Newest first, at most `limit` documents.
    async fn recent_readings(&self, limit: usize) -> Result<Vec<Document>, AppError>;
    async fn find_settings(&self) -> Result<Option<Document>, AppError>;
    /// Merges `partial` into the settings singleton, creating it if absent.
    async fn upsert_settings(&self, partial: Document) -> Result<(), AppError>;
}

pub enum DatabaseCommand {
    InsertReading {
        doc: Document,
        timestamp_ms: i64,
        response: oneshot::Sender<Result<Document, AppError>>,
    },
    RecentReadings {
        limit: usize,
        response: oneshot::Sender<Result<Vec<Document>, AppError>>,
    },
    FindSettings {
        response: oneshot::Sender<Result<Option<Document>, AppError>>,
    },
    UpsertSettings {
        partial: Document,
        response: oneshot::Sender<Result<(), AppError>>,
    },
}

/// Where the SQLite file lives.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreLocation {
    Memory,
    File(String),
}

/// SQLite-backed document store. The connection is owned by one worker
/// thread; every handle clone talks to it over a channel.
#[derive(Clone, Debug)]
pub struct Database {
    pub sender: Sender<DatabaseCommand>,
}

impl Database {
    /// Opens the store and spawns its worker. Resolves once the schema is in
    /// place, or with the open/initialize error.
    pub async fn connect(location: StoreLocation) -> Result<Self, AppError> {
        let (tx, rx) = mpsc::channel::<DatabaseCommand>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AppError>>();

        thread::Builder::new().name("wtr-store".to_owned()).spawn(move || {
            let conn = match open(&location) {
                Ok(conn) => {
                    let _ = ready_tx.send(Ok(()));
                    conn
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while let Ok(command) = rx.recv() {
                match command {
                    DatabaseCommand::InsertReading { doc, timestamp_ms, response } => {
                        let _ = response.send(insert_reading(&conn, doc, timestamp_ms));
                    }
                    DatabaseCommand::RecentReadings { limit, response } => {
                        let _ = response.send(recent_readings(&conn, limit));
                    }
                    DatabaseCommand::FindSettings { response } => {
                        let _ = response.send(find_settings(&conn));
                    }
                    DatabaseCommand::UpsertSettings { partial, response } => {
                        let _ = response.send(upsert_settings(&conn, &partial));
                    }
                }
            }
            debug!("Store worker stopped.");
        })?;

        ready_rx.await.map_err(|_| AppError::StoreUnavailable("store worker exited during startup".to_owned()))??;
        Ok(Self { sender: tx })
    }

    async fn request<R>(
        &self, command: DatabaseCommand, response_rx: oneshot::Receiver<Result<R, AppError>>,
    ) -> Result<R, AppError> {
        self.sender.send(command).map_err(|_| AppError::StoreUnavailable("store worker is gone".to_owned()))?;
        response_rx.await.map_err(|_| AppError::StoreUnavailable("store worker dropped the reply".to_owned()))?
    }
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn insert_reading(&self, doc: Document, timestamp_ms: i64) -> Result<Document, AppError> {
        let (response, rx) = oneshot::channel();
        self.request(DatabaseCommand::InsertReading { doc, timestamp_ms, response }, rx).await
    }

    async fn recent_readings(&self, limit: usize) -> Result<Vec<Document>, AppError> {
        let (response, rx) = oneshot::channel();
        self.request(DatabaseCommand::RecentReadings { limit, response }, rx).await
    }

    async fn find_settings(&self) -> Result<Option<Document>, AppError> {
        let (response, rx) = oneshot::channel();
        self.request(DatabaseCommand::FindSettings { response }, rx).await
    }

    async fn upsert_settings(&self, partial: Document) -> Result<(), AppError> {
        let (response, rx) = oneshot::channel();
        self.request(DatabaseCommand::UpsertSettings { partial, response }, rx).await
    }
}

fn open(location: &StoreLocation) -> Result<Connection, AppError> {
    let conn = match location {
        StoreLocation::Memory => Connection::open_in_memory()?,
        StoreLocation::File(path) => Connection::open(Path::new(path))?,
    };
    initialize(&conn).inspect_err(|e| error!(error = ?e, "Store schema initialization failed."))?;
    Ok(conn)
}

pub fn initialize(conn: &Connection) -> Result<(), AppError> {
    let query = "
        CREATE TABLE IF NOT EXISTS readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp_ms INTEGER NOT NULL,  -- Unix UTC milliseconds
            doc TEXT NOT NULL               -- JSON object
        );
        CREATE INDEX IF NOT EXISTS readings_by_time ON readings (timestamp_ms DESC, id DESC);

        CREATE TABLE IF NOT EXISTS settings (
            id TEXT PRIMARY KEY,
            doc TEXT NOT NULL
        );
        ";

    conn.execute_batch(query)?;
    Ok(())
}

fn parse_document(text: &str) -> Result<Document, AppError> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(doc) => Ok(doc),
        other => Err(AppError::InvalidDocument(format!("stored document is not an object: {}", other))),
    }
}

fn with_id(mut doc: Document, id: i64) -> Document {
    doc.insert("_id".to_owned(), serde_json::Value::String(id.to_string()));
    doc
}

pub fn insert_reading(conn: &Connection, doc: Document, timestamp_ms: i64) -> Result<Document, AppError> {
    let text = serde_json::to_string(&doc)?;
    conn.execute("INSERT INTO readings (timestamp_ms, doc) VALUES (?1, ?2)", params![timestamp_ms, text])?;
    let id = conn.last_insert_rowid();
    debug!(id, timestamp_ms, "Reading stored.");
    Ok(with_id(doc, id))
}

pub fn recent_readings(conn: &Connection, limit: usize) -> Result<Vec<Document>, AppError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare("SELECT id, doc FROM readings ORDER BY timestamp_ms DESC, id DESC LIMIT ?1")?;
    let rows = stmt.query_map(params![limit], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, text) = row?;
        docs.push(with_id(parse_document(&text)?, id));
    }
    Ok(docs)
}

pub fn find_settings(conn: &Connection) -> Result<Option<Document>, AppError> {
    let text: Option<String> = conn
        .query_row("SELECT doc FROM settings WHERE id = ?1", params![SETTINGS_KEY], |row| row.get(0))
        .optional()?;
    text.as_deref().map(parse_document).transpose()
}

pub fn upsert_settings(conn: &Connection, partial: &Document) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;
    let existing = find_settings(&tx)?;
    let merged = merge_partial(existing, partial);
    tx.execute(
        "INSERT INTO settings (id, doc) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
        params![SETTINGS_KEY, serde_json::to_string(&merged)?],
    )?;
    tx.commit()?;
    debug!(keys = partial.len(), "Settings merged.");
    Ok(())
}
