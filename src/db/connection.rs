use super::{Database, DatabaseTrait, StoreLocation};
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Opens a new store handle.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn DatabaseTrait>, AppError>;
}

#[derive(Debug, Clone)]
pub struct SqliteConnector {
    pub location: StoreLocation,
}

impl SqliteConnector {
    pub fn from_url(url: &str) -> Result<Self, AppError> {
        Ok(Self { location: parse_url(url)? })
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self) -> Result<Arc<dyn DatabaseTrait>, AppError> {
        info!(location = ?self.location, "Connecting to store");
        let db = Database::connect(self.location.clone()).await?;
        Ok(Arc::new(db))
    }
}

/// Accepts `sqlite://<path>`, `sqlite:<path>`, a bare path, or `:memory:`.
pub fn parse_url(url: &str) -> Result<StoreLocation, AppError> {
    let url = url.trim();
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
    match rest {
        "" => Err(AppError::Config("empty database url".to_owned())),
        ":memory:" => Ok(StoreLocation::Memory),
        path => Ok(StoreLocation::File(path.to_owned())),
    }
}

/// Process-wide store handle. The first caller connects; callers arriving
/// while that attempt is in flight wait for it instead of opening their own.
/// A failed attempt is not kept, so the next caller tries again.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    handle: OnceCell<Arc<dyn DatabaseTrait>>,
}

impl ConnectionManager {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self { connector: Box::new(connector), handle: OnceCell::new() }
    }

    /// Already connected; used when the handle is built elsewhere.
    pub fn with_handle(db: Arc<dyn DatabaseTrait>) -> Self {
        Self { connector: Box::new(Preconnected(db.clone())), handle: OnceCell::new_with(Some(db)) }
    }

    pub async fn get_handle(&self) -> Result<Arc<dyn DatabaseTrait>, AppError> {
        self.handle.get_or_try_init(|| self.connector.connect()).await.cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }
}

struct Preconnected(Arc<dyn DatabaseTrait>);

#[async_trait]
impl Connector for Preconnected {
    async fn connect(&self) -> Result<Arc<dyn DatabaseTrait>, AppError> {
        Ok(self.0.clone())
    }
}
