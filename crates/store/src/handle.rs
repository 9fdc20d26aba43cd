//! Process-wide database handle.
//!
//! The application opens the database once at startup with [`open`], fetches
//! it anywhere with [`get`], and tears it down with [`close`] at shutdown.
//! After a close, the next [`open`] starts a fresh handle.

use crate::Database;
use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use okane_config::DatabaseConfig;
use std::sync::LazyLock;
use tokio::sync::Mutex;
use tracing::instrument;

static HANDLE: LazyLock<Mutex<Option<Database>>> = LazyLock::new(|| Mutex::new(None));

/// Return the shared handle, connecting (and creating the schema) on first use.
///
/// The configuration only matters for the call that actually connects; while a
/// handle is open, later calls return it unchanged.
#[instrument(skip_all)]
pub async fn open(config: &DatabaseConfig) -> Result<Database> {
    let mut guard = HANDLE.lock().await;
    if let Some(db) = guard.as_ref().filter(|db| !db.is_closed()) {
        return Ok(db.clone());
    }
    tracing::debug!(location = ?config.location(), "opening shared database handle");
    let db = Database::from_config(config).await?;
    *guard = Some(db.clone());
    Ok(db)
}

/// Return the shared handle, or [`ErrorKind::Closed`] if none is open.
pub async fn get() -> Result<Database> {
    HANDLE
        .lock()
        .await
        .as_ref()
        .filter(|db| !db.is_closed())
        .cloned()
        .ok_or_raise(|| ErrorKind::Closed)
}

/// Close the shared handle. Does nothing if none is open.
#[instrument]
pub async fn close() {
    let db = HANDLE.lock().await.take();
    if let Some(db) = db {
        db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repository;
    use okane_model::Tag;

    // The handle is global, so the whole lifecycle is exercised in one test.
    #[tokio::test]
    async fn test_handle_lifecycle() {
        let err = get().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Closed));

        let db = open(&DatabaseConfig::in_memory()).await.unwrap();
        Repository::from(&db).insert_tag(&Tag::new("Pet")).await.unwrap();

        // Later opens and gets share the same database.
        let again = open(&DatabaseConfig::in_memory()).await.unwrap();
        assert_eq!(Repository::from(&again).get_tags().await.unwrap().len(), 1);
        let fetched = get().await.unwrap();
        assert_eq!(Repository::from(&fetched).get_tags().await.unwrap().len(), 1);

        close().await;
        assert!(db.is_closed());
        assert!(matches!(&*get().await.unwrap_err(), ErrorKind::Closed));
        // Closing again is a no-op.
        close().await;

        // A fresh open after close starts over.
        let fresh = open(&DatabaseConfig::in_memory()).await.unwrap();
        assert!(Repository::from(&fresh).get_tags().await.unwrap().is_empty());
        close().await;
    }
}
