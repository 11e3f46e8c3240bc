//! Single writer thread for SQLite mutations.
//!
//! SQLite allows one writer at a time; funnelling every write through one
//! thread keeps `SQLITE_BUSY` out of the hot path and gives each job its own
//! transaction.

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use log::{debug, error};
use tokio::sync::{mpsc, oneshot};

use nirogya_core::{Error, Result};

use super::{get_connection, DbPool};
use crate::errors::StorageError;

type WriteJob = Box<dyn FnOnce(&DbPool) + Send + 'static>;

/// Either the job's own error or a diesel error raised by the transaction.
enum TxError {
    Job(Error),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Diesel(err)
    }
}

/// Cloneable handle to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<WriteJob>,
}

impl WriteHandle {
    /// Runs `job` inside a transaction on the writer thread.
    ///
    /// The transaction rolls back if `job` returns an error.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let write_job: WriteJob = Box::new(move |pool: &DbPool| {
            let outcome = get_connection(pool).and_then(|mut pooled| {
                let conn: &mut SqliteConnection = &mut pooled;
                conn.transaction::<T, TxError, _>(|tx_conn| job(tx_conn).map_err(TxError::Job))
                    .map_err(|err| match err {
                        TxError::Job(err) => err,
                        TxError::Diesel(err) => StorageError::from(err).into(),
                    })
            });
            // The caller may have been dropped; nothing to report then.
            let _ = reply_tx.send(outcome);
        });

        self.sender
            .send(write_job)
            .map_err(|_| StorageError::WriterUnavailable("writer thread stopped".to_string()))?;
        reply_rx.await.map_err(|_| {
            StorageError::WriterUnavailable("writer dropped the job".to_string())
        })?
    }
}

/// Starts the writer thread. It exits once every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (sender, mut receiver) = mpsc::unbounded_channel::<WriteJob>();
    let spawned = std::thread::Builder::new()
        .name("nirogya-db-writer".to_string())
        .spawn(move || {
            debug!("[Storage] Writer thread started");
            while let Some(job) = receiver.blocking_recv() {
                job(&pool);
            }
            debug!("[Storage] Writer thread stopped");
        });
    if let Err(err) = spawned {
        // The handle reports WriterUnavailable on every call from here on.
        error!("[Storage] Failed to start writer thread: {}", err);
    }
    WriteHandle { sender }
}
