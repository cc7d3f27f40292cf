//! Ownership and open/close protocol for a single `SQLite` connection.
//!
//! This file contains **no `unsafe` code**. All native interaction goes
//! through the session's [`Engine`].

use std::cell::Cell;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::{codes, DefaultEngine, Engine};
use crate::error::{ConnectionError, SessionResult};
use crate::transaction::{Transaction, TransactionBehavior};

static NEXT_MARKER: AtomicU64 = AtomicU64::new(1);

/// Token identifying the transaction currently registered on a [`Session`].
///
/// The session only stores it. Creating, registering and clearing markers is
/// the job of the transaction collaborator (see [`Transaction`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionMarker(NonZeroU64);

impl TransactionMarker {
    /// Allocates a marker distinct from every other marker in this process.
    #[must_use]
    pub fn next() -> Self {
        let id = NEXT_MARKER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

/// An `SQLite` connection that may or may not be open.
///
/// Owns at most one engine handle. Re-opening closes the previous connection
/// first; dropping closes it and logs (never propagates) any failure.
///
/// Not `Sync`, and no internal locking: a session must be driven from one
/// thread at a time.
pub struct Session<E: Engine = DefaultEngine> {
    engine: E,
    handle: Option<E::Handle>,
    active_transaction: Cell<Option<TransactionMarker>>,
}

impl<E: Engine + Default> Session<E> {
    /// Creates a session with no open connection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine(E::default())
    }

    /// Creates a session and opens `name` right away.
    ///
    /// `name` is anything the engine accepts as a filename, including
    /// `":memory:"`.
    pub fn connect(name: &str) -> SessionResult<Self> {
        Self::connect_with(E::default(), name)
    }
}

impl<E: Engine + Default> Default for Session<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> Session<E> {
    /// Creates a closed session that dispatches through `engine`.
    pub const fn with_engine(engine: E) -> Self {
        Self {
            engine,
            handle: None,
            active_transaction: Cell::new(None),
        }
    }

    /// Creates a session over `engine` and opens `name` right away.
    pub fn connect_with(engine: E, name: &str) -> SessionResult<Self> {
        let mut session = Self::with_engine(engine);
        session.open(name)?;
        Ok(session)
    }

    /// Opens `name`, closing any connection this session already holds.
    ///
    /// A failure while closing the previous connection is returned before
    /// the new one is attempted. On an open failure the engine's message and
    /// code are read from the partially opened handle, which is then released;
    /// the session is left closed either way.
    pub fn open(&mut self, name: &str) -> SessionResult<()> {
        self.close()?;

        let err = match self.engine.open(name) {
            (codes::OK, Some(handle)) => {
                self.handle = Some(handle);
                tracing::debug!(name, "sqlite session opened");
                return Ok(());
            }
            // The message lives on the partial handle, so read it first.
            (_, Some(partial)) => {
                let message = self.engine.errmsg(&partial);
                let code = self.engine.errcode(&partial);
                let (close_rc, _) = self.engine.close(partial);
                if close_rc != codes::OK {
                    tracing::warn!(name, close_rc, "failed to release partially opened handle");
                }
                ConnectionError::new(code, message)
            }
            (rc, None) => {
                let code = if rc == codes::OK { codes::CANTOPEN } else { rc };
                ConnectionError::new(code, self.engine.errstr(code))
            }
        };
        tracing::debug!(name, error = %err, "sqlite session open failed");
        Err(err)
    }

    /// Closes the connection. Does nothing when no connection is open.
    ///
    /// The session is closed afterwards even if the engine reports a failure
    /// (for example `SQLITE_BUSY` because statements were left unfinalized);
    /// the error describes the release step only.
    ///
    /// In that case the engine still holds the connection, and any file lock
    /// on it, but the session no longer has a handle to retry with: the
    /// connection leaks for the life of the process. Finalize every prepared
    /// statement before closing.
    pub fn close(&mut self) -> SessionResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let (rc, unreleased) = self.engine.close(handle);
        if is_success(rc) {
            tracing::debug!("sqlite session closed");
            return Ok(());
        }
        let message = unreleased.map_or_else(
            || self.engine.errstr(rc),
            |handle| self.engine.errmsg(&handle),
        );
        tracing::debug!(rc, message = message.as_str(), "sqlite session close failed");
        Err(ConnectionError::new(rc, message))
    }

    /// Returns `true` while a connection is open.
    pub const fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns `true` when the engine has no explicit transaction in
    /// progress.
    ///
    /// A closed session reports `true`: without a connection there is no
    /// transaction to be in.
    pub fn is_autocommit(&self) -> bool {
        self.handle
            .as_ref()
            .is_none_or(|handle| self.engine.autocommit(handle))
    }

    /// Maps an engine status code to a result.
    ///
    /// `OK`, `ROW` and `DONE` pass. Every other code fails with the message
    /// currently recorded on the handle, read at the time of the call.
    pub fn check_status(&self, code: i32) -> SessionResult<()> {
        if is_success(code) {
            Ok(())
        } else {
            Err(ConnectionError::new(code, self.last_error_message()))
        }
    }

    /// Runs [`check_status`](Self::check_status) on the most recent result
    /// code recorded on the handle.
    pub fn check_last_status(&self) -> SessionResult<()> {
        let handle = self.handle.as_ref().ok_or_else(ConnectionError::not_open)?;
        self.check_status(self.engine.errcode(handle))
    }

    /// Most recent error message recorded on the handle; empty when closed.
    pub fn last_error_message(&self) -> String {
        self.handle
            .as_ref()
            .map(|handle| self.engine.errmsg(handle))
            .unwrap_or_default()
    }

    /// Executes one or more SQL statements separated by semicolons.
    ///
    /// No result rows are returned.
    pub fn execute_batch(&self, sql: &str) -> SessionResult<()> {
        let handle = self.handle.as_ref().ok_or_else(ConnectionError::not_open)?;
        self.check_status(self.engine.exec(handle, sql))
    }

    /// Begins a deferred transaction.
    pub fn transaction(&self) -> SessionResult<Transaction<'_, E>> {
        Transaction::begin(self, TransactionBehavior::Deferred)
    }

    /// Begins an immediate transaction (acquires a RESERVED lock right away).
    pub fn transaction_immediate(&self) -> SessionResult<Transaction<'_, E>> {
        Transaction::begin(self, TransactionBehavior::Immediate)
    }

    /// Raw handle for collaborators that issue their own engine calls.
    pub const fn handle(&self) -> Option<&E::Handle> {
        self.handle.as_ref()
    }

    /// The engine this session dispatches through.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Marker of the transaction currently registered on this session.
    pub fn active_transaction(&self) -> Option<TransactionMarker> {
        self.active_transaction.get()
    }

    /// Registers (or clears, with `None`) the active transaction marker.
    ///
    /// No validation is performed; the transaction collaborator owns the
    /// protocol.
    pub fn set_active_transaction(&self, marker: Option<TransactionMarker>) {
        self.active_transaction.set(marker);
    }
}

impl<E: Engine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("active_transaction", &self.active_transaction.get())
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "failed to close sqlite session on drop");
        }
    }
}

const fn is_success(code: i32) -> bool {
    matches!(code, codes::OK | codes::ROW | codes::DONE)
}
