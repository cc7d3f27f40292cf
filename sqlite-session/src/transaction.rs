//! Transaction guard that registers itself on a [`Session`].

use crate::engine::{codes, Engine};
use crate::error::{ConnectionError, SessionResult};
use crate::session::{Session, TransactionMarker};

/// Transaction locking behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionBehavior {
    /// `BEGIN DEFERRED` (the default).
    #[default]
    Deferred,
    /// `BEGIN IMMEDIATE` -- acquires a RESERVED lock immediately.
    Immediate,
    /// `BEGIN EXCLUSIVE` -- acquires an EXCLUSIVE lock immediately.
    Exclusive,
}

impl TransactionBehavior {
    const fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED",
            Self::Immediate => "BEGIN IMMEDIATE",
            Self::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// An open database transaction.
///
/// At most one exists per session: beginning registers a
/// [`TransactionMarker`] on the session and a second `begin` fails while it is
/// set. Rolls back on drop unless committed or rolled back explicitly.
pub struct Transaction<'s, E: Engine> {
    session: &'s Session<E>,
    marker: TransactionMarker,
    finished: bool,
}

impl<'s, E: Engine> Transaction<'s, E> {
    /// Begins a new transaction on `session`.
    pub fn begin(session: &'s Session<E>, behavior: TransactionBehavior) -> SessionResult<Self> {
        if !session.is_open() {
            return Err(ConnectionError::not_open());
        }
        if session.active_transaction().is_some() {
            return Err(ConnectionError::new(
                codes::MISUSE,
                "a transaction is already active on this session",
            ));
        }
        session.execute_batch(behavior.begin_sql())?;

        let marker = TransactionMarker::next();
        session.set_active_transaction(Some(marker));
        tracing::debug!(?marker, ?behavior, "transaction started");
        Ok(Self {
            session,
            marker,
            finished: false,
        })
    }

    /// Commits the transaction.
    ///
    /// On failure the guard is dropped and rolls back.
    pub fn commit(mut self) -> SessionResult<()> {
        self.session.execute_batch("COMMIT")?;
        self.finish();
        tracing::debug!(marker = ?self.marker, "transaction committed");
        Ok(())
    }

    /// Rolls the transaction back.
    pub fn rollback(mut self) -> SessionResult<()> {
        let result = self.session.execute_batch("ROLLBACK");
        self.finish();
        tracing::debug!(marker = ?self.marker, "transaction rolled back");
        result
    }

    /// Marker this transaction registered on its session.
    pub const fn marker(&self) -> TransactionMarker {
        self.marker
    }

    /// The session this transaction runs on.
    pub const fn session(&self) -> &'s Session<E> {
        self.session
    }

    /// See [`Session::execute_batch`].
    pub fn execute_batch(&self, sql: &str) -> SessionResult<()> {
        self.session.execute_batch(sql)
    }

    fn finish(&mut self) {
        self.finished = true;
        if self.session.active_transaction() == Some(self.marker) {
            self.session.set_active_transaction(None);
        }
    }
}

impl<E: Engine> std::fmt::Debug for Transaction<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("marker", &self.marker)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Drop for Transaction<'_, E> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Best-effort rollback.
        if let Err(err) = self.session.execute_batch("ROLLBACK") {
            tracing::warn!(marker = ?self.marker, error = %err, "rollback on drop failed");
        }
        self.finish();
    }
}
