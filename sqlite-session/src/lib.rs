//! Lifecycle management for a single `SQLite` connection.
//!
//! A [`Session`] owns at most one native connection handle. It opens and
//! closes that handle, tracks which [`Transaction`] (if any) is registered on
//! it, and turns the engine's integer result codes into [`ConnectionError`]s.
//!
//! The native calls go through an [`Engine`]:
//!
//! * [`Utf8Engine`] uses `sqlite3_open` / `sqlite3_errmsg`.
//! * [`Utf16Engine`] uses `sqlite3_open16` / `sqlite3_errmsg16`.
//!
//! [`DefaultEngine`] is one of the two, picked by the `utf16` cargo feature.
//! The `ffi` module is the **only** file that contains `unsafe` code.
//!
//! ```no_run
//! use sqlite_session::Session;
//!
//! # fn main() -> Result<(), sqlite_session::ConnectionError> {
//! let mut session: Session = Session::connect(":memory:")?;
//! assert!(session.is_autocommit());
//! session.close()?;
//! assert!(!session.is_open());
//! # Ok(())
//! # }
//! ```

mod ffi;

pub mod engine;
pub mod error;
mod session;
mod transaction;

pub use engine::{codes, DefaultEngine, Engine};
pub use error::{ConnectionError, ErrorCode, SessionResult};
pub use ffi::{RawHandle, Utf16Engine, Utf8Engine};
pub use session::{Session, TransactionMarker};
pub use transaction::{Transaction, TransactionBehavior};
