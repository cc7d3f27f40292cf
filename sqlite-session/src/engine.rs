//! The engine boundary: the handful of native calls a [`Session`] makes.
//!
//! The text width (UTF-8 or UTF-16) used to open a connection and to read its
//! error messages is fixed by the [`Engine`] implementation, which is a type
//! parameter of [`Session`]. A single session therefore can never mix the two
//! widths against one handle.
//!
//! [`Session`]: crate::Session

/// `SQLite` primary result codes used by the session and its collaborators.
pub mod codes {
    use libsqlite3_sys as sys;

    /// Successful result.
    pub const OK: i32 = sys::SQLITE_OK;
    /// Generic error.
    pub const ERROR: i32 = sys::SQLITE_ERROR;
    /// The database file is locked.
    pub const BUSY: i32 = sys::SQLITE_BUSY;
    /// Unable to open the database file.
    pub const CANTOPEN: i32 = sys::SQLITE_CANTOPEN;
    /// Abort due to constraint violation.
    pub const CONSTRAINT: i32 = sys::SQLITE_CONSTRAINT;
    /// Library used incorrectly.
    pub const MISUSE: i32 = sys::SQLITE_MISUSE;
    /// `sqlite3_step` has another row ready.
    pub const ROW: i32 = sys::SQLITE_ROW;
    /// `sqlite3_step` has finished executing.
    pub const DONE: i32 = sys::SQLITE_DONE;
}

/// Native calls a session issues against the wrapped engine.
///
/// Implementations are stateless dispatch tables in production
/// ([`Utf8Engine`](crate::Utf8Engine), [`Utf16Engine`](crate::Utf16Engine));
/// tests substitute fault-injecting stubs.
pub trait Engine {
    /// Opaque connection handle. Owned by exactly one session at a time.
    type Handle;

    /// Opens a connection to `name`.
    ///
    /// Returns the engine status together with whatever handle the engine
    /// produced. The engine may hand back a handle even when the status is not
    /// [`codes::OK`]; the caller must interrogate and then [`close`] it.
    ///
    /// [`close`]: Engine::close
    fn open(&self, name: &str) -> (i32, Option<Self::Handle>);

    /// Releases `handle` and returns the engine status.
    ///
    /// Takes the handle by value, so a handle borrowed from a
    /// [`Session`](crate::Session) can never be released behind its back:
    ///
    /// ```compile_fail
    /// use sqlite_session::{Engine, Session, Utf8Engine};
    ///
    /// let session: Session<Utf8Engine> = Session::connect(":memory:").unwrap();
    /// session.engine().close(session.handle().unwrap());
    /// ```
    ///
    /// On [`codes::OK`] the handle is gone and `None` comes back. On any other
    /// status the engine still holds the connection and the handle is handed
    /// back so it can be read with [`errmsg`](Engine::errmsg).
    fn close(&self, handle: Self::Handle) -> (i32, Option<Self::Handle>);

    /// Returns `true` when no explicit transaction is in progress.
    fn autocommit(&self, handle: &Self::Handle) -> bool;

    /// Most recent result code recorded on `handle`.
    fn errcode(&self, handle: &Self::Handle) -> i32;

    /// Most recent error message recorded on `handle`.
    fn errmsg(&self, handle: &Self::Handle) -> String;

    /// Static English description of a result code.
    fn errstr(&self, code: i32) -> String;

    /// Runs one or more semicolon-separated SQL statements, discarding rows.
    fn exec(&self, handle: &Self::Handle, sql: &str) -> i32;
}

/// Engine chosen for this build (see the `utf16` cargo feature).
#[cfg(not(feature = "utf16"))]
pub type DefaultEngine = crate::ffi::Utf8Engine;

/// Engine chosen for this build (see the `utf16` cargo feature).
#[cfg(feature = "utf16")]
pub type DefaultEngine = crate::ffi::Utf16Engine;
