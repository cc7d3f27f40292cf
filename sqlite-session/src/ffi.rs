//! Raw `SQLite` calls behind the [`Engine`] trait.
//!
//! The symbols come from `libsqlite3-sys`, built from its bundled
//! amalgamation. This is the **only** file that contains `unsafe` code or C
//! types; everything else talks to the engine through [`Engine`].

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use libsqlite3_sys as sys;

use crate::engine::{codes, Engine};

// `libsqlite3-sys` leaves the UTF-16 API out of its bindings; the bundled
// amalgamation still exports the symbols.
extern "C" {
    fn sqlite3_open16(filename: *const c_void, pp_db: *mut *mut sys::sqlite3) -> c_int;
    fn sqlite3_errmsg16(db: *mut sys::sqlite3) -> *const c_void;
}

/// A live `sqlite3*` connection handle.
///
/// Deliberately neither `Clone` nor `Copy`: a handle has a single owner.
pub struct RawHandle(NonNull<sys::sqlite3>);

impl RawHandle {
    /// Returns the raw pointer for collaborators that issue their own
    /// `SQLite` calls (statement preparation, stepping).
    #[must_use]
    pub const fn as_ptr(&self) -> *mut sys::sqlite3 {
        self.0.as_ptr()
    }
}

impl std::fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RawHandle").field(&self.0).finish()
    }
}

/// Engine using the UTF-8 entry points (`sqlite3_open`, `sqlite3_errmsg`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Engine;

/// Engine using the UTF-16 entry points (`sqlite3_open16`,
/// `sqlite3_errmsg16`).
///
/// Batch execution still goes through `sqlite3_exec`, which only has a UTF-8
/// form; error messages are always read back in UTF-16.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Utf16Engine;

impl Engine for Utf8Engine {
    type Handle = RawHandle;

    fn open(&self, name: &str) -> (i32, Option<RawHandle>) {
        let Ok(c_name) = CString::new(name) else {
            return (codes::CANTOPEN, None);
        };
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        let rc = unsafe { sys::sqlite3_open(c_name.as_ptr(), &mut db) };
        (rc, NonNull::new(db).map(RawHandle))
    }

    fn close(&self, handle: RawHandle) -> (i32, Option<RawHandle>) {
        close(handle)
    }

    fn autocommit(&self, handle: &RawHandle) -> bool {
        autocommit(handle)
    }

    fn errcode(&self, handle: &RawHandle) -> i32 {
        errcode(handle)
    }

    fn errmsg(&self, handle: &RawHandle) -> String {
        unsafe { text_from_utf8(sys::sqlite3_errmsg(handle.as_ptr())) }
    }

    fn errstr(&self, code: i32) -> String {
        errstr(code)
    }

    fn exec(&self, handle: &RawHandle, sql: &str) -> i32 {
        exec(handle, sql)
    }
}

impl Engine for Utf16Engine {
    type Handle = RawHandle;

    fn open(&self, name: &str) -> (i32, Option<RawHandle>) {
        if name.contains('\0') {
            return (codes::CANTOPEN, None);
        }
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        let rc = unsafe { sqlite3_open16(wide.as_ptr().cast::<c_void>(), &mut db) };
        (rc, NonNull::new(db).map(RawHandle))
    }

    fn close(&self, handle: RawHandle) -> (i32, Option<RawHandle>) {
        close(handle)
    }

    fn autocommit(&self, handle: &RawHandle) -> bool {
        autocommit(handle)
    }

    fn errcode(&self, handle: &RawHandle) -> i32 {
        errcode(handle)
    }

    fn errmsg(&self, handle: &RawHandle) -> String {
        unsafe { text_from_utf16(sqlite3_errmsg16(handle.as_ptr()).cast::<u16>()) }
    }

    fn errstr(&self, code: i32) -> String {
        errstr(code)
    }

    fn exec(&self, handle: &RawHandle, sql: &str) -> i32 {
        exec(handle, sql)
    }
}

// ── Width-independent calls ─────────────────────────────────────────────

// `sqlite3_close` rather than `_v2`: with unfinalized statements outstanding
// the former reports SQLITE_BUSY instead of deferring the release.
fn close(handle: RawHandle) -> (i32, Option<RawHandle>) {
    let rc = unsafe { sys::sqlite3_close(handle.as_ptr()) };
    if rc == codes::OK {
        (rc, None)
    } else {
        (rc, Some(handle))
    }
}

fn autocommit(handle: &RawHandle) -> bool {
    unsafe { sys::sqlite3_get_autocommit(handle.as_ptr()) != 0 }
}

fn errcode(handle: &RawHandle) -> i32 {
    unsafe { sys::sqlite3_errcode(handle.as_ptr()) }
}

fn errstr(code: i32) -> String {
    unsafe { text_from_utf8(sys::sqlite3_errstr(code)) }
}

fn exec(handle: &RawHandle, sql: &str) -> i32 {
    let Ok(c_sql) = CString::new(sql) else {
        return codes::MISUSE;
    };
    unsafe {
        sys::sqlite3_exec(
            handle.as_ptr(),
            c_sql.as_ptr(),
            None,
            ptr::null_mut(),
            ptr::null_mut(),
        )
    }
}

// ── Text helpers ────────────────────────────────────────────────────────

/// Copies a NUL-terminated UTF-8 string owned by `SQLite`.
unsafe fn text_from_utf8(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return "unknown error".to_string();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Copies a NUL-terminated native-endian UTF-16 string owned by `SQLite`.
unsafe fn text_from_utf16(ptr: *const u16) -> String {
    if ptr.is_null() {
        return "unknown error".to_string();
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
}
