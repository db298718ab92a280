//!  Storage is organized through [log_storage::LogStorageImpl] and [document::JsonDocument].
//!  The basic idea is:
//!   - There is a directory with all the session logs.
//!   - Every local calendar day gets its own file, one JSON session entry per line.
//!   - Files are only ever appended to.
//!   - Small dashboard state (calendar marks, todo grid, config) lives in whole-file JSON
//!     documents next to it.

pub mod document;
pub mod entities;
pub mod log_storage;
