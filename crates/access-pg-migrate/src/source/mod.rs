//! Source database adapters.

mod odbc;

pub use odbc::AccessReader;
