//! Destination database adapters.

mod postgres;
pub mod tls;

pub use postgres::PgWriter;
