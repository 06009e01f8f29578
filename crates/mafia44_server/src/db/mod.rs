//! SQLite persistence for rooms, games and their history.

mod error;
mod models;
mod repository;
mod schema;

pub use error::{DbError, DbErrorKind};
pub use repository::{MIGRATIONS, SqliteStore};
