pub mod error;
pub mod sqlite;

pub use error::StoreError;
