use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("{} '{}' not found", entity, key))]
    NotFound { entity: &'static str, key: String },

    #[snafu(display("{} '{}' already exists", entity, key))]
    Conflict { entity: &'static str, key: String },

    #[snafu(display("Database query failed: {}", source))]
    Sql { source: sqlx::Error },
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        StoreError::Sql { source }
    }
}
