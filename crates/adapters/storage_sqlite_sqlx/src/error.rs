//! Storage adapter error types.

use hearth_domain::error::HearthError;

/// Errors specific to the `SQLite` adapter.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query failed.
    #[error("sqlite query failed")]
    Query(#[from] sqlx::Error),

    /// Running migrations failed.
    #[error("sqlite migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for HearthError {
    fn from(err: StorageError) -> Self {
        HearthError::storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_domain_storage_error() {
        let err: HearthError = StorageError::Query(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, HearthError::Storage(_)));
    }
}
