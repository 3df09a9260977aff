/// Errors raised by [`RecordStore`](crate::RecordStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A row was rejected by a table constraint (not-null, unique, foreign key).
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A table or column name that is not a plain SQL identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A row came back in a shape that is not a JSON object.
    #[error("Unexpected row shape from table {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the error is a rejected row rather than an infrastructure failure.
    pub fn is_constraint(&self) -> bool {
        match self {
            StoreError::Constraint(_) => true,
            // PostgreSQL class 23 = integrity constraint violation.
            StoreError::Database(sqlx::Error::Database(db)) => db
                .code()
                .is_some_and(|code| code.starts_with("23")),
            _ => false,
        }
    }
}
