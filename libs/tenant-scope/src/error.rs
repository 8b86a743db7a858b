/// Errors that can occur while building or executing a tenant-scoped bulk statement.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    /// Database error occurred during statement execution.
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// The entity declares no primary-key columns.
    #[error("table `{table}` has an empty primary key")]
    EmptyPrimaryKey { table: String },

    /// `update_all` was called without any attribute to change.
    #[error("empty list of attributes to change")]
    EmptyUpdate,

    /// An assignment targets a column the table does not have.
    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },

    /// A raw assignment could not be lowered.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    /// Scoping options could not be extracted from configuration.
    #[error("invalid tenant scope configuration: {0}")]
    Config(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ScopeError {
    fn from(err: figment::Error) -> Self {
        ScopeError::Config(Box::new(err))
    }
}
