use std::fmt::Display;

/// Custom Result type for flatsql operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for flatsql
///
/// Every statement-level failure is one of these; none of them is fatal to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No statement prefix matched the command text
    UnknownStatement(String),
    /// Statement failed its shape check
    MalformedStatement(String),
    /// Bad column definition in CREATE TABLE
    InvalidColumnDefinition(String),
    ColumnValueCountMismatch { columns: usize, values: usize },
    /// A non_null or primary_key column got no value
    MissingRequiredValue(String),
    /// Uniqueness or non-null violation
    ConstraintViolation(String),
    /// Value does not parse as the column's declared type
    TypeMismatch(String),
    ColumnNotFound(String),
    TableNotFound(String),
    DatabaseNotFound(String),
    /// Database or table name already taken
    AlreadyExists(String),
    NoDatabaseSelected,
    NoTransactionInProgress,
    UnsupportedOperator(String),
    InvalidSetClause(String),
    /// Configuration could not be loaded or is invalid
    Config(String),
    /// File read/write failure
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Config(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownStatement(stmt) => write!(f, "invalid query: {}", stmt),
            Error::MalformedStatement(err) => write!(f, "invalid {} query", err),
            Error::InvalidColumnDefinition(err) => write!(f, "invalid column definition: {}", err),
            Error::ColumnValueCountMismatch { columns, values } => write!(
                f,
                "number of columns and values do not match ({} columns, {} values)",
                columns, values
            ),
            Error::MissingRequiredValue(col) => write!(f, "column {} must have a value", col),
            Error::ConstraintViolation(err) => write!(f, "constraint violation: {}", err),
            Error::TypeMismatch(err) => write!(f, "type mismatch: {}", err),
            Error::ColumnNotFound(col) => write!(f, "column not found: {}", col),
            Error::TableNotFound(table) => write!(f, "table not found: {}", table),
            Error::DatabaseNotFound(db) => write!(f, "database does not exist: {}", db),
            Error::AlreadyExists(name) => write!(f, "{} already exists", name),
            Error::NoDatabaseSelected => write!(f, "no database selected"),
            Error::NoTransactionInProgress => write!(f, "no transaction in progress"),
            Error::UnsupportedOperator(cond) => write!(f, "invalid condition operator: {}", cond),
            Error::InvalidSetClause(err) => write!(f, "invalid SET clause: {}", err),
            Error::Config(err) => write!(f, "config error {}", err),
            Error::Io(err) => write!(f, "io error {}", err),
        }
    }
}
