//! Conversions from external infrastructure errors into domain errors.

use native_tls::Error as TlsError;
use statsampler_domain::{StatSamplerError, TableName};
use tokio_postgres::error::SqlState;
use tokio_postgres::Error as PgError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StatSamplerError);

impl From<InfraError> for StatSamplerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StatSamplerError> for InfraError {
    fn from(value: StatSamplerError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStatSamplerError {
    fn into_statsampler(self) -> StatSamplerError;
}

/* -------------------------------------------------------------------------- */
/* tokio_postgres::Error → StatSamplerError */
/* -------------------------------------------------------------------------- */

/// Map a PostgreSQL error, binding it to `table` when the caller knows which
/// table the statement touched.
pub fn postgres_error(err: &PgError, table: Option<&TableName>) -> StatSamplerError {
    let message = err
        .as_db_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| err.to_string());
    classify(err.code(), &message, err.is_closed(), table)
}

fn classify(
    code: Option<&SqlState>,
    message: &str,
    closed: bool,
    table: Option<&TableName>,
) -> StatSamplerError {
    if closed {
        return StatSamplerError::Connection(format!("connection closed: {message}"));
    }

    let Some(code) = code else {
        // No SQLSTATE means the failure happened below the protocol level.
        return StatSamplerError::Connection(message.to_string());
    };

    let execution = |reason: String| StatSamplerError::Execution {
        table: table.map(ToString::to_string),
        reason,
    };

    match code {
        c if *c == SqlState::UNDEFINED_TABLE => match table {
            Some(table) => StatSamplerError::TableNotFound { table: table.to_string() },
            None => execution(format!("undefined table: {message}")),
        },
        c if *c == SqlState::INSUFFICIENT_PRIVILEGE => {
            execution(format!("insufficient privilege: {message}"))
        }
        c if *c == SqlState::SYNTAX_ERROR => execution(format!("syntax error: {message}")),
        c if *c == SqlState::QUERY_CANCELED => execution(format!("statement canceled: {message}")),
        c if *c == SqlState::LOCK_NOT_AVAILABLE => execution(format!("lock not available: {message}")),
        c if *c == SqlState::INVALID_PASSWORD
            || *c == SqlState::INVALID_AUTHORIZATION_SPECIFICATION =>
        {
            StatSamplerError::Connection(format!("authentication failed: {message}"))
        }
        c if c.code().starts_with("08") || *c == SqlState::ADMIN_SHUTDOWN => {
            StatSamplerError::Connection(message.to_string())
        }
        c => execution(format!("{message} (SQLSTATE {})", c.code())),
    }
}

impl IntoStatSamplerError for PgError {
    fn into_statsampler(self) -> StatSamplerError {
        postgres_error(&self, None)
    }
}

impl From<PgError> for InfraError {
    fn from(value: PgError) -> Self {
        InfraError(value.into_statsampler())
    }
}

/* -------------------------------------------------------------------------- */
/* native_tls::Error → StatSamplerError */
/* -------------------------------------------------------------------------- */

impl IntoStatSamplerError for TlsError {
    fn into_statsampler(self) -> StatSamplerError {
        StatSamplerError::Connection(format!("TLS setup failed: {self}"))
    }
}

impl From<TlsError> for InfraError {
    fn from(value: TlsError) -> Self {
        InfraError(value.into_statsampler())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
