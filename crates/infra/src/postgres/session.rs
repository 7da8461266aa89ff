//! `tokio-postgres` backed database session.
//!
//! One client per session; the connection future runs on its own task and is
//! torn down by [`DatabaseSession::close`]. Statements are issued one at a
//! time through an async mutex, matching the sequential flow controllers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use postgres_native_tls::MakeTlsConnector;
use statsampler_core::{DatabaseSession, QueryRow, SqlValue};
use statsampler_domain::constants::{MAX_STATISTICS_TARGET, ROWS_PER_STATISTICS_TARGET};
use statsampler_domain::{DatabaseConfig, Result as DomainResult, StatSamplerError, TableName};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, info, instrument, warn};

use crate::errors::{postgres_error, InfraError};

/// `default_statistics_target` that makes ANALYZE sample about `sample_rows`
/// rows.
///
/// ANALYZE reads `300 × target` rows, so the target is `ceil(rows / 300)`
/// within PostgreSQL's accepted range of 1..=10000.
pub fn statistics_target_for(sample_rows: u64) -> u32 {
    let target = sample_rows.div_ceil(ROWS_PER_STATISTICS_TARGET);
    target.clamp(1, MAX_STATISTICS_TARGET) as u32
}

/// Database session over a single PostgreSQL connection.
pub struct PostgresSession {
    client: Mutex<Option<Client>>,
    connection: Mutex<Option<JoinHandle<()>>>,
}

impl PostgresSession {
    /// Open a connection described by `config`.
    ///
    /// # Errors
    /// Returns `StatSamplerError::Connection` when the server cannot be
    /// reached, rejects the credentials, or TLS cannot be set up.
    #[instrument(
        skip(config),
        fields(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            tls = config.require_tls
        )
    )]
    pub async fn connect(config: &DatabaseConfig) -> DomainResult<Self> {
        let pg_config = build_pg_config(config);
        let started = Instant::now();

        let (client, connection) = if config.require_tls {
            let connector = native_tls::TlsConnector::new().map_err(InfraError::from)?;
            let (client, connection) = pg_config
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| connect_error(config, &e))?;
            (client, tokio::spawn(drive_connection(connection)))
        } else {
            let (client, connection) =
                pg_config.connect(NoTls).await.map_err(|e| connect_error(config, &e))?;
            (client, tokio::spawn(drive_connection(connection)))
        };

        info!(duration_ms = started.elapsed().as_millis() as u64, "database session opened");
        Ok(Self { client: Mutex::new(Some(client)), connection: Mutex::new(Some(connection)) })
    }
}

fn build_pg_config(config: &DatabaseConfig) -> tokio_postgres::Config {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(&config.dbname)
        .application_name(&config.application_name)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
    if let Some(password) = &config.password {
        pg_config.password(password);
    }
    pg_config
}

fn connect_error(config: &DatabaseConfig, err: &tokio_postgres::Error) -> StatSamplerError {
    StatSamplerError::Connection(format!(
        "failed to connect to {}:{}/{}: {err}",
        config.host, config.port, config.dbname
    ))
}

async fn drive_connection<F>(connection: F)
where
    F: std::future::Future<Output = Result<(), tokio_postgres::Error>>,
{
    if let Err(err) = connection.await {
        warn!(error = %err, "database connection terminated with error");
    }
}

fn closed_error() -> StatSamplerError {
    StatSamplerError::execution("database session is closed")
}

fn map_pg(err: tokio_postgres::Error) -> StatSamplerError {
    InfraError::from(err).into()
}

fn convert_row(row: &Row) -> DomainResult<QueryRow> {
    let mut converted = QueryRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = convert_value(row, idx, column.type_()).map_err(map_pg)?;
        converted.insert(column.name(), value);
    }
    Ok(converted)
}

fn convert_value(row: &Row, idx: usize, ty: &Type) -> Result<SqlValue, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| SqlValue::Int(v.into())),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| SqlValue::Int(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::Int),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(|v| SqlValue::Int(v.into())),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(|v| SqlValue::Float(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Float),
        Type::CHAR => row
            .try_get::<_, Option<i8>>(idx)?
            .map(|v| SqlValue::Text(char::from(v as u8).to_string())),
        Type::JSON | Type::JSONB => {
            row.try_get::<_, Option<serde_json::Value>>(idx)?.map(SqlValue::Json)
        }
        _ => row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

#[async_trait]
impl DatabaseSession for PostgresSession {
    #[instrument(skip(self, sql, params), fields(params = params.len()))]
    async fn run_query(&self, sql: &str, params: &[&str]) -> DomainResult<Vec<QueryRow>> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or_else(closed_error)?;

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|param| param as &(dyn ToSql + Sync)).collect();
        let rows = client.query(sql, &bound).await.map_err(map_pg)?;

        debug!(rows = rows.len(), "query returned");
        rows.iter().map(convert_row).collect()
    }

    #[instrument(skip(self, sql))]
    async fn run_explain_analyze(&self, sql: &str) -> DomainResult<serde_json::Value> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or_else(closed_error)?;

        let explain = format!("EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) {sql}");
        let row = client.query_one(explain.as_str(), &[]).await.map_err(map_pg)?;
        row.try_get::<_, serde_json::Value>(0).map_err(map_pg)
    }

    #[instrument(skip(self), fields(table = %table))]
    async fn run_statistics_refresh(
        &self,
        table: &TableName,
        sample_rows: Option<u64>,
    ) -> DomainResult<()> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or_else(closed_error)?;
        let analyze = format!("ANALYZE {}", table.quoted());
        let table_error = |err: tokio_postgres::Error| postgres_error(&err, Some(table));

        let Some(rows) = sample_rows else {
            return client.batch_execute(analyze.as_str()).await.map_err(table_error);
        };

        let target = statistics_target_for(rows);
        debug!(sample_rows = rows, statistics_target = target, "sampled analyze");

        client
            .batch_execute(format!("SET default_statistics_target = {target}").as_str())
            .await
            .map_err(table_error)?;
        let analyzed = client.batch_execute(analyze.as_str()).await.map_err(table_error);
        let reset = client
            .batch_execute("RESET default_statistics_target")
            .await
            .map_err(table_error);

        analyzed.and(reset)
    }

    async fn close(&self) -> DomainResult<()> {
        let client = self.client.lock().await.take().ok_or_else(closed_error)?;
        drop(client);

        if let Some(connection) = self.connection.lock().await.take() {
            if let Err(err) = connection.await {
                warn!(error = %err, "database connection task did not shut down cleanly");
            }
        }
        info!("database session closed");
        Ok(())
    }
}
