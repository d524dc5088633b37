//! PostgreSQL engine: enumerates via `pg_database`, dumps with `pg_dump` in tar format

use super::{DatabaseEngine, SourceError};
use crate::config::ResolvedSourceConfig;
use crate::utils::command::{ArgStyle, DumpCommand};
use crate::utils::runtime;
use std::path::Path;
use tokio_postgres::NoTls;
use tracing::debug;

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_DATABASE: &str = "postgres";
const LIST_DATABASES: &str = "SELECT datname FROM pg_database WHERE datistemplate = FALSE";

pub struct PostgresEngine;

impl PostgresEngine {
    pub fn new() -> Self {
        Self
    }

    fn connect_config(source: &ResolvedSourceConfig) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&source.host)
            .port(source.port.unwrap_or(DEFAULT_PORT))
            .dbname(
                source
                    .connect_database
                    .as_deref()
                    .unwrap_or(DEFAULT_CONNECT_DATABASE),
            )
            .connect_timeout(source.timeout())
            .application_name("db-backup-manager");

        if !source.user.is_empty() {
            config.user(&source.user);
        }
        if !source.password.is_empty() {
            config.password(&source.password);
        }

        config
    }
}

impl Default for PostgresEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseEngine for PostgresEngine {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn dump_binary_name(&self) -> &'static str {
        "pg_dump"
    }

    fn output_file_suffix(&self) -> &'static str {
        "backup"
    }

    fn output_via_stdout(&self) -> bool {
        false
    }

    fn list_databases(&self, source: &ResolvedSourceConfig) -> Result<Vec<String>, SourceError> {
        debug!("Listing PostgreSQL databases on {}", source.host);

        let config = Self::connect_config(source);
        let timeout = source.timeout();
        let host = source.host.clone();

        runtime::block_on(async move {
            let (client, connection) = tokio::time::timeout(timeout, config.connect(NoTls))
                .await
                .map_err(|_| SourceError::Timeout(timeout))?
                .map_err(|e| SourceError::Connect {
                    engine: "PostgreSQL",
                    host,
                    reason: e.to_string(),
                })?;

            let driver = tokio::spawn(async move {
                if let Err(e) = connection.await {
                    debug!("PostgreSQL connection closed with error: {}", e);
                }
            });

            let result = tokio::time::timeout(timeout, client.query(LIST_DATABASES, &[])).await;

            // Dropping the client ends the connection task
            drop(client);
            let _ = driver.await;

            let rows = match result {
                Ok(Ok(rows)) => rows,
                Ok(Err(e)) => return Err(SourceError::Query(e.to_string())),
                Err(_) => return Err(SourceError::Timeout(timeout)),
            };

            rows.iter()
                .map(|row| row.try_get::<_, String>(0))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SourceError::Query(e.to_string()))
        })
        .map_err(SourceError::Runtime)?
    }

    fn build_dump_command(
        &self,
        source: &ResolvedSourceConfig,
        database: &str,
        output: &Path,
    ) -> DumpCommand {
        let mut command = DumpCommand::new(self.dump_binary_name())
            .option("host", &source.host, ArgStyle::Separate);

        if let Some(port) = source.port {
            command = command.option("port", port.to_string(), ArgStyle::Separate);
        }
        if !source.user.is_empty() {
            command = command.option("username", &source.user, ArgStyle::Separate);
        }
        if !source.password.is_empty() {
            // pg_dump has no password flag; --no-password stops it from prompting
            command = command.secret_env("PGPASSWORD", &source.password);
        }

        command
            .flag("no-password")
            .option("format", "tar", ArgStyle::Separate)
            .flag("blobs")
            .option("file", output.display().to_string(), ArgStyle::Separate)
            .arg(database)
    }
}
