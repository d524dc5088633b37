//! MySQL / MariaDB engine: enumerates with `SHOW DATABASES`, dumps with `mysqldump`

use super::{DatabaseEngine, SourceError};
use crate::config::ResolvedSourceConfig;
use crate::utils::command::{ArgStyle, DumpCommand};
use crate::utils::runtime;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use std::path::Path;
use tracing::debug;

const DEFAULT_PORT: u16 = 3306;

pub struct MySqlEngine;

impl MySqlEngine {
    pub fn new() -> Self {
        Self
    }

    fn connect_opts(source: &ResolvedSourceConfig) -> Opts {
        OptsBuilder::default()
            .ip_or_hostname(source.host.clone())
            .tcp_port(source.port.unwrap_or(DEFAULT_PORT))
            .user(non_empty(&source.user))
            .pass(non_empty(&source.password))
            .db_name(source.connect_database.clone())
            .into()
    }
}

impl Default for MySqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseEngine for MySqlEngine {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn dump_binary_name(&self) -> &'static str {
        "mysqldump"
    }

    fn output_file_suffix(&self) -> &'static str {
        "sql"
    }

    fn output_via_stdout(&self) -> bool {
        true
    }

    fn system_databases(&self) -> &'static [&'static str] {
        &["information_schema", "performance_schema", "mysql", "sys"]
    }

    fn list_databases(&self, source: &ResolvedSourceConfig) -> Result<Vec<String>, SourceError> {
        debug!("Listing MySQL databases on {}", source.host);

        let opts = Self::connect_opts(source);
        let timeout = source.timeout();
        let host = source.host.clone();

        runtime::block_on(async move {
            let mut conn = tokio::time::timeout(timeout, Conn::new(opts))
                .await
                .map_err(|_| SourceError::Timeout(timeout))?
                .map_err(|e| SourceError::Connect {
                    engine: "MySQL",
                    host,
                    reason: e.to_string(),
                })?;

            let result = tokio::time::timeout(timeout, conn.query::<String, _>("SHOW DATABASES")).await;

            // Never keep the connection around for the dump phase
            if let Err(e) = conn.disconnect().await {
                debug!("Error while closing MySQL connection: {}", e);
            }

            match result {
                Ok(Ok(databases)) => Ok(databases),
                Ok(Err(e)) => Err(SourceError::Query(e.to_string())),
                Err(_) => Err(SourceError::Timeout(timeout)),
            }
        })
        .map_err(SourceError::Runtime)?
    }

    fn build_dump_command(
        &self,
        source: &ResolvedSourceConfig,
        database: &str,
        _output: &Path,
    ) -> DumpCommand {
        let mut command = DumpCommand::new(self.dump_binary_name())
            .option("host", &source.host, ArgStyle::Equals);

        if let Some(port) = source.port {
            command = command.option("port", port.to_string(), ArgStyle::Equals);
        }
        if !source.user.is_empty() {
            command = command.option("user", &source.user, ArgStyle::Equals);
        }
        if !source.password.is_empty() {
            command = command.secret_option("password", &source.password, ArgStyle::Equals);
        }

        // mysqldump writes to stdout; the executor captures it into the output file
        command.flag("databases").arg(database)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
