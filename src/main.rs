use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use db_backup_manager::config;
use db_backup_manager::managers::backup::BackupManager;
use db_backup_manager::managers::logging::{self, LoggingConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "db-backup-manager")]
#[command(about = "Scheduled MySQL and PostgreSQL backups with dated retention", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/db-backup-manager/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run backups for all enabled sources or a specific source
    Run {
        /// Specific source to backup (defaults to all enabled sources)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Show the databases a source would back up
    Databases {
        /// Source name
        #[arg(short, long)]
        source: String,
    },

    /// List all configured sources
    Sources,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            // No log directory known yet
            logging::init_console_logging();
            return Err(e).context(format!("Failed to load {:?}", cli.config));
        }
    };
    let resolved_sources = config::resolve_all_sources(&config)?;

    let command = cli.command.unwrap_or(Commands::Sources);

    // Setup logging with file rotation (must keep guard alive); validate stays console-only
    let _log_guard = match command {
        Commands::Validate => None,
        _ => Some(logging::init_logging(&LoggingConfig::from_global(
            &config.global,
        ))?),
    };

    let source_count = resolved_sources.len();
    let backup_manager = BackupManager::new(config.clone(), resolved_sources);

    match command {
        Commands::Run { source } => {
            if let Some(source_name) = source {
                println!("Running backup for source: {}", source_name);
                let report = backup_manager.backup_source(&source_name)?;
                match report.bucket {
                    Some(bucket) => println!(
                        "✓ Stored {} backup(s) under {}",
                        report.files.len(),
                        bucket
                    ),
                    None => println!("Nothing was stored for {}", source_name),
                }
            } else {
                println!("Running backups for all enabled sources...");
                backup_manager.backup_all()?;
                println!("✓ All backups completed successfully");
            }
        }

        Commands::Databases { source } => {
            let databases = backup_manager.list_databases(&source)?;
            if databases.is_empty() {
                println!("No databases to back up for source '{}'", source);
            }
            for database in databases {
                println!("{}", database);
            }
        }

        Commands::Sources => {
            println!("Configured sources:");
            for name in backup_manager.list_sources() {
                let Some(source) = backup_manager.get_source(&name) else {
                    continue;
                };
                println!("  {}", name);
                if !source.description.is_empty() {
                    println!("    Description: {}", source.description);
                }
                println!("    Enabled: {}", source.enabled);
                println!("    Engine: {} at {}", source.engine, source.host);
                println!("    Target: {}", source.target);
                println!(
                    "    Retention: {} x {}",
                    source.strategy.revisions, source.strategy.provider
                );
                println!();
            }
        }

        Commands::Validate => {
            println!("Configuration is valid!");
            println!("Sources: {}", source_count);
            println!("Targets: {}", config.targets.len());
        }
    }

    Ok(())
}
