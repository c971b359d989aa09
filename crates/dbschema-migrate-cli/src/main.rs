//! dbschema-migrate CLI - recreate a schema's tables on another database.

use clap::Parser;
use dbschema_migrate::{MigrateError, MigrationRequest, SchemaMigrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "dbschema-migrate")]
#[command(about = "Migrate table definitions between SQL dialects")]
#[command(version)]
struct Cli {
    /// Path to the migration request (.yaml, .yml or .json)
    #[arg(short, long)]
    config: PathBuf,

    /// Append the generated DDL to this file instead of printing it
    #[arg(short = 'p', long)]
    save_path: Option<PathBuf>,

    /// Override source schema
    #[arg(long)]
    source_schema: Option<String>,

    /// Override target schema
    #[arg(long)]
    target_schema: Option<String>,

    /// Only migrate these tables (comma-separated)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Ping both databases and exit without migrating
    #[arg(long)]
    health_check: bool,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(MigrateError::Config)?;

    let mut request = MigrationRequest::read(&cli.config)?;
    if let Some(schema) = cli.source_schema {
        request.source_schema = schema;
    }
    if let Some(schema) = cli.target_schema {
        request.target_schema = schema;
    }
    if let Some(tables) = cli.tables {
        request.table_list = tables
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    request.validate()?;
    info!("Loaded migration request from {:?}", cli.config);

    let migrator = SchemaMigrator::with_builtins();

    if cli.health_check {
        let outcome = health_check(&migrator, &request).await;
        migrator.registry().close_all().await;
        return outcome;
    }

    let cancel_token = setup_signal_handler();
    let outcome = migrator.run(&request, Some(cancel_token)).await;
    migrator.registry().close_all().await;
    let result = outcome?;

    if let Some(ref path) = cli.save_path {
        SchemaMigrator::save_ddl(path, &result.ddl)?;
    }

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else if cli.save_path.is_none() {
        print!("{}", result.ddl);
    }

    info!(
        "Migration {} created {} table(s) with {} warning(s)",
        result.run_id,
        result.tables.len(),
        result.warnings.len()
    );
    Ok(())
}

async fn health_check(
    migrator: &SchemaMigrator,
    request: &MigrationRequest,
) -> Result<(), MigrateError> {
    let target = request.target_config();
    let sides = [
        ("Source", request.source_name(), &request.source),
        ("Target", request.target_name(), &target),
    ];
    let mut healthy = true;
    println!("Health Check Results:");
    for (label, name, config) in sides {
        let outcome = match migrator
            .registry()
            .open(name, config, migrator.catalog())
            .await
        {
            Ok(_) => migrator.registry().ping(name).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => println!("  {} '{}' ({}): OK", label, name, config.db_type),
            Err(e) => {
                healthy = false;
                println!("  {} '{}' ({}): FAILED", label, name, config.db_type);
                println!("    Error: {}", e);
            }
        }
    }
    println!(
        "\n  Overall: {}",
        if healthy { "HEALTHY" } else { "UNHEALTHY" }
    );
    if !healthy {
        return Err(MigrateError::connection(
            request.source_name(),
            "health check failed",
        ));
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // stdout carries the DDL, so logs go to stderr.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}', expected text or json", other)),
    }

    Ok(())
}

/// Cancel the run on SIGINT or SIGTERM.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, label) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Stopping after the current step...", label);
                    token.cancel();
                });
            }
            Err(e) => eprintln!("Could not install {} handler: {}", label, e),
        }
    }

    cancel_token
}

/// Cancel the run on Ctrl-C.
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Stopping after the current step...");
            token.cancel();
        }
    });

    cancel_token
}
