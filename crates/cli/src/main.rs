use crate::{
    commands::Commands,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::adapter::Adapter;
use engine_config::settings::{Settings, default_settings_path, file::SyncMode};
use engine_runtime::factory;
use model::{
    pagination::cursor::PageCursor,
    period::{ReportWindow, parse_instant},
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod commands;
mod error;
mod logging;
mod shutdown;

const FALLBACK_PAGE_SIZE: usize = 100;

#[derive(Parser)]
#[command(
    name = "tillsync",
    version,
    about = "Moves point-of-sale transactions to a remote collector"
)]
struct Cli {
    /// Settings file; defaults to <executable name>.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code.into(),
        Err(err) => {
            error!(error = %err, "Stopped on error");
            eprintln!("Error: {err}");
            ExitCode::GeneralError.into()
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let path = cli.config.unwrap_or_else(default_settings_path);
    let settings = Settings::load(&path)?;
    let _log_guard = logging::init(&settings.logging)?;
    info!(path = %path.display(), mode = ?settings.mode, "Settings loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_mode(&settings).await,
        Commands::CheckConfig => {
            print_settings(&settings);
            Ok(ExitCode::Success)
        }
        Commands::TestConn => {
            Adapter::sql(settings.source.kind, &settings.source.connection)
                .ping()
                .await?;
            println!("Connection to {} source succeeded", settings.source.kind);
            Ok(ExitCode::Success)
        }
        Commands::RenderQuery {
            date_from,
            date_to,
            from,
            count,
        } => {
            let page_size = match count {
                Some(0) => return Err(CliError::InvalidCount),
                Some(count) => count,
                None => settings
                    .push
                    .as_ref()
                    .map(|push| push.page_size)
                    .unwrap_or(FALLBACK_PAGE_SIZE),
            };
            let window = ReportWindow::new(parse_instant(&date_from)?, parse_instant(&date_to)?);
            let sql = factory::create_extractor(&settings.source)
                .render(&window, PageCursor::new(from, page_size))
                .await?;
            println!("{sql}");
            Ok(ExitCode::Success)
        }
    }
}

async fn run_mode(settings: &Settings) -> Result<ExitCode, CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    engine_runtime::run(settings, shutdown.cancel_token()).await?;

    if shutdown.is_shutdown_requested() {
        info!("Stopped by signal");
        return Ok(ExitCode::ShutdownRequested);
    }
    Ok(ExitCode::Success)
}

fn print_settings(settings: &Settings) {
    let source = &settings.source;
    println!("mode:         {:?}", settings.mode);
    println!("source:       {}", source.kind);
    println!("query file:   {}", source.query_file.display());
    println!(
        "filter:       {}",
        if source.filter.is_empty() {
            "(none)"
        } else {
            source.filter.fragment()
        }
    );
    println!(
        "retry:        {} attempts, {:?} apart",
        settings.retry.max_attempts, settings.retry.delay
    );

    match settings.mode {
        SyncMode::Push => {
            if let Some(push) = &settings.push {
                println!("period url:   {}", push.period_url);
                println!("delivery url: {}", push.delivery_url);
                println!("activation:   {}", push.activation_time);
                println!("page size:    {}", push.page_size);
            }
        }
        SyncMode::Pull => {
            if let Some(pull) = &settings.pull {
                println!("listen on:    {}", pull.bind_addr);
                println!("timeout:      {:?}", pull.handler_timeout);
            }
        }
    }
}
