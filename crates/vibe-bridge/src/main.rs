use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vibe_bridge::config::split_command;
use vibe_bridge::import::{self, ImportOutcome};
use vibe_bridge::{BridgeConfig, BridgeState, server};
use vibe_core::apply::workflow::load_grade_file;
use vibe_core::host::PRIMARY_NODE;
use vibe_core::{FsLutInstaller, HostSession, bake};

#[derive(Debug, Parser)]
#[command(name = "vibe-bridge")]
#[command(about = "Push Vibe Engine grades into DaVinci Resolve")]
struct Cli {
    /// tracing filter, e.g. `info` or `vibe_core=debug`
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the live HTTP bridge (default).
    Serve(ServeArgs),
    /// Apply a grade blueprint file to the selected clip.
    Import {
        /// Grade file; a picker opens when omitted.
        grade: Option<PathBuf>,
        #[command(flatten)]
        host: HostArgs,
    },
    /// Print the CDL a grade file bakes to.
    Bake {
        grade: PathBuf,
        #[arg(long, default_value_t = PRIMARY_NODE)]
        node: u32,
    },
}

#[derive(Debug, Default, Args)]
struct ServeArgs {
    #[arg(long)]
    listen: Option<String>,
    #[arg(long)]
    max_body_bytes: Option<usize>,
    #[command(flatten)]
    host: HostArgs,
}

#[derive(Debug, Default, Args)]
struct HostArgs {
    /// Resolve LUT root directory.
    #[arg(long)]
    lut_root: Option<PathBuf>,
    /// Scripting helper command line.
    #[arg(long)]
    host_command: Option<String>,
    /// Use the in-memory host.
    #[arg(long)]
    offline: bool,
}

impl HostArgs {
    fn apply(self, config: &mut BridgeConfig) {
        if let Some(root) = self.lut_root {
            config.lut_root = root;
        }
        if let Some(command) = self.host_command {
            config.host_command = split_command(&command);
        }
        config.offline |= self.offline;
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .init();

    let result = match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => run_serve(args),
        Commands::Import { grade, host } => run_import(grade, host),
        Commands::Bake { grade, node } => run_bake(grade, node),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn run_serve(args: ServeArgs) -> CliResult {
    let mut config = BridgeConfig::default();
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(limit) = args.max_body_bytes {
        config.max_body_bytes = limit;
    }
    args.host.apply(&mut config);
    let addr = config.listen_addr()?;

    let state = BridgeState::new(
        config.connector(),
        Arc::new(FsLutInstaller::new(&config.lut_root)),
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            lut_root = %config.lut_root.display(),
            "Vibe bridge listening on http://{addr}"
        );

        let startup = state.clone();
        tokio::task::spawn_blocking(move || startup.connect_on_startup()).await?;

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutting down");
        };
        server::serve(listener, state, config.max_body_bytes, shutdown).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn run_import(grade: Option<PathBuf>, host: HostArgs) -> CliResult {
    let mut config = BridgeConfig::default();
    host.apply(&mut config);

    let installer = FsLutInstaller::new(&config.lut_root);
    let mut session = HostSession::new(config.connector());
    let outcome = import::run_import(&mut session, &installer, || {
        grade.or_else(import::pick_blueprint)
    })?;

    match outcome {
        ImportOutcome::Applied(outcome) => println!("{}", import::describe(&outcome)),
        ImportOutcome::Cancelled => tracing::warn!("No file selected."),
    }
    Ok(())
}

fn run_bake(grade: PathBuf, node: u32) -> CliResult {
    let cdl = bake(&load_grade_file(&grade)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&cdl.to_parameter_map(node))?
    );
    Ok(())
}
