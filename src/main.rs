use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The path to the configuration file
    #[arg(short, long, global = true)]
    config_file: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// The command to execute; without one, build and then serve and watch
    /// as the config enables
    #[command(subcommand)]
    command: Option<StitchCommand>,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to (defaults to the config's serve.host)
    #[arg(long)]
    host: Option<String>,

    /// The port to bind to (defaults to the config's serve.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// Don't watch for changes
    #[arg(long, default_value = "false")]
    no_watch: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// Only print what would be deleted
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum StitchCommand {
    /// Initialize a new site
    Init(InitArgs),

    /// Build the site once
    Build,

    /// Build, serve and watch the site
    Serve(ServeArgs),

    /// Remove the build output
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("stitch=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stitch=info,tower_http=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_file = args.config_file.as_deref();

    match args.command {
        Some(StitchCommand::Init(args)) => {
            commands::init::run(&args).await?;
        }
        Some(StitchCommand::Build) => {
            commands::build::run(config_file).await?;
        }
        Some(StitchCommand::Serve(args)) => {
            commands::serve::run(config_file, &args).await?;
        }
        Some(StitchCommand::Clean(args)) => {
            commands::clean::run(config_file, &args).await?;
        }
        None => {
            let (config, base_path) = config::SiteConfig::load_from_arg(config_file)?;
            let serve = config.serve.clone();
            let watch = config.watch.clone();
            commands::serve::run_site(config, base_path, serve, watch, false).await?;
        }
    }

    Ok(())
}
