//! Vitotrol CLI - command-line access to Viessmann boilers through the
//! Vitodata web service.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::AttrResolver;
use crate::config::Config;
use crate::output::OutputContext;

#[derive(Parser)]
#[command(name = "vitotrol-cli")]
#[command(author, version, about = "Viessmann Vitotrol/Vitodata CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Vitodata account login
    #[arg(short, long, env = "VITOTROL_LOGIN")]
    login: Option<String>,

    /// Vitodata account password
    #[arg(short, long, env = "VITOTROL_PASSWORD")]
    password: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "VITOTROL_CONFIG")]
    config: Option<PathBuf>,

    /// Endpoint URL (defaults to the production Vitodata server)
    #[arg(short, long, env = "VITOTROL_SERVER")]
    server: Option<String>,

    /// Device selector: index, device ID, device name, devID@locID or
    /// devName@locName (defaults to the first device)
    #[arg(short, long)]
    device: Option<String>,

    /// JSON output
    #[arg(short, long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Trace requests and responses
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the devices attached to the account
    Devices,

    /// List known attribute or timesheet names (no authentication)
    List {
        /// What to list: attrs (default) or timesheets
        what: Option<String>,
    },

    /// Read attribute values
    Get {
        /// Attribute names or numeric IDs
        #[arg(required_unless_present = "all")]
        attrs: Vec<String>,

        /// Read every known attribute
        #[arg(long)]
        all: bool,

        /// Ask the device for fresh values before reading
        #[arg(short, long)]
        refresh: bool,
    },

    /// Write attribute values: ATTR VALUE [ATTR VALUE ...]
    Set {
        /// Attribute/value pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },

    /// Show the device error history
    Errors,

    /// Show one or more timesheets
    Timesheet {
        /// Timesheet names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Rewrite a whole timesheet from a JSON definition
    SetTimesheet {
        /// Timesheet name
        name: String,

        /// JSON definition, or @FILE to read it from a file
        definition: String,
    },

    /// Dump the attributes the device itself exposes
    RemoteAttrs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let merged = config.merge_with_args(
        cli.login.as_deref(),
        cli.password.as_deref(),
        cli.server.as_deref(),
        cli.device.as_deref(),
    );

    let ctx = OutputContext::new(cli.json, cli.verbose);

    match &cli.command {
        Commands::Devices => {
            let session = commands::login_session(&merged, cli.debug).await?;
            commands::devices(&session, &ctx).await?;
        }

        Commands::List { what } => {
            commands::list(what.as_deref(), &ctx)?;
        }

        Commands::Get {
            attrs,
            all,
            refresh,
        } => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let mut device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            let mut resolver = AttrResolver::new();
            commands::get(&session, &mut device, &mut resolver, attrs, *all, *refresh, &ctx)
                .await?;
        }

        Commands::Set { pairs } => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            let mut resolver = AttrResolver::new();
            commands::set(&session, &device, &mut resolver, pairs, &ctx).await?;
        }

        Commands::Errors => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let mut device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            commands::errors(&session, &mut device, &ctx).await?;
        }

        Commands::Timesheet { names } => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let mut device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            commands::timesheet(&session, &mut device, names, &ctx).await?;
        }

        Commands::SetTimesheet { name, definition } => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            commands::set_timesheet(&session, &device, name, definition, &ctx).await?;
        }

        Commands::RemoteAttrs => {
            let session = commands::login_session(&merged, cli.debug).await?;
            let device = commands::select_device(&session, merged.device.as_deref(), &ctx)?;
            commands::remote_attrs(&session, &device, &ctx).await?;
        }
    }

    Ok(())
}
