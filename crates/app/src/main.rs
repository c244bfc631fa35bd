//! Sessiongate - console session client
//!
//! Drives the session guard of one console against a file-backed browser
//! profile.
//!
//! Subcommands:
//! - `sessiongate load <path>`    Run the guard for a page load
//! - `sessiongate status`         Show the stored access token status
//! - `sessiongate clear`          Remove the stored access token
//! - `sessiongate logout`         Forget token, pending login and session cookie
//! - `sessiongate callback`       Complete a login from the callback parameters
//! - `sessiongate key <root>`     Print the storage key of a root path
//! - `sessiongate set-cookie <h>` Store a cookie from a `Set-Cookie` header

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Client-side session and token lifecycle of a web console.
#[derive(Parser)]
#[command(name = "sessiongate", version, about)]
struct Cli {
    /// Configuration file (default: ./sessiongate.{toml,yaml,json} if present).
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Profile directory holding local storage and cookies.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session guard for a page load.
    Load {
        /// Requested path, e.g. /console/applications (default: the root path).
        path: Option<String>,
    },

    /// Show the status of the stored access token.
    Status,

    /// Remove the stored access token, keeping the session.
    Clear,

    /// Forget the access token, any pending login and the session cookie.
    Logout,

    /// Complete a login with the parameters the identity provider returned.
    Callback {
        /// Authorization code.
        #[arg(long)]
        code: String,

        /// Opaque state echoed back by the identity provider.
        #[arg(long)]
        state: String,
    },

    /// Print the local storage key of a console root path.
    Key {
        /// Root path, e.g. /console.
        root_path: String,
    },

    /// Store a cookie received from the console origin.
    SetCookie {
        /// Raw `Set-Cookie` header value.
        header: String,

        /// Received from the account app instead of the console.
        #[arg(long)]
        account: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::Key { root_path } = &cli.command {
        commands::print_key(root_path);
        return Ok(());
    }

    let runtime = commands::Runtime::open(cli.config.as_deref(), cli.data_dir)?;
    match cli.command {
        Commands::Load { path } => runtime.load(path.as_deref()).await?,
        Commands::Status => runtime.status().await?,
        Commands::Clear => runtime.clear().await?,
        Commands::Logout => runtime.logout().await?,
        Commands::Callback { code, state } => runtime.callback(&code, &state).await?,
        Commands::SetCookie { header, account } => runtime.set_cookie(&header, account).await?,
        Commands::Key { .. } => {}
    }

    Ok(())
}
