//! CLI argument parsing, validation, and startup helpers.

use clap::Parser;
use tracing::error;
use url::Url;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sessionframe",
    about = "Admin API client with a persistent, self-refreshing session"
)]
pub struct Args {
    /// Backend API base URL
    #[arg(
        short,
        long,
        env = "SESSIONFRAME_BASE_URL",
        default_value = "http://localhost:3001/api"
    )]
    pub base_url: String,

    /// Path of the credentials file for remembered sessions
    #[arg(
        short,
        long,
        env = "SESSIONFRAME_CREDENTIALS",
        default_value = "sessionframe-credentials.json"
    )]
    pub credentials: String,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and store the session credentials
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Persist the session across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Register a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the authenticated user's profile
    Whoami,
    /// Update profile fields of the authenticated user
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Change the authenticated user's password
    ChangePassword {
        #[arg(long)]
        current_password: String,
        #[arg(long)]
        new_password: String,
    },
    /// Log out and clear stored credentials
    Logout,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Parse and validate the backend base URL.
/// Returns None and logs an error if validation fails.
pub fn validate_base_url(base_url: &str) -> Option<Url> {
    let url = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %base_url, error = %e, "Invalid base URL");
            return None;
        }
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        error!(url = %base_url, "Base URL must use http or https");
        return None;
    }

    Some(url)
}
