use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(
    name = "wpdash-child",
    version,
    about = "WPDash child agent: enroll this site with a dashboard"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML config file (defaults, then this file, then WPDASH_* env, then flags)
    #[arg(long, global = true, env = "WPDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Public base URL of the site
    #[arg(long, global = true, env = "WPDASH_SITE_URL")]
    pub site_url: Option<String>,

    /// Path of the JSON option store
    #[arg(long, global = true, env = "WPDASH_STORE_PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a dashboard public key
    Register(RegisterArgs),
    /// Rebuild the stored key with the current site identity
    Regenerate(RegenerateArgs),
    /// Show connection status
    Show(ShowArgs),
    /// Print the security ID, generating one if none exists
    SecurityId,
    /// Handle a raw inbound request (URL-encoded query or form body)
    Handle(HandleArgs),
}

#[derive(Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("key").required(true).args(["pubkey", "pubkey_file"]))]
pub struct RegisterArgs {
    /// Public key text (PEM or OpenSSH) or its base64 form
    #[arg(long)]
    pub pubkey: Option<String>,

    /// Read the public key from a file (PEM, DER or OpenSSH)
    #[arg(long)]
    pub pubkey_file: Option<PathBuf>,

    /// Identifier of the registering dashboard
    #[arg(long)]
    pub server: String,

    /// Security ID presented with the request
    #[arg(long)]
    pub security_id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RegenerateArgs {
    /// Print the key that would be stored without storing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Print status as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HandleArgs {
    /// Parameters, e.g. 'function=register&server=dash-1&pubkey=...'
    pub query: String,
}
