use clap::Subcommand;
use protect_core::signing::RelaySigner;

use super::utils::{print_info, print_success, CliError, CliResult};

const KEY_ENV_VAR: &str = "PROTECT__RELAY__SIGNING_KEY";

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Generate a new relay signing key
    Generate,

    /// Print the address a signing key authenticates as
    Address {
        /// Hex-encoded private key (falls back to PROTECT__RELAY__SIGNING_KEY)
        #[arg(long)]
        key: Option<String>,
    },
}

pub fn handle_key_command(command: KeyCommands) -> CliResult<()> {
    match command {
        KeyCommands::Generate => generate_key(),
        KeyCommands::Address { key } => show_address(key),
    }
}

fn generate_key() -> CliResult<()> {
    let signer = RelaySigner::random();

    print_success("Generated relay signing key");
    println!("  Address:     {}", signer.address());
    println!("  Private key: {}", signer.secret_hex());
    print_info(&format!("Export it as {KEY_ENV_VAR} and keep it out of config files"));

    Ok(())
}

fn show_address(key: Option<String>) -> CliResult<()> {
    let key = key
        .or_else(|| std::env::var(KEY_ENV_VAR).ok())
        .ok_or_else(|| CliError::Key(format!("No key given and {KEY_ENV_VAR} is not set")))?;

    println!("{}", address_for(&key)?);
    Ok(())
}

fn address_for(key: &str) -> CliResult<String> {
    Ok(RelaySigner::from_hex(key.trim())?.address().to_string())
}
