use clap::Subcommand;
use protect_core::{config::AppConfig, signing::RelaySigner};
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

pub const SAMPLE_CONFIG: &str = r#"# Protect RPC Gateway Configuration
# Every value below is the built-in default unless noted.

[server]
bind_address = "127.0.0.1"
bind_port = 9000
max_concurrent_requests = 1000
request_timeout_seconds = 30
max_body_bytes = 1048576
docs_url = "https://docs.flashbots.net/flashbots-protect/rpc/quick-start/"

[relay]
# Node or provider answering every method other than eth_sendRawTransaction
proxy_url = "http://127.0.0.1:8545"
relay_url = "https://relay.flashbots.net"
# Prefer PROTECT__RELAY__SIGNING_KEY over storing the key here.
# signing_key = "0x..."

[admission]
# Literal prefix match against the client address
blacklist = ["127.0.0.2"]

[dedup]
retention_seconds = 1200
sweep_interval_seconds = 60

[logging]
level = "info"
format = "pretty"
"#;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the current configuration
    Validate {
        /// Path to config file (defaults to config/config.toml)
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show current configuration
    Show {
        /// Path to config file (defaults to config/config.toml)
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,

        /// Show sensitive values (the relay signing key)
        #[arg(long)]
        show_sensitive: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, show_sensitive } => show_config(&file, show_sensitive),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn load(file: &str) -> CliResult<AppConfig> {
    AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = load(file)?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    let signer = match config.relay.signing_key.as_deref() {
        Some(key) => Some(RelaySigner::from_hex(key)?),
        None => None,
    };

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Server: {}:{}", config.server.bind_address, config.server.bind_port);
    println!("  Proxy: {}", config.relay.proxy_url);
    println!("  Relay: {}", config.relay.relay_url);
    println!("  Blacklist: {} prefixes", config.admission.blacklist.len());
    match signer {
        Some(signer) => println!("  Signer: {}", signer.address()),
        None => print_info("No signing key configured; the gateway will refuse to start without one"),
    }

    Ok(())
}

fn show_config(file: &str, show_sensitive: bool) -> CliResult<()> {
    let config = load(file)?;

    println!("Configuration from {file}:");

    println!("\n[Server]");
    println!("  Bind Address: {}", config.server.bind_address);
    println!("  Bind Port: {}", config.server.bind_port);
    println!("  Max Concurrent Requests: {}", config.server.max_concurrent_requests);
    println!("  Request Timeout: {}s", config.server.request_timeout_seconds);
    println!("  Max Body Bytes: {}", config.server.max_body_bytes);
    println!("  Docs URL: {}", config.server.docs_url);

    println!("\n[Relay]");
    println!("  Proxy URL: {}", config.relay.proxy_url);
    println!("  Relay URL: {}", config.relay.relay_url);
    println!("  Signing Key: {}", render_signing_key(config.relay.signing_key.as_deref(), show_sensitive));

    println!("\n[Admission]");
    if config.admission.blacklist.is_empty() {
        println!("  Blacklist: (empty)");
    } else {
        println!("  Blacklist: {}", config.admission.blacklist.join(", "));
    }

    println!("\n[Dedup]");
    println!("  Retention: {}s", config.dedup.retention_seconds);
    println!("  Sweep Interval: {}s", config.dedup.sweep_interval_seconds);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

fn render_signing_key(key: Option<&str>, show_sensitive: bool) -> String {
    match key {
        None => "(not set)".to_string(),
        Some(key) if show_sensitive => key.to_string(),
        Some(_) => "[hidden - use --show-sensitive to reveal]".to_string(),
    }
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Remember to:");
    print_info("  1. Point proxy_url at your node or provider");
    print_info("  2. Set PROTECT__RELAY__SIGNING_KEY (see `protect-cli key generate`)");

    Ok(())
}
