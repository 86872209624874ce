use clap::{Parser, Subcommand};

mod commands;
use commands::{
    handle_config_command, handle_key_command, utils::print_error, ConfigCommands, KeyCommands,
};

#[derive(Parser)]
#[command(name = "protect-cli")]
#[command(about = "Protect CLI - Management tool for the Protect RPC gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Relay Signing Key Management
    #[command(subcommand)]
    Key(KeyCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command),
        Commands::Key(key_command) => handle_key_command(key_command),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
