use clap::{Parser, Subcommand};

mod cli_types;
mod commands;

use cli_types::FormatArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Language Server Protocol server
    Server {
        /// TCP port to listen on (for debugging)
        #[arg(long)]
        port: Option<u16>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Format a Verilog/SystemVerilog file with verible-verilog-format
    Format(FormatArgs),
    /// Create a default .veriformat.toml in the current directory
    Init,
    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Server { verbose, .. } => *verbose,
        Commands::Format(args) => args.verbose,
        Commands::Init | Commands::Version => false,
    };

    // Logs go to stderr; stdout carries the LSP transport or formatted output.
    // RUST_LOG takes precedence over --verbose.
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    match cli.command {
        Commands::Server { port, config, .. } => commands::server::handle_server(port, config),
        Commands::Format(args) => commands::format::handle_format(&args),
        Commands::Init => commands::init::handle_init(),
        Commands::Version => commands::version::handle_version(),
    }
}
