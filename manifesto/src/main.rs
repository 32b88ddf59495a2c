use clap::{CommandFactory, Parser, Subcommand};
use format::OutputFormatter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod format;
mod resolver;

/// Manifesto - metadata for container images
///
/// Stores arbitrary named metadata blobs next to an image in its own registry.
#[derive(Parser, Debug)]
#[command(name = "manifesto")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Registry username
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Registry password (prompted for when only a username is given)
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Storage backend
    #[arg(short, long, global = true)]
    storage: Option<String>,

    /// Configuration file (defaults to .manifesto.yaml in the current or home directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Talk plain HTTP to the registry
    #[arg(long, global = true)]
    insecure: bool,

    /// Resolve digests from local images without pulling first
    #[arg(long, global = true)]
    no_pull: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a metadata blob to stdout
    Get {
        /// Image reference (name:tag or name@digest)
        image: String,
        /// Metadata type
        metadata_type: String,
    },
    /// List the metadata types stored for an image
    #[command(visible_alias = "ls")]
    List {
        /// Image reference (name:tag or name@digest)
        image: String,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Store a file as a metadata blob
    Put {
        /// Image reference (name:tag or name@digest)
        image: String,
        /// Metadata type
        metadata_type: String,
        /// File holding the metadata
        file: PathBuf,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbosity: context::VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let overrides = context::CliOverrides {
        username: cli.username,
        password: cli.password,
        storage: cli.storage,
        config_path: cli.config,
        insecure: cli.insecure,
        no_pull: cli.no_pull,
        verbose: cli.verbose,
        color: format::ColorChoice::from(cli.color.as_str()),
    };

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let ctx = match context::AppContext::build(&overrides) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::PlainFormatter.error(&e.to_string());
            std::process::exit(1);
        }
    };

    init_tracing(ctx.verbosity);

    match cli.command {
        Commands::Get {
            image,
            metadata_type,
        } => commands::get::handle_get(&ctx, &image, &metadata_type),
        Commands::List { image, format } => {
            let fmt = format::OutputFormat::from(format.as_str());
            commands::list::handle_list(&ctx, &image, fmt);
        }
        Commands::Put {
            image,
            metadata_type,
            file,
        } => commands::put::handle_put(&ctx, &image, &metadata_type, &file),
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
