mod commands;

use bundlecat_core::{ComposeRequest, DedupPolicy};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_RENDER_ERROR, EXIT_VALIDATION_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "bundlecat",
    version,
    about = "Compose operator bundle images into file-based catalogs"
)]
struct Cli {
    /// Path to the local image store directory.
    #[arg(long, default_value = "~/.local/share/bundlecat", global = true)]
    store: String,

    /// Composer config file (defaults to ~/.config/bundlecat/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compose a bundle image into a catalog and print the install hand-off.
    Compose {
        /// Bundle image reference.
        bundle_image: String,
        /// Index image to merge into (defaults to the configured default index).
        #[arg(long)]
        index_image: Option<String>,
        /// File holding the package description for minimal catalogs.
        #[arg(long)]
        description: Option<PathBuf>,
        /// Directory the catalog directory is created under.
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// How to detect a package already present in the index.
        #[arg(long)]
        dedup: Option<DedupPolicy>,
        /// Render index and bundle concurrently.
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Write the catalog file.
        #[arg(long, default_value_t = false)]
        write: bool,
    },
    /// Show the catalog format of an image.
    Classify {
        /// Image reference.
        image: String,
    },
    /// Print the catalog content of an image.
    Render {
        /// Image reference.
        image: String,
    },
    /// Decode and validate a file-based catalog file.
    Validate {
        /// Path to the catalog file.
        file: PathBuf,
    },
    /// Add an image to the local store.
    Import {
        /// Image reference.
        reference: String,
        /// JSON object of image labels.
        #[arg(long)]
        labels: PathBuf,
        /// File-based catalog content for the image.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List images in the local store.
    Images,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("BUNDLECAT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let store_path = expand_tilde(&cli.store);
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Compose {
            bundle_image,
            index_image,
            description,
            work_dir,
            dedup,
            parallel,
            write,
        } => commands::load_config(cli.config.as_deref()).and_then(|config| {
            let config = commands::compose::Overrides {
                work_dir,
                dedup,
                parallel,
            }
            .apply(config);
            let request = ComposeRequest {
                bundle_image,
                index_image,
                description,
            };
            commands::compose::run(&store_path, config, &request, write, json_output)
        }),
        Commands::Classify { image } => commands::classify::run(&store_path, &image, json_output),
        Commands::Render { image } => commands::render::run(&store_path, &image),
        Commands::Validate { file } => commands::validate::run(&file, json_output),
        Commands::Import {
            reference,
            labels,
            catalog,
        } => commands::import::run(
            &store_path,
            &reference,
            &labels,
            catalog.as_deref(),
            json_output,
        ),
        Commands::Images => commands::images::run(&store_path, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("render error:") || msg.starts_with("label error:") {
                EXIT_RENDER_ERROR
            } else if msg.starts_with("validation error:") {
                EXIT_VALIDATION_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
