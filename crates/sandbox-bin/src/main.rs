use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use sandbox_core::{Encoding, SandboxConfig, SandboxFilesystem, WriteEntry};

#[derive(Parser, Debug)]
#[command(name = "sandbox-fs")]
#[command(about = "Manipulate the filesystem of a remote sandbox")]
#[command(version)]
struct Cli {
    /// Sandbox control-plane URL (e.g., https://sandbox.example.com)
    #[arg(long, env = "SANDBOX_URL", global = true)]
    sandbox_url: Option<String>,

    /// Bearer secret for the sandbox API
    #[arg(long, env = "SANDBOX_SECRET", global = true, hide_env_values = true)]
    secret: Option<String>,

    /// Path to config file
    #[arg(long, env = "SANDBOX_CONFIG_PATH", global = true)]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "SANDBOX_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a directory
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Print a file
    Cat {
        path: String,
        #[arg(long, default_value = "utf-8")]
        encoding: Encoding,
    },
    /// Write text to a file
    Write {
        path: String,
        content: String,
        /// Append instead of overwriting
        #[arg(long)]
        append: bool,
    },
    /// Write several files from a JSON array of {path, content, encoding?}
    Batch { manifest: PathBuf },
    /// Create a directory (parents are always created)
    Mkdir { path: String },
    /// Remove a file, or a tree with -r
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Move or rename a file
    Mv { source: String, destination: String },
    /// Exit 0 if the path exists, 1 otherwise
    Exists { path: String },
    /// Upload a local file
    Put {
        local: PathBuf,
        remote: String,
        #[arg(long, default_value = "utf-8")]
        encoding: Encoding,
    },
    /// Download a remote file
    Get {
        remote: String,
        local: PathBuf,
        #[arg(long, default_value = "utf-8")]
        encoding: Encoding,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config, CLI args override it
    let config_path = cli
        .config_path
        .map(PathBuf::from)
        .unwrap_or_else(SandboxConfig::default_path);

    let mut config = if config_path.exists() {
        debug!("loading config from {}", config_path.display());
        SandboxConfig::load(&config_path)?
    } else {
        SandboxConfig::default()
    };

    if let Some(url) = cli.sandbox_url {
        config.sandbox_url = url;
    }
    if let Some(secret) = cli.secret {
        config.secret = Some(secret);
    }

    if config.sandbox_url.is_empty() {
        anyhow::bail!("sandbox URL is required (--sandbox-url or config file)");
    }

    let fs = SandboxFilesystem::connect(&config).context("failed to create sandbox client")?;
    run(&fs, cli.command)
}

fn run(fs: &SandboxFilesystem, command: Commands) -> Result<()> {
    match command {
        Commands::Ls { path } => {
            for name in fs.ls(&path)? {
                println!("{}", name);
            }
        }
        Commands::Cat { path, encoding } => {
            let content = fs.read_file(&path, encoding)?;
            print!("{}", content.content);
        }
        Commands::Write {
            path,
            content,
            append,
        } => {
            let mode = if append { "a" } else { "w" };
            fs.with_open(&path, mode, |handle| handle.write(&content))?;
            info!("wrote {} bytes to {}", content.len(), path);
        }
        Commands::Batch { manifest } => {
            let data = std::fs::read_to_string(&manifest)
                .with_context(|| format!("failed to read manifest {}", manifest.display()))?;
            let entries: Vec<WriteEntry> =
                serde_json::from_str(&data).context("failed to parse manifest JSON")?;
            fs.write_files(&entries)?;
            info!("wrote {} files", entries.len());
        }
        Commands::Mkdir { path } => fs.mkdir(&path, true)?,
        Commands::Rm { path, recursive } => fs.rm(&path, recursive)?,
        Commands::Mv {
            source,
            destination,
        } => fs.move_file(&source, &destination)?,
        Commands::Exists { path } => {
            if !fs.try_exists(&path)? {
                std::process::exit(1);
            }
        }
        Commands::Put {
            local,
            remote,
            encoding,
        } => {
            fs.upload_file(&local, &remote, encoding)?;
            info!("uploaded {} -> {}", local.display(), remote);
        }
        Commands::Get {
            remote,
            local,
            encoding,
        } => {
            fs.download_file(&remote, &local, encoding)?;
            info!("downloaded {} -> {}", remote, local.display());
        }
    }
    Ok(())
}
