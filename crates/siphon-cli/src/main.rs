//! siphon - command-line access to file pools
//!
//! Every pool verb is a subcommand, plus `siphon`, which streams a file from
//! one pool to another without staging it on disk.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use siphon_cloud::{CloudError, ObjectPool};
use siphon_core::{siphon_file, FileEntry, FileInfo, FilePool, PoolConfig, Siphonable};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod settings;

use settings::ConfigArgs;

/// siphon - move files in and out of object storage
#[derive(Parser)]
#[command(name = "siphon")]
#[command(author, version, about = "Filesystem verbs over object storage", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the backend identifier
    Info,

    /// List containers, or the entries under a path
    Ls {
        /// Pool path, e.g. /bucket/dir
        #[arg(default_value = "/")]
        path: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download an object
    Get {
        /// Pool path of the object
        path: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a file (stdin when no file is given)
    Put {
        /// Destination pool path
        path: String,

        /// Local file to upload
        file: Option<PathBuf>,
    },

    /// Create a container, or a directory marker inside one
    Mkdir {
        /// Pool path
        path: String,
    },

    /// Recursively remove a path; a bare container is deleted as well
    Rm {
        /// Pool path
        path: String,
    },

    /// Copy an object
    Cp {
        /// Source pool path
        src: String,
        /// Destination pool path
        dest: String,
    },

    /// Move an object (copy, then remove the source)
    Mv {
        /// Source pool path
        src: String,
        /// Destination pool path
        dest: String,
    },

    /// Stream a file from one pool into another
    Siphon {
        /// Source pool path
        src: String,
        /// Destination pool path
        dest: String,

        /// Configuration file for the destination pool (defaults to the source's)
        #[arg(long)]
        dest_config: Option<PathBuf>,
    },

    /// Show the resolved pool configuration, or save it
    Config {
        /// Write the configuration as TOML (to FILE, or the per-user config file)
        #[arg(long, value_name = "FILE", num_args = 0..=1)]
        save: Option<Option<PathBuf>>,

        /// Show the per-user configuration file path
        #[arg(long, conflicts_with = "save")]
        path: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match run() {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("Error: {:#}", e);
            process::exit(map_error_to_exit_code(&e));
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = cli.config.resolve()?;
    let pool = ObjectPool::s3(config).context("Failed to create pool")?;

    match cli.command {
        Commands::Info => {
            println!("{}", pool.info());
        }

        Commands::Ls { path, json } => {
            let entries = pool
                .ls(&path)
                .with_context(|| format!("Failed to list {}", path))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                for entry in &entries {
                    writeln!(out, "{}", format_entry(entry))?;
                }
            }
        }

        Commands::Get { path, output } => {
            let mut reader = pool
                .get(&path)
                .with_context(|| format!("Failed to open {}", path))?;
            let copied = match output {
                Some(file) => {
                    let mut out = File::create(&file)
                        .with_context(|| format!("Failed to create {}", file.display()))?;
                    download(&mut reader, &mut out)
                }
                None => download(&mut reader, &mut io::stdout().lock()),
            };
            let bytes = copied.with_context(|| format!("Failed to download {}", path))?;
            info!("Downloaded {} bytes from {}", bytes, path);
        }

        Commands::Put { path, file } => {
            let result = match file {
                Some(file) => {
                    let mut src = File::open(&file)
                        .with_context(|| format!("Failed to open {}", file.display()))?;
                    pool.put(&path, &mut src)
                }
                None => pool.put(&path, &mut io::stdin().lock()),
            };
            result.with_context(|| format!("Failed to upload to {}", path))?;
        }

        Commands::Mkdir { path } => {
            pool.mkdir(&path)
                .with_context(|| format!("Failed to create {}", path))?;
        }

        Commands::Rm { path } => {
            pool.rm(&path)
                .with_context(|| format!("Failed to remove {}", path))?;
        }

        Commands::Cp { src, dest } => {
            pool.cp(&src, &dest)
                .with_context(|| format!("Failed to copy {} to {}", src, dest))?;
        }

        Commands::Mv { src, dest } => {
            pool.mv(&src, &dest)
                .with_context(|| format!("Failed to move {} to {}", src, dest))?;
        }

        Commands::Siphon {
            src,
            dest,
            dest_config,
        } => {
            let dest_pool = match dest_config {
                Some(file) => ObjectPool::s3(settings::load_file(&file)?)
                    .context("Failed to create destination pool")?,
                None => ObjectPool::s3(pool.config().clone())
                    .context("Failed to create destination pool")?,
            };
            siphon_file(&pool, &src, &dest_pool, &dest)
                .with_context(|| format!("Failed to siphon {} to {}", src, dest))?;
            info!("Siphoned {} to {}", src, dest);
        }

        Commands::Config { save, path } => {
            configure(pool.config(), save, path)?;
        }
    }

    Ok(())
}

/// Copy an object body out; a failed stream keeps its backend classification
fn download(reader: &mut dyn Read, out: &mut dyn Write) -> siphon_core::Result<u64> {
    io::copy(reader, out).map_err(|e| siphon_core::Error::from(CloudError::from_io(e)))
}

fn configure(config: &PoolConfig, save: Option<Option<PathBuf>>, path: bool) -> Result<()> {
    if path {
        let file = PoolConfig::default_path().context("No configuration directory available")?;
        println!("{}", file.display());
        return Ok(());
    }

    match save {
        Some(target) => {
            let file = match target {
                Some(file) => file,
                None => PoolConfig::default_path()
                    .context("No configuration directory available")?,
            };
            config
                .save(&file)
                .with_context(|| format!("Failed to save {}", file.display()))?;
            info!("Saved configuration to {}", file.display());
        }
        None => println!("{:#?}", config),
    }
    Ok(())
}

/// One `ls` line: kind, size, modification time, name
fn format_entry(entry: &FileEntry) -> String {
    let kind = if entry.is_dir() { 'd' } else { '-' };
    let time = if entry.modified_at_micros == 0 {
        "-".to_string()
    } else {
        entry.mod_time().format("%Y-%m-%d %H:%M").to_string()
    };
    format!("{} {:>12} {:>16} {}", kind, entry.size(), time, entry.name())
}

fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(siphon_err) = err.downcast_ref::<siphon_core::Error>() {
        match siphon_err {
            siphon_core::Error::Io(_) => 2,
            siphon_core::Error::InvalidPath(_) => 3,
            siphon_core::Error::Backend(_) => 4,
            siphon_core::Error::Config(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry() {
        let file = FileEntry::file("a.txt", 1_700_000_000_000_000, 5);
        let line = format_entry(&file);
        assert!(line.starts_with("- "));
        assert!(line.contains("2023-11-14"));
        assert!(line.ends_with(" a.txt"));

        let dir = FileEntry::directory("photos", 0);
        let line = format_entry(&dir);
        assert!(line.starts_with("d "));
        assert!(line.contains(" - "));
    }

    #[test]
    fn test_exit_codes() {
        let invalid = anyhow::Error::new(siphon_core::Error::InvalidPath("/".into()))
            .context("Failed to upload");
        assert_eq!(map_error_to_exit_code(&invalid), 3);

        let io = anyhow::Error::new(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(map_error_to_exit_code(&io), 2);

        assert_eq!(map_error_to_exit_code(&anyhow::anyhow!("other")), 1);
    }

    struct ResetStream;

    impl Read for ResetStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(CloudError::Runtime("connection reset".to_string()).into())
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_download_stream_failure_is_backend_error() {
        let err = download(&mut ResetStream, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, siphon_core::Error::Backend(_)));

        let err = anyhow::Error::new(err).context("Failed to download /b/a");
        assert_eq!(map_error_to_exit_code(&err), 4);
    }

    #[test]
    fn test_download_local_write_failure_is_io_error() {
        let err = download(&mut io::Cursor::new(b"data".to_vec()), &mut FullDisk).unwrap_err();
        assert!(matches!(err, siphon_core::Error::Io(_)));
        assert_eq!(map_error_to_exit_code(&anyhow::Error::new(err)), 2);
    }
}
