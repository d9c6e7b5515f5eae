//! dadaseq CLI
//!
//! ```bash
//! # Describe a sequence
//! dadaseq info obs_0000.dada obs_0001.dada obs_0002.dada
//!
//! # Copy 1 MiB of logical data starting at offset 4096 to stdout
//! dadaseq cat --offset 4096 --length 1048576 obs_*.dada > chunk.raw
//!
//! # Checksum the header-stripped stream described by a config file
//! dadaseq checksum --config sequence.toml
//! ```

use std::io::{self, SeekFrom, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use dadaseq::config::Config;
use dadaseq::DadaHeader;

#[derive(Parser)]
#[command(name = "dadaseq", version, about = "Read split DADA recordings as one stream")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show files, header and logical size of a sequence
    Info(SequenceArgs),
    /// Write a range of the logical stream to stdout
    Cat {
        #[command(flatten)]
        sequence: SequenceArgs,
        /// Logical offset to start at
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Number of bytes to write; to the end of the stream when omitted
        #[arg(long)]
        length: Option<u64>,
    },
    /// CRC-32 of the logical stream
    Checksum(SequenceArgs),
}

#[derive(Args)]
struct SequenceArgs {
    /// Files in read order
    files: Vec<PathBuf>,
    /// TOML file listing the sequence
    #[arg(long, conflicts_with = "files")]
    config: Option<PathBuf>,
    /// Header size in bytes; parsed from the first file when omitted
    #[arg(long)]
    header_size: Option<u64>,
}

impl SequenceArgs {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None if self.files.is_empty() => bail!("No files given"),
            None => Config::new(self.files.clone()),
        };
        if self.header_size.is_some() {
            config.header_size = self.header_size;
        }
        Ok(config)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Info(args) => info(&args.config()?),
        Command::Cat {
            sequence,
            offset,
            length,
        } => cat(&sequence.config()?, offset, length),
        Command::Checksum(args) => checksum(&args.config()?),
    }
}

fn info(config: &Config) -> anyhow::Result<()> {
    let reader = config.open_reader().context("Failed to open sequence")?;

    println!("Files:");
    for (index, entry) in reader.files().entries().iter().enumerate() {
        println!("  [{index}] {} ({} bytes)", entry.path.display(), entry.size);
    }
    println!();
    println!("Header size:  {} bytes", reader.header_size().unwrap_or_default());
    println!("Logical size: {} bytes", reader.total_size().unwrap_or_default());

    if config.header_size.is_none() {
        let header = DadaHeader::from_path(&reader.files().entries()[0].path)?;
        println!();
        println!("Header:");
        for (key, value) in header.fields() {
            println!("  {key:<16} {value}");
        }
    }

    Ok(())
}

fn cat(config: &Config, offset: u64, length: Option<u64>) -> anyhow::Result<()> {
    let reader = config.open_reader().context("Failed to open sequence")?;
    reader
        .seekg(SeekFrom::Start(offset))
        .with_context(|| format!("Cannot seek to logical offset {offset}"))?;

    let mut remaining = length.unwrap_or(u64::MAX);
    let mut buf = vec![0u8; config.buffer_size];
    let mut stdout = io::stdout().lock();

    while remaining > 0 {
        let wanted = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = reader.read(&mut buf[..wanted])?;
        stdout.write_all(&buf[..n])?;
        remaining -= n as u64;
        if n < wanted {
            break;
        }
    }
    stdout.flush()?;

    if length.is_some() && remaining > 0 {
        bail!("Stream ended {remaining} bytes short of the requested length");
    }
    debug!("Copied logical range from offset {offset}");
    Ok(())
}

fn checksum(config: &Config) -> anyhow::Result<()> {
    let reader = config.open_reader().context("Failed to open sequence")?;

    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; config.buffer_size];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        hasher.update(&buf[..n]);
        total += n as u64;
        if n < buf.len() {
            break;
        }
    }

    println!("{:08x}  {total} bytes", hasher.finalize());
    Ok(())
}
