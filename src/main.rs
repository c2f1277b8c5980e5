//! Parasite - inject files into a host binary and get them back out.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use parasite::{HostAccess, ItemDescriptor, ParasiteConfig, ParasiteHost, Verification};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parasite")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Insert or extract files in the binary stream of a host file",
    long_about = "Appends files to the end of a host binary behind a self-locating table. \
                  The original host can be restored byte for byte."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new parasite host from a clean file
    Create {
        /// Host file to infect
        host: PathBuf,

        /// Files to inject
        #[arg(required = true)]
        items: Vec<PathBuf>,

        /// Compress injected files
        #[arg(short = 'z', long)]
        compress: bool,
    },

    /// Add a file to an existing parasite host
    Add {
        /// Infected host file
        host: PathBuf,

        /// File to inject
        item: PathBuf,

        /// Compress the injected file
        #[arg(short = 'z', long)]
        compress: bool,
    },

    /// List infected files in a host
    List {
        /// Infected host file
        host: PathBuf,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract one item from a host
    Extract {
        /// Infected host file
        host: PathBuf,

        /// Item name
        name: String,

        /// Directory to extract into (default: current directory)
        dest: Option<PathBuf>,
    },

    /// Extract all items from a host
    ExtractAll {
        /// Infected host file
        host: PathBuf,

        /// Directory to extract into (default: current directory)
        dest: Option<PathBuf>,
    },

    /// Restore the original host file
    Restore {
        /// Infected host file
        host: PathBuf,

        /// Where to write the original host
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct ItemSummary<'a> {
    name: &'a str,
    flags: u8,
    compressed: bool,
    stored_size: u32,
    logical_size: u32,
    offset: u32,
    digest: String,
}

#[derive(Serialize)]
struct TableSummary<'a> {
    version: String,
    item_count: u16,
    base_offset: u32,
    header_offset: u32,
    items: Vec<ItemSummary<'a>>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let verbose = cli.verbose;

    match cli.command {
        Commands::Create {
            host,
            items,
            compress,
        } => cmd_create(&host, &items, ParasiteConfig::new(compress, verbose)),

        Commands::Add {
            host,
            item,
            compress,
        } => cmd_add(&host, &item, ParasiteConfig::new(compress, verbose)),

        Commands::List { host, json } => {
            cmd_list(&host, json, ParasiteConfig::new(false, verbose))
        }

        Commands::Extract { host, name, dest } => {
            cmd_extract(&host, &name, dest.as_deref(), ParasiteConfig::new(false, verbose))
        }

        Commands::ExtractAll { host, dest } => {
            cmd_extract_all(&host, dest.as_deref(), ParasiteConfig::new(false, verbose))
        }

        Commands::Restore { host, output } => {
            cmd_restore(&host, &output, ParasiteConfig::new(false, verbose))
        }
    }
}

/// Open a host and load its header and table.
fn open_loaded(
    host: &Path,
    access: HostAccess,
    config: ParasiteConfig,
) -> anyhow::Result<ParasiteHost> {
    let mut parasite = ParasiteHost::open(host, access, config)
        .with_context(|| format!("Could not load host file {}", host.display()))?;

    if !parasite.has_parasite()? {
        bail!(
            "{} does not have a parasite header, or its header is corrupt",
            host.display()
        );
    }

    parasite.read_header()?;
    parasite.read_file_table()?;
    Ok(parasite)
}

fn cmd_create(host: &Path, items: &[PathBuf], config: ParasiteConfig) -> anyhow::Result<()> {
    let flags = config.item_flags();

    let mut descriptors = Vec::with_capacity(items.len());
    for path in items {
        let item = ItemDescriptor::from_file(path, flags)
            .with_context(|| format!("Could not read input file {}", path.display()))?;
        descriptors.push(item);
    }

    let mut parasite = ParasiteHost::open(host, HostAccess::ReadWrite, config)
        .with_context(|| format!("Could not load host file {}", host.display()))?;
    parasite.infect(descriptors)?;

    let count = parasite.items().len();
    parasite.close()?;

    println!("Injected {} file(s) into {}", count, host.display());
    Ok(())
}

fn cmd_add(host: &Path, item: &Path, config: ParasiteConfig) -> anyhow::Result<()> {
    let descriptor = ItemDescriptor::from_file(item, config.item_flags())
        .with_context(|| format!("Could not read input file {}", item.display()))?;

    let mut parasite = open_loaded(host, HostAccess::ReadWrite, config)?;
    parasite.infect_more(descriptor)?;

    let count = parasite.items().len();
    parasite.close()?;

    println!(
        "Added {} to {} ({} items)",
        item.display(),
        host.display(),
        count
    );
    Ok(())
}

fn cmd_list(host: &Path, json: bool, config: ParasiteConfig) -> anyhow::Result<()> {
    let parasite = open_loaded(host, HostAccess::Read, config)?;
    let header = parasite.header();

    let summary = TableSummary {
        version: header.version.to_string(),
        item_count: header.item_count,
        base_offset: header.base_offset,
        header_offset: header.header_offset,
        items: parasite
            .items()
            .iter()
            .map(|item| ItemSummary {
                name: &item.name,
                flags: item.flags.bits(),
                compressed: item.is_compressed(),
                stored_size: item.stored_size,
                logical_size: item.logical_size,
                offset: item.offset,
                digest: hex::encode(item.digest),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Parasite version: {}", summary.version);
    println!("File count:       {}", summary.item_count);
    println!("Base offset:      {}", summary.base_offset);

    for item in &summary.items {
        println!();
        println!("{}", item.name);
        println!("  flags:         {}", item.flags);
        println!("  size:          {}", item.stored_size);
        println!("  offset:        {}", item.offset);
        println!("  lz size:       {}", item.logical_size);
        println!("  digest:        {}", item.digest);
    }

    Ok(())
}

fn cmd_extract(
    host: &Path,
    name: &str,
    dest: Option<&Path>,
    config: ParasiteConfig,
) -> anyhow::Result<()> {
    let mut parasite = open_loaded(host, HostAccess::Read, config)?;

    let extraction = parasite
        .extract_item(name, dest)
        .with_context(|| format!("Could not extract {} from {}", name, host.display()))?;
    report(&extraction.path, extraction.size, &extraction.verification);

    Ok(())
}

fn cmd_extract_all(
    host: &Path,
    dest: Option<&Path>,
    config: ParasiteConfig,
) -> anyhow::Result<()> {
    let mut parasite = open_loaded(host, HostAccess::Read, config)?;

    let extracted = parasite
        .extract_all(dest)
        .with_context(|| format!("Could not extract items from {}", host.display()))?;
    for extraction in &extracted {
        report(&extraction.path, extraction.size, &extraction.verification);
    }

    Ok(())
}

fn cmd_restore(host: &Path, output: &Path, config: ParasiteConfig) -> anyhow::Result<()> {
    let mut parasite = ParasiteHost::open(host, HostAccess::Read, config)
        .with_context(|| format!("Could not load host file {}", host.display()))?;
    parasite.read_header()?;

    let written = parasite
        .restore(output)
        .with_context(|| format!("Could not restore to {}", output.display()))?;

    println!("Restored {} bytes to {}", written, output.display());
    Ok(())
}

fn report(path: &Path, size: u64, verification: &Verification) {
    match verification {
        Verification::Verified => println!("Extracted {} ({} bytes)", path.display(), size),
        Verification::Mismatch { .. } => {
            eprintln!(
                "warning: {} ({} bytes) failed its digest check and may be corrupt",
                path.display(),
                size
            );
        }
    }
}
