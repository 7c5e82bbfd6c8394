// main.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Base for the nandextract CLI, which extracts the filesystem of a Wii or Wii U NAND dump.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use rustwii_nand::nand::extract::Extractor;
use rustwii_nand::nand::keys::KeySource;
use rustwii_nand::nand::session::Session;
use rustwii_nand::nand::NANDError;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to the NAND dump to extract
    input: String,
    /// The directory to extract the NAND to; defaults to the name of the dump without its
    /// extension
    output: Option<String>,
    /// The OTP dump to read the NAND key from
    #[arg(long, default_value = "otp.bin")]
    otp: String,
    /// The BootMii keys.bin to read the NAND key from, used for Wii NANDs without an OTP dump
    #[arg(long, default_value = "keys.bin")]
    keys: String,
    /// Log every cluster as it's extracted
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn default_output(in_path: &Path) -> PathBuf {
    let out_path = in_path.with_extension("");
    if out_path == in_path {
        // The dump has no extension to strip, so don't try to extract over it.
        let mut name = in_path.as_os_str().to_owned();
        name.push("_extracted");
        PathBuf::from(name)
    } else {
        out_path
    }
}

fn extract(cli: &Cli) -> Result<()> {
    let in_path = Path::new(&cli.input);
    if !in_path.exists() {
        bail!("Source NAND dump \"{}\" could not be found.", in_path.display());
    }
    let session = match Session::open(in_path) {
        Ok(session) => session,
        Err(NANDError::SuperblockNotFound) => {
            // Nothing can be extracted, but the dump itself was readable.
            println!("Can't find superblock!");
            return Ok(());
        },
        Err(e) => return Err(e).with_context(|| format!("NAND dump \"{}\" could not be read.", in_path.display())),
    };
    println!("Found {} NAND ({} dump), using superblock at block {}.", session.console(), session.layout().dump_type,
             session.superblock().block());
    let (session, source) = session.resolve_key(Path::new(&cli.otp), Path::new(&cli.keys))
        .with_context(|| "The NAND key could not be loaded.")?;
    match source {
        KeySource::DumpTrailer => println!("Using the NAND key stored in the BootMii dump."),
        KeySource::Otp => println!("Using the NAND key from \"{}\".", cli.otp),
        KeySource::KeysBin => println!("Using the NAND key from \"{}\".", cli.keys),
    }
    let out_path = match &cli.output {
        Some(output) => PathBuf::from(output),
        None => default_output(in_path),
    };
    if out_path.exists() && !out_path.is_dir() {
        bail!("A file already exists with the specified directory name!");
    }
    let stats = Extractor::extract_all(&session, &out_path)
        .with_context(|| format!("The NAND could not be extracted to \"{}\".", out_path.display()))?;
    println!("Successfully extracted {} files ({} bytes) and {} directories to \"{}\"!", stats.files, stats.bytes,
             stats.directories, out_path.display());
    if stats.failed > 0 {
        println!("{} files could not be extracted, see the log above for details.", stats.failed);
    }
    if stats.failed_directories > 0 {
        println!("{} directories could not be created, see the log above for details.", stats.failed_directories);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match extract(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(255)
        }
    }
}
