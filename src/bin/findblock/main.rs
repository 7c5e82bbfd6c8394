// main.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Base for the findblock CLI, which finds the NAND blocks that hold a given file.

use std::path::Path;
use std::process::ExitCode;
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use rustwii_nand::nand::query::BlockQuery;
use rustwii_nand::nand::session::Session;
use rustwii_nand::nand::walker::NandPath;
use rustwii_nand::nand::NANDError;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to the NAND dump to search
    input: String,
    /// The absolute path of the file inside the NAND, like /sys/uid.sys
    path: String,
    /// Log extra details about the search
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn find(cli: &Cli) -> Result<()> {
    let in_path = Path::new(&cli.input);
    if !in_path.exists() {
        bail!("Source NAND dump \"{}\" could not be found.", in_path.display());
    }
    let session = match Session::open(in_path) {
        Ok(session) => session,
        Err(NANDError::SuperblockNotFound) => {
            println!("Can't find superblock!");
            return Ok(());
        },
        Err(e) => return Err(e).with_context(|| format!("NAND dump \"{}\" could not be read.", in_path.display())),
    };
    println!("Superblock is at block: {}", session.superblock().block());
    let target = NandPath::parse(&cli.path);
    match BlockQuery::find(&session, target.clone()).with_context(|| "The NAND's FST could not be read.")? {
        Some(blocks) => {
            println!("File found! Blocks:");
            let blocks: Vec<String> = blocks.iter().map(|block| block.to_string()).collect();
            println!("{}", blocks.join(" "));
        },
        None => println!("File \"{}\" could not be found in the NAND.", target),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match find(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(255)
        }
    }
}
