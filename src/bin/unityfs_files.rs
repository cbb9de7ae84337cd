use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::Pattern;
use unityfs_tools::{
    bundle_fs::from_file,
    commands::{cat::cat_node, dump_info::dump_info, extract::extract_nodes, list::list_nodes},
    VERBOSE,
};

#[derive(Debug, Subcommand)]
enum Command {
    /// List node paths
    List {
        /// Glob pattern to filter the list of nodes
        #[clap(default_value = "*")]
        glob: Pattern,
    },
    /// Extract matched nodes to a folder
    Extract {
        /// Path to the folder to output the extracted nodes
        output_folder: PathBuf,
        /// Glob pattern to filter the list of nodes
        #[clap(default_value = "*")]
        glob: Pattern,
    },
    /// Extract a single node to stdout
    Cat {
        /// Path of the node to extract
        path: String,
    },
    /// Dump the parsed header and tables as JSON
    DumpInfo,
}

/// A simple CLI tool that lists and extracts the named entries of a UnityFS
/// bundle file.
#[derive(Parser, Debug)]
#[command(name = "unityfs_files")]
#[clap(version)]
struct Cli {
    /// Path to the bundle file
    bundle: PathBuf,

    /// Report per-node progress
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    VERBOSE.set(cli.verbose).unwrap();

    let fs = from_file(&cli.bundle).context("Failed to open bundle")?;

    match cli.command {
        Command::List { glob } => list_nodes(&fs, &[glob]).context("List command failed")?,
        Command::Extract {
            output_folder,
            glob,
        } => extract_nodes(&fs, &[glob], &output_folder).context("Extract command failed")?,
        Command::Cat { path } => cat_node(&fs, &path).context("Cat command failed")?,
        Command::DumpInfo => dump_info(&fs).context("Dump Info command failed")?,
    }

    Ok(())
}
