use std::path::PathBuf;

use clap::Parser;

/// refscope - list the assemblies a .NET project references, transitively, and their
/// strong name status
#[derive(Debug, Parser)]
#[command(name = "refscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(flatten)]
    pub walk: WalkOptions,
}

/// Options controlling output and logging.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options controlling which references are collected.
#[derive(Debug, Parser)]
pub struct WalkOptions {
    /// Path to the MSBuild project file (.csproj, .vbproj, ...).
    #[arg(short, long, value_name = "FILE")]
    pub project: PathBuf,

    /// Directory to probe for <Name>.dll / <Name>.exe. Defaults to the project directory.
    #[arg(long, value_name = "DIR")]
    pub probe: Vec<PathBuf>,

    /// Additional registry root, laid out like the global assembly cache.
    #[arg(long, value_name = "DIR")]
    pub registry: Vec<PathBuf>,

    /// Do not follow references declared by bare name (registry resident assemblies).
    #[arg(long)]
    pub skip_registry: bool,

    /// Only list assemblies without a strong name.
    #[arg(long)]
    pub unsigned_only: bool,
}
