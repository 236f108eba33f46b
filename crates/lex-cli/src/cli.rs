use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lex_diff::DiffMode;

#[derive(Parser)]
#[command(
    name = "lex",
    about = "Statute Lens: assemble, diff and merge statutory content trees",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    Character,
    Word,
    Myers,
}

impl From<ModeArg> for DiffMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Character => DiffMode::Character,
            ModeArg::Word => DiffMode::Word,
            ModeArg::Myers => DiffMode::Myers,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Assemble flat records into a tree
    Tree(TreeArgs),
    /// Show the ancestor chain of one node
    Chain(ChainArgs),
    /// Diff two strings
    Diff(DiffArgs),
    /// Build, render and merge the partial trees of a batch of amendments
    Merge(MergeArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// JSON array of content records
    pub records: PathBuf,
    /// Link by ident path instead of parent id
    #[arg(long)]
    pub ident: bool,
}

#[derive(Args)]
pub struct ChainArgs {
    /// JSON array of content records
    pub records: PathBuf,
    /// Content id of the target node
    pub target: u64,
    #[arg(long, default_value_t = lex_tree::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

#[derive(Args)]
pub struct DiffArgs {
    pub base: String,
    pub candidate: String,
    #[arg(long, value_enum, default_value = "character")]
    pub mode: ModeArg,
    /// Unchanged words allowed inside one window (word mode)
    #[arg(long, default_value_t = lex_diff::word_diff::DEFAULT_MERGE_GAP)]
    pub merge_gap: usize,
}

#[derive(Args)]
pub struct MergeArgs {
    /// JSON array of content records
    pub records: PathBuf,
    /// JSON array of diff records
    pub diffs: PathBuf,
    /// Pipeline configuration (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured diff mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}
