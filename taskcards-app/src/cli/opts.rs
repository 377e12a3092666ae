use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskcards_core::Priority;
use taskcards_json::DEFAULT_MAX_BACKUPS;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "taskcards", version, about = "Task Cards CLI and shell")]
pub struct Cli {
    /// Directory holding taskcards.json and its backups (defaults to app data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Number of timestamped backups to keep
    #[arg(long, default_value_t = DEFAULT_MAX_BACKUPS)]
    pub max_backups: usize,

    #[command(subcommand)]
    pub cmd: Command,
}

/// One line typed into the interactive shell.
#[derive(Debug, Parser, Clone)]
#[command(name = "taskcards", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Card operations on the active list
    #[command(subcommand)]
    Card(CardCmd),
    /// Named collections
    #[command(subcommand)]
    Collection(CollectionCmd),
    /// Show or set the stored UI theme
    Theme { name: Option<String> },
    /// Interactive session; the active collection stays bound between commands
    Shell,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    Edit(CardEdit),
    Rm { card: String },
    Show { card: String },
    List(CardList),
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "")]
    pub topic: String,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long, default_value = "")]
    pub details: String,
    #[arg(long, value_enum, default_value_t = PriorityArg::Low)]
    pub priority: PriorityArg,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    /// Card id or a unique prefix of one
    pub card: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub topic: Option<String>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long, conflicts_with = "label")]
    pub clear_label: bool,
    #[arg(long)]
    pub details: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,
    #[arg(long = "rm-tag")]
    pub rm_tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CardList {
    /// Case-insensitive match on topic or description
    #[arg(long, short = 'q', default_value = "")]
    pub query: String,
    #[arg(long)]
    pub tag: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CollectionCmd {
    /// Save the active cards under a name (does not switch the active collection)
    SaveAs { name: String },
    /// Start an empty collection and make it active
    New { name: String },
    /// Replace the active cards with a collection's cards and make it active
    Load { collection: String },
    /// Save into the active collection
    QuickSave {
        /// Name to save under when no collection is active (prompts otherwise)
        #[arg(long)]
        name: Option<String>,
    },
    List {
        /// Most recently updated first
        #[arg(long)]
        recent: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show the active collection
    Status,
}
