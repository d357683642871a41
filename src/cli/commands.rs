use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tb", about = concat!("treeboard v", env!("CARGO_PKG_VERSION"), " - nested task boards"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Board data file
    #[arg(long, global = true, default_value = "treeboard.json")]
    pub data: String,

    /// Project to operate on (default: the active project)
    #[arg(short = 'p', long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty board data file
    Init(InitArgs),
    /// Project management
    Project(ProjectCmd),
    /// Show the board of a project
    Board,
    /// Add a task to a column (bottom)
    Add(AddArgs),
    /// Add a subtask
    Sub(SubArgs),
    /// Change task content, completion or priority
    Edit(EditArgs),
    /// Delete a task and its subtasks
    Rm(IdArg),
    /// Deep-copy a task next to the original
    Clone(IdArg),
    /// Move a task to the bottom of a column
    Mv(MvArgs),
    /// Drag a task onto a column or another task
    Drop(DropArgs),
    /// Show completion of every parent task
    Progress,
    /// Search task content by regex
    Search(SearchArgs),
    /// Write the whole document as TOML
    Export(ExportArgs),
    /// Replace the whole document from TOML
    Import(ImportArgs),
    /// Edit treeboard.toml
    Config(ConfigCmd),
    /// Set the UI theme
    Theme(ThemeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Also create a first project with this name
    #[arg(long)]
    pub name: Option<String>,
    /// Overwrite an existing data file
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: Option<ProjectAction>,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// List projects (default)
    List(ProjectListArgs),
    /// Create a project
    Add(ProjectAddArgs),
    /// Delete a project
    Rm(IdArg),
    /// Make a project the active one
    Use(IdArg),
    /// Change name, description or status
    Edit(ProjectEditArgs),
    /// Set the in-progress WIP limit
    Wip(WipArgs),
}

#[derive(Args)]
pub struct ProjectListArgs {
    /// Group by portfolio status
    #[arg(long)]
    pub by_status: bool,
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Project name
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// WIP limit (default from treeboard.toml)
    #[arg(long)]
    pub wip: Option<usize>,
}

#[derive(Args)]
pub struct ProjectEditArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// planning, active or completed
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct WipArgs {
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub content: String,
    /// Column (backlog, todo, in-progress, done)
    #[arg(long, short, default_value = "backlog")]
    pub column: String,
    /// high, medium or low
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args)]
pub struct SubArgs {
    /// Parent task ID
    pub parent: String,
    /// Subtask text
    pub content: String,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: String,
    /// New text
    #[arg(long)]
    pub content: Option<String>,
    /// Mark completed
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,
    /// Mark not completed
    #[arg(long)]
    pub undone: bool,
    /// high, medium, low or none
    #[arg(long)]
    pub priority: Option<String>,
    /// Flip the expanded flag
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Args)]
pub struct MvArgs {
    pub id: String,
    /// Destination column
    pub column: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ZoneArg {
    Top,
    Middle,
    Bottom,
}

#[derive(Args)]
pub struct DropArgs {
    /// Task being dragged
    pub id: String,
    /// Column name or task ID to drop onto
    #[arg(long)]
    pub onto: String,
    /// Where on the target: a column's top/bottom area or a card's top/middle/bottom
    #[arg(long, value_enum)]
    pub zone: Option<ZoneArg>,
    /// Pointer position down a target card, 0.0 (top edge) to 1.0 (bottom edge)
    #[arg(long, conflicts_with = "zone")]
    pub offset: Option<f64>,
    /// Hold the duplicate/group modifier
    #[arg(long)]
    pub duplicate: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern
    pub pattern: String,
    /// Limit to one column
    #[arg(long)]
    pub column: Option<String>,
}

// ---------------------------------------------------------------------------
// Interchange, config, theme
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// TOML file to import
    pub file: String,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a key, e.g. `board.default_wip_limit 5`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// light or dark
    pub theme: String,
}
