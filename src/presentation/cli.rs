// Command-line interface definition
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "panelscope")]
#[command(version, about = "Fetch, inspect and manage metric dashboard panels")]
pub struct Cli {
    /// Configuration file (defaults to config/panelscope.toml when present)
    #[arg(long, env = "PANELSCOPE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a panel once and print its legend
    Render(RenderArgs),

    /// Print the tooltip for a data index
    Tooltip(TooltipArgs),

    /// Refetch a panel periodically and print each state
    Watch(WatchArgs),

    /// Fetch a panel and write its data as CSV
    ExportCsv(ExportArgs),

    /// Write a panel's configuration to a file
    ExportPanel(ExportArgs),

    /// Replace a panel's title and queries from a panel file
    ImportPanel(ImportPanelArgs),

    /// Replace the whole dashboard from a file
    ImportDashboard(FileArgs),

    /// Edit the display settings of one series
    Series(SeriesArgs),

    /// Check a dashboard or panel file without importing it
    Validate(ValidateArgs),

    /// Fetch a JSON list of queries that is not stored in any panel
    Query(QueryArgs),

    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    #[arg(long)]
    pub panel: String,

    /// Save newly discovered series names to the dashboard
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub view: ViewArgs,

    /// Show only the series at this legend position
    #[arg(long, value_name = "INDEX")]
    pub isolate: Option<usize>,

    /// Scroll the legend sideways by a wheel delta
    #[arg(long, value_name = "DELTA", allow_hyphen_values = true)]
    pub legend_scroll: Option<f64>,
}

/// Series visibility shared by commands that draw a chart.
#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Legend positions of series to hide
    #[arg(long = "hide-series", value_name = "INDEX")]
    pub hidden_series: Vec<usize>,
}

#[derive(Args, Debug, Default)]
pub struct TooltipArgs {
    #[arg(long)]
    pub panel: String,

    /// Data index under the cursor
    #[arg(long)]
    pub index: usize,

    /// Query ids to leave out
    #[arg(long = "hide", value_name = "QUERY_ID")]
    pub hidden: Vec<String>,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[arg(long)]
    pub panel: String,

    /// Seconds between refreshes
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Stop after this many completed cycles
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(long)]
    pub panel: String,

    /// Output file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportPanelArgs {
    #[arg(long)]
    pub panel: String,

    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct SeriesArgs {
    #[arg(long)]
    pub panel: String,

    #[arg(long)]
    pub query: String,

    /// Series name as discovered
    #[arg(long)]
    pub name: String,

    /// Display name; an empty value clears it
    #[arg(long)]
    pub rename: Option<String>,

    #[arg(long)]
    pub units: Option<String>,

    /// Decimal places, 0 to 3
    #[arg(long)]
    pub resolution: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    pub file: PathBuf,

    /// Treat the file as a single exported panel
    #[arg(long)]
    pub panel_file: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// JSON array of query strings, panel-editor queries or stored queries
    pub file: PathBuf,
}
