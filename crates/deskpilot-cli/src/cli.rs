use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deskpilot")]
#[command(about = "Desktop automation plans and goal-directed UI navigation")]
#[command(
    long_about = "deskpilot runs JSON automation plans step by step against the Windows UI \
Automation tree, and can drive a window toward a goal by asking an LLM which control to use next."
)]
#[command(version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// JSON config file; environment variables override its values
    #[arg(long, short, global = true, env = "DESKPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write daily-rotated logs to this directory
    #[arg(long, global = true, env = "DESKPILOT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and execute a plan file
    Run(RunArgs),
    /// Print the controls of a window
    Introspect(IntrospectArgs),
    /// Reach a goal in a window, one oracle-chosen action at a time
    Navigate(NavigateArgs),
    /// List the built-in actions
    Actions,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Plan file: a JSON array of steps or an object with a "steps" array
    pub plan: PathBuf,

    /// Validate and print the plan without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Audit log path (defaults to the local data directory)
    #[arg(long)]
    pub audit_log: Option<PathBuf>,

    /// Do not write an audit log
    #[arg(long, conflicts_with = "audit_log")]
    pub no_audit: bool,
}

#[derive(Args, Debug)]
pub struct IntrospectArgs {
    /// Window title fragment; repeat for alternatives
    #[arg(long = "window", short, required = true)]
    pub windows: Vec<String>,

    /// Program or URI to open first (e.g. "ms-settings:bluetooth")
    #[arg(long)]
    pub open: Option<String>,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// What the navigation should achieve
    #[arg(long, short)]
    pub goal: String,

    /// Window title fragment; repeat for alternatives
    #[arg(long = "window", short, required = true)]
    pub windows: Vec<String>,

    /// Program or URI to open before the first step
    #[arg(long)]
    pub open: Option<String>,

    /// Attempts per step (defaults to the configured value)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Maximum number of actions (defaults to the configured value)
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Take a single action and stop
    #[arg(long)]
    pub single_step: bool,
}
