mod cmd;
mod logging;
mod prompt;

use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(name = "stn", version, about = "Project templates: lint, preview, render")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check the declaration file against the template tree
    Lint(LintArgs),

    /// Show what rendering would change, without touching anything
    Preview(PreviewArgs),

    /// Render a template into a new project directory
    New(NewArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct LintArgs {
    /// Template directory (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Rewrite the declaration file to match the tree
    #[arg(long)]
    pub fix: bool,

    /// Print the report as JSON
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,

    /// Print issue locations only
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Template directory (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Variable value, repeatable (name=value)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Never prompt; variables without values stay unresolved
    #[arg(long)]
    pub batch: bool,

    /// Print the preview as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Template directory to render from
    #[arg(value_name = "TEMPLATE")]
    pub template: PathBuf,

    /// Destination directory (defaults to the template's base name under
    /// the current directory)
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Variable value, repeatable (name=value)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Never prompt; fail on missing values
    #[arg(long)]
    pub batch: bool,

    /// Plan the render and print the preview instead of writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref());

    match cli.command {
        Commands::Lint(args) => cmd::lint::run(args),
        Commands::Preview(args) => cmd::preview::run(args),
        Commands::New(args) => cmd::new::run(args),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "stn", &mut std::io::stdout());
        }
    }
}
