use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use waymark::config::Config;
use waymark::orchestrator::Orchestrator;

mod cmd;

#[derive(Parser)]
#[command(name = "waymark")]
#[command(
    version,
    about = "Checkpoint log and project brain: sequence work sessions, derive status and commits"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data root holding one directory per project (default: ./brains)
    #[arg(long, global = true, env = "WAYMARK_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data root and a default waymark.toml
    Init,
    /// Create a project from a design file or from flags
    Create {
        name: String,

        /// File containing a ```json brain block and a ```yaml checkpoint block
        #[arg(
            long,
            conflicts_with_all = ["objective", "work", "decision", "next_step", "next_goal"]
        )]
        design_file: Option<PathBuf>,

        /// Project objective (repeatable; the first is the primary goal)
        #[arg(long)]
        objective: Vec<String>,

        /// Work recorded in checkpoint #1 (repeatable)
        #[arg(long)]
        work: Vec<String>,

        /// Decision recorded in checkpoint #1 (repeatable)
        #[arg(long)]
        decision: Vec<String>,

        /// Next step recorded in checkpoint #1 (repeatable, at least one)
        #[arg(long)]
        next_step: Vec<String>,

        /// Goal for the next session
        #[arg(long)]
        next_goal: Option<String>,
    },
    /// List managed projects
    Projects,
    /// Show primary goal, next task and pending steps
    Status {
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record and finalize a new checkpoint
    Checkpoint {
        name: String,

        /// Work completed this session (repeatable)
        #[arg(long)]
        work: Vec<String>,

        /// Key decision with rationale (repeatable)
        #[arg(long)]
        decision: Vec<String>,

        /// Next step; the first one is the immediate next task (repeatable)
        #[arg(long)]
        next_step: Vec<String>,

        /// Overall goal for the next session
        #[arg(long)]
        next_goal: Option<String>,

        /// Prompt for entries interactively
        #[arg(short, long)]
        interactive: bool,
    },
    /// Show the most recent checkpoints
    History {
        name: String,

        /// Number of checkpoints to show (default: [status] history_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the commit message for a checkpoint
    Message {
        name: String,

        /// Checkpoint number (default: latest)
        #[arg(short, long)]
        sequence: Option<u64>,
    },
    /// Commit the brain and a checkpoint with git, optionally pushing
    Commit {
        name: String,

        /// Checkpoint number (default: latest)
        #[arg(short, long)]
        sequence: Option<u64>,

        /// Push after committing (default: [commit] push)
        #[arg(long)]
        push: bool,

        /// Remote to push to (default: [commit] remote)
        #[arg(long)]
        remote: Option<String>,

        /// Branch to push (default: [commit] branch, else the current branch)
        #[arg(long)]
        branch: Option<String>,
    },
    /// View or edit a project brain
    Brain {
        #[command(subcommand)]
        command: BrainCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum BrainCommands {
    /// Print the brain as JSON
    Show { name: String },
    /// Append an objective
    AddObjective { name: String, objective: String },
    /// Set an architectural constant (value parsed as JSON, else kept as text)
    SetConstant {
        name: String,
        key: String,
        value: String,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default waymark.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "waymark=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = Config::resolve_root(cli.root.clone(), &cwd);

    match &cli.command {
        Commands::Init => cmd::cmd_init(&root)?,
        Commands::Config { command } => cmd::cmd_config(&root, command.clone())?,
        command => {
            let config = Config::new(root, cli.verbose)?;
            let orchestrator = Orchestrator::new(config);
            run(&orchestrator, command)?;
        }
    }

    Ok(())
}

fn run(orchestrator: &Orchestrator, command: &Commands) -> Result<()> {
    match command {
        Commands::Create {
            name,
            design_file,
            objective,
            work,
            decision,
            next_step,
            next_goal,
        } => {
            let seed = cmd::SeedArgs {
                objectives: objective.clone(),
                work: work.clone(),
                decisions: decision.clone(),
                next_steps: next_step.clone(),
                next_goal: next_goal.clone(),
            };
            cmd::cmd_create(orchestrator, name, design_file.as_deref(), seed)
        }
        Commands::Projects => cmd::cmd_projects(orchestrator),
        Commands::Status { name, json } => cmd::cmd_status(orchestrator, name, *json),
        Commands::Checkpoint {
            name,
            work,
            decision,
            next_step,
            next_goal,
            interactive,
        } => {
            let entries = cmd::CheckpointArgs {
                work: work.clone(),
                decisions: decision.clone(),
                next_steps: next_step.clone(),
                next_goal: next_goal.clone(),
            };
            cmd::cmd_checkpoint(orchestrator, name, entries, *interactive)
        }
        Commands::History { name, limit } => cmd::cmd_history(orchestrator, name, *limit),
        Commands::Message { name, sequence } => cmd::cmd_message(orchestrator, name, *sequence),
        Commands::Commit {
            name,
            sequence,
            push,
            remote,
            branch,
        } => cmd::cmd_commit(
            orchestrator,
            name,
            *sequence,
            *push,
            remote.as_deref(),
            branch.as_deref(),
        ),
        Commands::Brain { command } => cmd::cmd_brain(orchestrator, command.clone()),
        Commands::Init | Commands::Config { .. } => Ok(()),
    }
}
