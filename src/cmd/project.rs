//! Root initialization, project creation and listing commands.

use anyhow::{Context, Result};
use std::path::Path;

use waymark::brain::ProjectBrain;
use waymark::checkpoint::CheckpointSeed;
use waymark::orchestrator::Orchestrator;
use waymark::ui::icons::{CHECK, FOLDER, GOAL, NEXT, SPARKLE};

/// Flag-based project content, used when no design file is given.
pub struct SeedArgs {
    pub objectives: Vec<String>,
    pub work: Vec<String>,
    pub decisions: Vec<String>,
    pub next_steps: Vec<String>,
    pub next_goal: Option<String>,
}

pub fn cmd_init(root: &Path) -> Result<()> {
    use waymark::init::init_root;

    let result = init_root(root)?;

    if result.created {
        println!("{}Initialized waymark root at {}", SPARKLE, result.root.display());
        println!();
        println!("Created:");
        println!("  {}/", result.root.display());
        println!("  └── waymark.toml   # settings (use `waymark config show`)");
        println!();
        println!("Next steps:");
        println!("  1. Run `waymark create <name> --design-file <file>` to add a project");
        println!("  2. Run `waymark status <name>` to see the next task");
    } else if result.wrote_config {
        println!(
            "Completed waymark initialization at {} (wrote waymark.toml)",
            result.root.display()
        );
    } else {
        println!(
            "Waymark root already initialized at {}",
            result.root.display()
        );
    }

    Ok(())
}

pub fn cmd_create(
    orchestrator: &Orchestrator,
    name: &str,
    design_file: Option<&Path>,
    args: SeedArgs,
) -> Result<()> {
    let (brain, seed) = match design_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read design file: {}", path.display()))?;
            let design = waymark::design::parse_design(&text)?;
            (design.brain, design.seed)
        }
        None => {
            if args.next_steps.is_empty() {
                anyhow::bail!(
                    "Provide --design-file, or at least one --next-step (and usually --objective)"
                );
            }
            let mut seed = CheckpointSeed::new(args.work, args.decisions, args.next_steps);
            seed.next_goal = args.next_goal;
            (ProjectBrain::new(name, args.objectives), seed)
        }
    };

    let first = orchestrator.create_project(name, &brain, &seed)?;

    println!(
        "{}Created project '{}' at {}",
        CHECK,
        name,
        orchestrator.config().project_dir(name).display()
    );
    if let Some(goal) = brain.primary_goal() {
        println!("  {}Primary goal: {}", GOAL, goal);
    }
    if let Some(task) = first.immediate_next_task() {
        println!("  {}Next task: {}", NEXT, task);
    }
    println!();
    println!(
        "Run `waymark commit {}` to record checkpoint #1 in git.",
        name
    );
    Ok(())
}

pub fn cmd_projects(orchestrator: &Orchestrator) -> Result<()> {
    let projects = orchestrator.list_projects()?;

    if projects.is_empty() {
        if !waymark::init::is_initialized(&orchestrator.config().root) {
            println!(
                "No waymark root at {}. Run `waymark init` first.",
                orchestrator.config().root.display()
            );
            return Ok(());
        }
        println!(
            "No projects found under {}. Run `waymark create <name>` to add one.",
            orchestrator.config().root.display()
        );
        return Ok(());
    }

    for project in projects {
        println!("{}{}", FOLDER, project);
    }
    Ok(())
}
