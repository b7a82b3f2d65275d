//! Status and history commands.

use anyhow::Result;

use waymark::orchestrator::Orchestrator;
use waymark::ui::icons::{CHECKPOINT, GOAL, NEXT, PENDING};

pub fn cmd_status(orchestrator: &Orchestrator, name: &str, json: bool) -> Result<()> {
    let status = orchestrator.status(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("{}", console::style(format!("Project: {}", status.project)).bold().cyan());
    println!();
    println!("{}Primary goal: {}", GOAL, status.primary_goal);
    match status.latest_sequence {
        Some(n) => println!("{}Latest checkpoint: #{}", CHECKPOINT, n),
        None => println!("{}Latest checkpoint: none", CHECKPOINT),
    }
    println!("{}Next task: {}", NEXT, status.immediate_next_task);
    if let Some(goal) = &status.next_goal {
        println!("   Session goal: {}", goal);
    }

    if !status.pending_steps.is_empty() {
        println!();
        println!("{}Pending steps:", PENDING);
        for step in &status.pending_steps {
            println!("  - {}", step);
        }
    }

    if status.objectives.len() > 1 {
        println!();
        println!("Other objectives:");
        for objective in &status.objectives[1..] {
            println!("  - {}", console::style(objective).dim());
        }
    }
    println!();
    Ok(())
}

pub fn cmd_history(orchestrator: &Orchestrator, name: &str, limit: Option<usize>) -> Result<()> {
    let history = orchestrator.history(name, limit)?;

    if history.is_empty() {
        println!("No checkpoints yet for '{}'.", name);
        return Ok(());
    }

    println!("{:<6} {:<20} {:<40} Next task", "#", "Created", "Summary");
    println!(
        "{:<6} {:<20} {:<40} ---------",
        "------", "--------------------", "----------------------------------------"
    );
    for entry in history {
        println!(
            "{:<6} {:<20} {:<40} {}",
            entry.sequence_number,
            entry.created_at.format("%Y-%m-%d %H:%M").to_string(),
            waymark::util::truncate_with_ellipsis(&entry.summary, 40),
            entry.next_task.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
