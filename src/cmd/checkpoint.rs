//! Checkpoint recording: `waymark checkpoint`.

use anyhow::Result;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use waymark::checkpoint::Checkpoint;
use waymark::orchestrator::Orchestrator;
use waymark::ui::icons::{CHECK, CHECKPOINT, NEXT};

/// Entries supplied on the command line.
pub struct CheckpointArgs {
    pub work: Vec<String>,
    pub decisions: Vec<String>,
    pub next_steps: Vec<String>,
    pub next_goal: Option<String>,
}

pub fn cmd_checkpoint(
    orchestrator: &Orchestrator,
    name: &str,
    args: CheckpointArgs,
    interactive: bool,
) -> Result<()> {
    let mut draft = orchestrator.open_draft(name)?;

    for work in &args.work {
        orchestrator.append_work(&mut draft, work)?;
    }
    for decision in &args.decisions {
        orchestrator.append_decision(&mut draft, decision)?;
    }
    for step in &args.next_steps {
        orchestrator.append_next_step(&mut draft, step)?;
    }
    if let Some(goal) = &args.next_goal {
        orchestrator.set_next_goal(&mut draft, goal)?;
    }

    if interactive {
        prompt_entries(orchestrator, &mut draft)?;
        print_draft(&draft);

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Finalize this checkpoint?")
            .default(true)
            .interact()?;
        if !confirmed {
            orchestrator.discard(draft);
            println!("Draft discarded. Nothing was written.");
            return Ok(());
        }
    }

    let finalized = orchestrator.finalize(&mut draft)?;
    let sequence_number = finalized.sequence_number().unwrap_or_default();

    println!(
        "{}Finalized checkpoint #{} for '{}'",
        CHECK, sequence_number, name
    );
    if let Some(task) = finalized.immediate_next_task() {
        println!("  {}Next task: {}", NEXT, task);
    }
    println!();
    println!(
        "Run `waymark commit {} --sequence {}` to commit it.",
        name, sequence_number
    );
    Ok(())
}

/// Collect entries one prompt at a time; an empty answer ends each list.
fn prompt_entries(orchestrator: &Orchestrator, draft: &mut Checkpoint) -> Result<()> {
    let theme = ColorfulTheme::default();

    for entry in prompt_list(&theme, "Work completed")? {
        orchestrator.append_work(draft, &entry)?;
    }
    for entry in prompt_list(&theme, "Key decision")? {
        orchestrator.append_decision(draft, &entry)?;
    }
    for entry in prompt_list(&theme, "Next step")? {
        orchestrator.append_next_step(draft, &entry)?;
    }

    if draft.next_goal().is_none() {
        let goal: String = Input::with_theme(&theme)
            .with_prompt("Goal for the next session (optional)")
            .allow_empty(true)
            .interact_text()?;
        if !goal.trim().is_empty() {
            orchestrator.set_next_goal(draft, &goal)?;
        }
    }
    Ok(())
}

fn prompt_list(theme: &ColorfulTheme, label: &str) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    loop {
        let entry: String = Input::with_theme(theme)
            .with_prompt(format!("{} #{} (empty to finish)", label, entries.len() + 1))
            .allow_empty(true)
            .interact_text()?;
        if entry.trim().is_empty() {
            break;
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn print_draft(draft: &Checkpoint) {
    println!();
    println!("{}{}", CHECKPOINT, console::style("Draft checkpoint").bold());
    for (heading, items) in [
        ("Work completed", draft.work_completed()),
        ("Key decisions", draft.key_decisions()),
        ("Next steps", draft.next_steps()),
    ] {
        println!("  {}:", heading);
        if items.is_empty() {
            println!("    {}", console::style("(none)").dim());
        }
        for item in items {
            println!("    - {}", item);
        }
    }
    if let Some(goal) = draft.next_goal() {
        println!("  Next goal: {}", goal);
    }
    println!();
}
