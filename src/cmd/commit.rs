//! Commit message and git commit commands.

use anyhow::Result;

use waymark::commit::PublishOptions;
use waymark::orchestrator::Orchestrator;
use waymark::tracker::GitGateway;
use waymark::ui::icons::{CHECK, COMMIT, PUSH};

pub fn cmd_message(orchestrator: &Orchestrator, name: &str, sequence: Option<u64>) -> Result<()> {
    let checkpoint = orchestrator.checkpoint(name, sequence)?;
    let message = orchestrator.commit_message(&checkpoint)?;
    print!("{}", message.full_text());
    Ok(())
}

pub fn cmd_commit(
    orchestrator: &Orchestrator,
    name: &str,
    sequence: Option<u64>,
    push: bool,
    remote: Option<&str>,
    branch: Option<&str>,
) -> Result<()> {
    let checkpoint = orchestrator.checkpoint(name, sequence)?;

    let mut options = PublishOptions::from_config(orchestrator.config());
    options.push |= push;
    if let Some(remote) = remote {
        options.remote = remote.to_string();
    }
    if let Some(branch) = branch {
        options.branch = Some(branch.to_string());
    }

    let mut gateway = GitGateway::open(&orchestrator.config().root)?;
    let outcome = orchestrator.publish(&mut gateway, &checkpoint, &options)?;

    println!(
        "{}Committed checkpoint #{} of '{}' as {}",
        COMMIT,
        checkpoint.sequence_number().unwrap_or_default(),
        name,
        &outcome.commit_id.0[..outcome.commit_id.0.len().min(10)]
    );
    println!("  {}", outcome.message.summary);
    for path in &outcome.staged {
        println!("  {}", console::style(path.display()).dim());
    }
    if let Some(target) = &outcome.pushed_to {
        println!("{}Pushed to {}", PUSH, target);
    } else {
        println!("{}Not pushed (use --push)", CHECK);
    }
    Ok(())
}
