//! Brain inspection and maintenance: `waymark brain`.

use anyhow::Result;

use super::super::BrainCommands;
use waymark::orchestrator::Orchestrator;
use waymark::ui::icons::CHECK;

pub fn cmd_brain(orchestrator: &Orchestrator, command: BrainCommands) -> Result<()> {
    match command {
        BrainCommands::Show { name } => {
            let brain = orchestrator.load_brain(&name)?;
            println!("{}", serde_json::to_string_pretty(&brain)?);
        }
        BrainCommands::AddObjective { name, objective } => {
            let brain = orchestrator.update_brain(&name, |brain| {
                brain.objectives.push(objective.trim().to_string());
                Ok(())
            })?;
            println!(
                "{}Added objective #{} to '{}'",
                CHECK,
                brain.objectives.len(),
                name
            );
        }
        BrainCommands::SetConstant { name, key, value } => {
            let parsed = serde_json::from_str::<serde_json::Value>(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            let key = key.trim().to_string();
            orchestrator.update_brain(&name, |brain| {
                brain.architectural_constants.insert(key.clone(), parsed);
                Ok(())
            })?;
            println!("{}Set {} for '{}'", CHECK, key, name);
        }
    }
    Ok(())
}
