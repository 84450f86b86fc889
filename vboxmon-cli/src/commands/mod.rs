//! CLI command implementations.

use vboxmon::LifecycleAction;

use crate::cli::GlobalFlags;

pub mod info;
pub mod list;
pub mod pause;
pub mod resume;
pub mod save;
pub mod start;
pub mod stop;
pub mod watch;

/// Apply `action` to every target, reporting each outcome.
///
/// Targets that cannot be resolved or whose command is rejected are
/// collected into one error. A machine that did not reach the expected
/// state is reported but does not fail the command.
pub(crate) async fn apply_to_targets(
    targets: Vec<String>,
    action: LifecycleAction,
    global: &GlobalFlags,
) -> anyhow::Result<()> {
    let monitor = global.create_monitor().await?;

    let mut errors = Vec::new();
    let mut success_count = 0;

    for target in targets {
        let machine = match monitor.machine(&target).await {
            Ok(m) => m,
            Err(vboxmon::VboxError::NotFound(_)) => {
                eprintln!("Error: No such machine: {}", target);
                errors.push(format!("{}: not found", target));
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match monitor.lifecycle().apply(&machine, action).await {
            Ok(outcome) if !outcome.command_accepted() => {
                eprintln!("Error: {} of '{}' rejected: {}", action, target, outcome.stderr);
                errors.push(format!("{}: {}", target, outcome.stderr));
            }
            Ok(outcome) => {
                if outcome.reached() {
                    println!("{} {} ({})", outcome.observed.indicator(), target, outcome.observed);
                } else {
                    println!(
                        "{} {} ({}, expected {})",
                        outcome.observed.indicator(),
                        target,
                        outcome.observed,
                        outcome.expected
                    );
                }
                success_count += 1;
            }
            Err(e) => {
                eprintln!("Error: {} of '{}' failed: {}", action, target, e);
                errors.push(format!("{}: {}", target, e));
            }
        }
    }

    if !errors.is_empty() {
        let error_summary = if success_count > 0 {
            format!(
                "Failed to {} {} of {} machine(s)",
                action,
                errors.len(),
                errors.len() + success_count
            )
        } else {
            format!("Failed to {} all {} machine(s)", action, errors.len())
        };

        anyhow::bail!("{}\nErrors:\n  {}", error_summary, errors.join("\n  "));
    }
    Ok(())
}
