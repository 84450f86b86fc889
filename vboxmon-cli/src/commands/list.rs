use clap::Args;
use comfy_table::{Table, presets};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show running machines
    #[arg(short, long)]
    pub running: bool,

    /// Only print machine IDs
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: ListArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let monitor = global.create_monitor().await?;
    let machines = if args.running {
        monitor.manage().running_machines().await?
    } else {
        monitor.list_machines().await?
    };

    if args.quiet {
        for machine in &machines {
            println!("{}", machine.id());
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["", "NAME", "ID", "STATE", "OS TYPE"]);

    for machine in &machines {
        let (indicator, state, os_type) = match machine.info().await {
            Ok(info) => {
                let state = info.state();
                (
                    state.indicator(),
                    state.to_string(),
                    info.os_type().to_string(),
                )
            }
            Err(e) => {
                tracing::warn!(machine_id = %machine.id(), error = %e, "Cannot read machine info");
                ("!", "unknown".to_string(), "-".to_string())
            }
        };
        table.add_row(vec![
            indicator.to_string(),
            machine.name().to_string(),
            machine.id().to_string(),
            state,
            os_type,
        ]);
    }

    println!("{table}");
    Ok(())
}
