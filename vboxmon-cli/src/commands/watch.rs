use std::time::Duration;

use clap::Args;
use comfy_table::{Table, presets};
use vboxmon::{MetricKind, VmMonitor};

use crate::format::{format_bytes, format_value};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many refreshes (default: until Ctrl-C)
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Delay between refreshes in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub refresh_ms: u64,
}

pub async fn execute(args: WatchArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let monitor = global.create_monitor().await?;
    monitor.start_daemon();

    let refresh = Duration::from_millis(args.refresh_ms);
    let mut printed = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(refresh) => {}
        }

        if !monitor.daemon_running() {
            break;
        }

        println!("{}", render(&monitor));
        printed += 1;
        if args.ticks.is_some_and(|limit| printed >= limit) {
            break;
        }
    }

    monitor.stop_daemon().await?;
    Ok(())
}

fn render(monitor: &VmMonitor) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);

    let mut header = vec!["MACHINE".to_string()];
    header.extend(MetricKind::ALL.iter().map(|kind| kind.raw_name().to_string()));
    header.push("RAM used".to_string());
    table.set_header(header);

    let store = monitor.store();
    for machine_id in store.machine_ids() {
        let Some(history) = store.history(&machine_id) else {
            continue;
        };

        let mut row = vec![machine_id.clone()];
        for kind in MetricKind::ALL {
            let latest = history
                .get(kind)
                .and_then(|series| series.latest())
                .unwrap_or(f64::NAN);
            row.push(format_value(latest, kind.unit()));
        }
        let used = history.ram_used_bytes().last().copied().unwrap_or(f64::NAN);
        row.push(format_bytes(used));

        table.add_row(row);
    }
    table
}
