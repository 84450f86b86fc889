use clap::Args;
use comfy_table::{Table, presets};

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Name or ID of the machine
    pub target: String,

    /// Print attributes as a JSON object
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: InfoArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let monitor = global.create_monitor().await?;
    let machine = monitor.machine(&args.target).await?;
    let info = machine.reload().await?;

    if args.json {
        let attributes: serde_json::Map<String, serde_json::Value> = info
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::from(value)))
            .collect();
        let document = serde_json::json!({
            "id": machine.id(),
            "name": machine.name(),
            "state": info.state().to_string(),
            "os_type": info.os_type(),
            "loaded_at": info.loaded_at.to_rfc3339(),
            "attributes": attributes,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!(
        "{} {} ({}) {}",
        info.state().indicator(),
        machine.name(),
        machine.id(),
        info.state()
    );

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["KEY", "VALUE"]);
    for (key, value) in info.iter() {
        table.add_row(vec![key, value]);
    }
    println!("{table}");
    Ok(())
}
