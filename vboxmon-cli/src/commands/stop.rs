use clap::Args;
use vboxmon::LifecycleAction;

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Power off immediately instead of pressing the ACPI power button
    #[arg(short, long)]
    pub kill: bool,

    /// Name or ID of the machine(s) to stop
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StopArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let action = if args.kill {
        LifecycleAction::Kill
    } else {
        LifecycleAction::Shutdown
    };
    super::apply_to_targets(args.targets, action, global).await
}
