use clap::Args;
use vboxmon::LifecycleAction;

#[derive(Args, Debug)]
pub struct PauseArgs {
    /// Name or ID of the machine(s) to pause
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: PauseArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    super::apply_to_targets(args.targets, LifecycleAction::Pause, global).await
}
