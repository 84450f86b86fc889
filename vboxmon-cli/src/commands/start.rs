use clap::Args;
use vboxmon::LifecycleAction;

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Name or ID of the machine(s) to start
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: StartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    super::apply_to_targets(args.targets, LifecycleAction::Start, global).await
}
