use clap::Args;
use vboxmon::LifecycleAction;

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Name or ID of the paused machine(s) to resume
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: ResumeArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    super::apply_to_targets(args.targets, LifecycleAction::Resume, global).await
}
