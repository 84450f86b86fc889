use clap::Args;
use vboxmon::LifecycleAction;

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Name or ID of the machine(s) whose state to save
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,
}

pub async fn execute(args: SaveArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    super::apply_to_targets(args.targets, LifecycleAction::Save, global).await
}
