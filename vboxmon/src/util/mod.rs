mod process;

pub use process::{CommandRunner, ProcessOutcome, ProcessOutput, ProcessRunner};
