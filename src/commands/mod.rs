//! `Command` trait: one `run(self)` entry point per subcommand.

mod run_command;

pub use run_command::RunCommand;

use crate::error::SandboxResult;

pub trait Command {
    fn run(self) -> SandboxResult<()>;
}
