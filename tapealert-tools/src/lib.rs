pub mod fs;
pub mod json;

mod command;
pub use command::{command_output, run_command, CommandOutput};
