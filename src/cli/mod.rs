//! Terminal front end: table rendering and the interactive shell.

pub mod repl;
pub mod table;

pub use repl::{run_repl, Command, Shell};
