//! Subcommand implementations for the `ligolwctl` binary.

pub mod cmd_list;
pub mod cmd_print;
pub mod cmd_select;
pub mod common;
