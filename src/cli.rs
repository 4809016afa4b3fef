/// Argument parsing and dispatch for the `buf` binary.
pub mod cli_main;
