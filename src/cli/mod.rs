//! CLI module for taskrank - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
