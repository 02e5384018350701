//! Ways to talk to the intake engine outside of HTTP.

pub mod cli;

pub use cli::CliChannel;
