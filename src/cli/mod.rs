mod args;
mod command;
mod seed_cmd;

pub use args::Cli;
pub use command::Command;
pub use seed_cmd::SeedCmd;

pub use args::parse;
