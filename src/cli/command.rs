use clap::Subcommand;

use crate::cli::seed_cmd::SeedCmd;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Provision a demo user with a funded account",
        long_about = "Create a user and an account directly in the SQLite database, without \
                      going through the REST API. Requires --db."
    )]
    Seed {
        #[command(flatten)]
        args: SeedCmd,
    },
}
