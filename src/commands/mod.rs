pub mod seed;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::Command;
use crate::context::Context;
use crate::storage::Storage;

impl Command {
    pub fn run(&self, ctx: &Context, storage: Arc<dyn Storage + Send + Sync>) -> Result<()> {
        match self {
            Command::Seed { args } => seed::run(ctx, storage, args),
        }
    }
}
