//! `infrakit sync <app>`: ask the delivery controller to reconcile now.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use infrakit_core::types::AppName;

use crate::context::{self, Schema};

/// Arguments for `infrakit sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Name of an onboarded application.
    pub name: String,
}

impl SyncArgs {
    const SCHEMA: Schema = Schema::AsIs;

    pub fn run(self) -> Result<()> {
        let config = context::load_config()?;
        let name = AppName::from(self.name);

        context::block_on(async {
            let orchestrator = context::connect(&config, Self::SCHEMA).await?;
            orchestrator
                .sync(&name)
                .await
                .with_context(|| format!("sync of '{name}' failed"))
        })?;

        println!("{} Sync triggered for '{}'", "✓".green().bold(), name);
        println!("  Run 'infrakit status {name} --live' to follow reconciliation.");
        Ok(())
    }
}
