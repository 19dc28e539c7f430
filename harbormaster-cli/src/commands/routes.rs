//! `harbormaster routes`: show where credentials and webhooks will point.

use anyhow::Result;
use clap::Args;

use super::load_settings;

#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl RoutesArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings()?;
        let routes = settings.routes();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&routes)?);
            return Ok(());
        }
        println!("registry: {}", routes.registry_url);
        println!("webhook:  {}", routes.webhook_url);
        Ok(())
    }
}
