use clap::Subcommand;
use serde_json::json;

use crate::cli::context::services;
use crate::cli::utils::{output_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum PlanCommands {
    #[command(about = "List every plan, including retired ones")]
    List,

    #[command(about = "Insert the default plan catalog (existing slugs are left alone)")]
    Seed,
}

pub async fn handle(cmd: PlanCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let services = services(config()).await?;

    match cmd {
        PlanCommands::List => {
            let plans = services.subscriptions.list_all_plans().await?;
            output_collection(output_format, &plans, "No plans found", |p| {
                vec![
                    p.slug.clone(),
                    p.name.clone(),
                    p.price.to_string(),
                    p.billing_interval.to_string(),
                    if p.active { "active" } else { "retired" }.to_string(),
                ]
            })
        }
        PlanCommands::Seed => {
            let created = services.subscriptions.seed_default_plans().await?;
            output_success(
                output_format,
                &format!("Seeded {} plan(s)", created.len()),
                Some(json!(created)),
            )
        }
    }
}
