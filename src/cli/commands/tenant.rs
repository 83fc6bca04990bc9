use clap::Subcommand;
use serde_json::json;

use crate::cli::context::services;
use crate::cli::utils::{output_collection, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::services::NewTenant;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all stores")]
    List,

    #[command(about = "Create a store")]
    Create {
        #[arg(long, help = "Display name (3-50 characters)")]
        name: String,
        #[arg(long, help = "URL slug: lowercase letters, digits and hyphens")]
        slug: String,
        #[arg(long, help = "Owner contact email")]
        owner_email: String,
    },
}

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let services = services(config()).await?;

    match cmd {
        TenantCommands::List => {
            let tenants = services.tenants.list().await?;
            output_collection(output_format, &tenants, "No tenants found", |t| {
                vec![
                    t.slug.clone(),
                    t.name.clone(),
                    t.owner_email.clone(),
                    if t.active { "active" } else { "inactive" }.to_string(),
                ]
            })
        }
        TenantCommands::Create {
            name,
            slug,
            owner_email,
        } => {
            let tenant = services
                .tenants
                .create_tenant(NewTenant {
                    name,
                    slug,
                    owner_email,
                })
                .await?;
            output_success(
                output_format,
                &format!("Created tenant '{}' ({})", tenant.slug, tenant.id),
                Some(json!(tenant)),
            )
        }
    }
}
