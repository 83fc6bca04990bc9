use clap::Subcommand;
use serde_json::json;

use crate::cli::context::services;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create the platform store and its ADMIN account")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Platform Administrator")]
        full_name: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let services = services(config()).await?;

    match cmd {
        AdminCommands::Create {
            email,
            password,
            full_name,
        } => {
            let (tenant, admin) = services
                .tenants
                .register_platform_admin(&email, &password, &full_name)
                .await?;
            output_success(
                output_format,
                &format!("Created admin {} in store '{}'", admin.email, tenant.slug),
                Some(json!({ "tenant": tenant, "user": admin })),
            )
        }
    }
}
