//! `azurerm`: resource ID parsing and Databricks key/peering management.

mod cli;
mod commands;
mod logging;

use std::io::Write;

use miette::IntoDiagnostic;
use serde_json::Value;
use tracing::{Instrument, info_span, instrument};

use crate::cli::{CmkCommands, Commands, IdCommands, PeeringCommands};
use crate::commands::Context;
use crate::commands::cmk::SetKeys;
use crate::logging::{TracingConfig, correlation_id};

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = cli::parse();

    crate::logging::init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        ..TracingConfig::default()
    })?;

    let span = info_span!("command", correlation_id = %correlation_id());
    let output = execute(cli).instrument(span).await?;

    let mut stdout = std::io::stdout().lock();
    let rendered = serde_json::to_string_pretty(&output).into_diagnostic()?;
    writeln!(stdout, "{rendered}").into_diagnostic()?;
    Ok(())
}

#[instrument(skip_all)]
async fn execute(cli: cli::Cli) -> miette::Result<Value> {
    let config_path = cli.config.as_deref();

    let output = match cli.command {
        Commands::Id {
            subcommand: IdCommands::Parse {
                id,
                kind,
                insensitive,
            },
        } => commands::id::parse(&id, kind, insensitive)?,

        Commands::Cmk { subcommand } => {
            let context = Context::load(config_path)?;
            match subcommand {
                CmkCommands::Show { workspace_id } => {
                    commands::cmk::show(&context.workspaces(), &workspace_id).await?
                }
                CmkCommands::Set {
                    workspace_id,
                    key_vault_key_id,
                    managed_services_key_id,
                    managed_disk_key_id,
                    rotate_to_latest,
                } => {
                    let request = SetKeys {
                        key_vault_key_id,
                        managed_services_key_id,
                        managed_disk_key_id,
                        rotate_to_latest,
                    };
                    commands::cmk::set(
                        &context.customer_managed_keys(),
                        &context.workspace_encryption(),
                        &workspace_id,
                        &request,
                    )
                    .await?
                }
                CmkCommands::Remove { workspace_id } => {
                    commands::cmk::remove(&context.customer_managed_keys(), &workspace_id).await?
                }
            }
        }

        Commands::Peering { subcommand } => {
            let context = Context::load(config_path)?;
            match subcommand {
                PeeringCommands::Show { id } => commands::peering::show(&context.peerings(), &id).await?,
                PeeringCommands::Delete { id } => {
                    commands::peering::delete(&context.peerings(), &id).await?
                }
            }
        }
    };

    Ok(output)
}
