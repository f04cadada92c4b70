use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logging::{LogLevel, TracingFormat};

#[derive(Parser, Debug)]
#[command(name = "azurerm")]
#[command(about = "Inspect and manage Azure Databricks resources through Resource Manager")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        env = "AZURERM_CONFIG",
        help = "Provider configuration file (TOML)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Resource ID operations")]
    Id {
        #[command(subcommand)]
        subcommand: IdCommands,
    },
    #[command(about = "Workspace customer-managed key for root DBFS")]
    Cmk {
        #[command(subcommand)]
        subcommand: CmkCommands,
    },
    #[command(about = "Workspace virtual network peerings")]
    Peering {
        #[command(subcommand)]
        subcommand: PeeringCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdCommands {
    #[command(about = "Parse a resource ID and print its segments as JSON")]
    Parse {
        #[arg(help = "Resource ID to parse")]
        id: String,
        #[arg(long, short = 'k', value_enum, help = "Kind of ID expected")]
        kind: IdKind,
        #[arg(long, help = "Accept any casing of fixed segments")]
        insensitive: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CmkCommands {
    #[command(about = "Show the encryption keys configured on a workspace")]
    Show {
        #[arg(help = "Workspace ID")]
        workspace_id: String,
    },
    #[command(about = "Encrypt root DBFS, managed services or managed disks with Key Vault keys")]
    Set {
        #[arg(help = "Workspace ID")]
        workspace_id: String,
        #[arg(
            long,
            required_unless_present_any = ["managed_services_key_id", "managed_disk_key_id"],
            help = "Root DBFS Key Vault key ID, with or without a version"
        )]
        key_vault_key_id: Option<String>,
        #[arg(long, help = "Managed services Key Vault key ID")]
        managed_services_key_id: Option<String>,
        #[arg(long, help = "Managed disk Key Vault key ID")]
        managed_disk_key_id: Option<String>,
        #[arg(
            long,
            requires = "managed_disk_key_id",
            help = "Managed disks follow the latest key version"
        )]
        rotate_to_latest: bool,
    },
    #[command(about = "Return root DBFS to Microsoft-managed keys")]
    Remove {
        #[arg(help = "Workspace ID")]
        workspace_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PeeringCommands {
    #[command(about = "Show a virtual network peering")]
    Show {
        #[arg(help = "Peering ID")]
        id: String,
    },
    #[command(about = "Delete a virtual network peering")]
    Delete {
        #[arg(help = "Peering ID")]
        id: String,
    },
}

/// ID kinds accepted by `id parse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IdKind {
    Subscription,
    ResourceGroup,
    Workspace,
    AccessConnector,
    CustomerManagedKey,
    VirtualNetworkPeering,
    VirtualNetwork,
    KeyVault,
    /// Key Vault key URL; casing options do not apply
    KeyVaultKey,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from([
            "azurerm",
            "id",
            "parse",
            "/subscriptions/sub",
            "--kind",
            "subscription",
        ])
        .unwrap();

        assert_eq!(cli.log_level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Id {
                subcommand: IdCommands::Parse { kind, insensitive, .. },
            } => {
                assert_eq!(kind, IdKind::Subscription);
                assert!(!insensitive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "azurerm",
            "peering",
            "show",
            "/subscriptions/sub/x",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--config",
            "provider.toml",
        ])
        .unwrap();

        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, TracingFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("provider.toml")));
    }

    #[test]
    fn test_kind_names_are_kebab_case() {
        let cli = Cli::try_parse_from([
            "azurerm",
            "id",
            "parse",
            "x",
            "--kind",
            "virtual-network-peering",
            "--insensitive",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Id {
                subcommand: IdCommands::Parse {
                    kind: IdKind::VirtualNetworkPeering,
                    insensitive: true,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_cmk_set_requires_key() {
        assert!(Cli::try_parse_from(["azurerm", "cmk", "set", "/subscriptions/sub"]).is_err());
    }

    #[test]
    fn test_cmk_set_disk_key_alone() {
        let cli = Cli::try_parse_from([
            "azurerm",
            "cmk",
            "set",
            "/subscriptions/sub",
            "--managed-disk-key-id",
            "https://disk.vault.azure.net/keys/disk",
            "--rotate-to-latest",
        ])
        .unwrap();

        match cli.command {
            Commands::Cmk {
                subcommand:
                    CmkCommands::Set {
                        key_vault_key_id,
                        managed_disk_key_id,
                        rotate_to_latest,
                        ..
                    },
            } => {
                assert!(key_vault_key_id.is_none());
                assert_eq!(managed_disk_key_id.as_deref(), Some("https://disk.vault.azure.net/keys/disk"));
                assert!(rotate_to_latest);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rotate_requires_disk_key() {
        assert!(
            Cli::try_parse_from([
                "azurerm",
                "cmk",
                "set",
                "/subscriptions/sub",
                "--managed-services-key-id",
                "https://svc.vault.azure.net/keys/svc",
                "--rotate-to-latest",
            ])
            .is_err()
        );
    }
}
