//! Pawnshop Transfers - CLI
//!
//! Drives the branch-to-branch item transfer lifecycle against the
//! configured database. Every command prints its result as JSON.
//!
//! ```sh
//! # Default config (~/.config/pawnshop-transfers/config.toml)
//! pawnshop-transfers branch create --code DT --name Downtown
//! pawnshop-transfers item create --code RING-1 --name "Gold ring" --branch 1
//!
//! # Move the ring to branch 2
//! pawnshop-transfers transfer create --item 1 --from 1 --to 2 --by 7
//! pawnshop-transfers transfer ship 1 --by 7
//! pawnshop-transfers transfer receive 1 --by 42
//!
//! # Validate config and database connectivity
//! pawnshop-transfers --config /etc/pawnshop/config.toml check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use tracing::{error, info};

use pawnshop_transfers::application::{
    ApproveTransferRequest, CancelTransferRequest, CreateTransferRequest, ReceiveTransferRequest,
};
use pawnshop_transfers::config::AppConfig;
use pawnshop_transfers::domain::{
    Branch, DomainError, Item, RepositoryProvider, TransferFilter, TransferStatus,
};
use pawnshop_transfers::infrastructure::database::migrator::Migrator;
use pawnshop_transfers::logging::init_tracing;
use pawnshop_transfers::notifications::create_event_bus_with_capacity;
use pawnshop_transfers::shared::errors::{AppError, InfraError};
use pawnshop_transfers::{default_config_path, init_database, SeaOrmRepositoryProvider, TransferService};

type CliResult<T> = Result<T, AppError>;

/// Pawnshop item transfers between branches.
#[derive(Parser, Debug)]
#[command(
    name = "pawnshop-transfers",
    version,
    about = "Move pawnshop items between branches",
    long_about = "Pawnshop Transfers - request, ship, receive and cancel \
                  item transfers between branches.\n\n\
                  Default config: ~/.config/pawnshop-transfers/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, env = "PAWNSHOP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Skip database migrations before running the command.
    #[arg(long, global = true)]
    no_migrate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and database connection, then exit.
    Check,
    /// Apply pending database migrations.
    Migrate,
    #[command(subcommand)]
    Branch(BranchCommand),
    #[command(subcommand)]
    Item(ItemCommand),
    #[command(subcommand)]
    Transfer(TransferCommand),
}

#[derive(Subcommand, Debug)]
enum BranchCommand {
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum ItemCommand {
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        /// Branch currently holding the item
        #[arg(long)]
        branch: i32,
        #[arg(long)]
        category: Option<String>,
    },
    Show {
        id: i32,
    },
    /// Items held at a branch
    List {
        #[arg(long)]
        branch: i32,
    },
}

#[derive(Subcommand, Debug)]
enum TransferCommand {
    /// Request a transfer (starts pending)
    Create {
        #[arg(long)]
        item: i32,
        #[arg(long)]
        from: i32,
        #[arg(long)]
        to: i32,
        /// Requesting user id
        #[arg(long = "by")]
        requested_by: i32,
        #[arg(long)]
        notes: Option<String>,
    },
    Approve {
        id: i32,
        #[arg(long = "by")]
        approved_by: i32,
        #[arg(long)]
        notes: Option<String>,
    },
    Ship {
        id: i32,
        #[arg(long = "by")]
        shipped_by: i32,
    },
    Receive {
        id: i32,
        #[arg(long = "by")]
        received_by: i32,
        #[arg(long)]
        notes: Option<String>,
    },
    Cancel {
        id: i32,
        #[arg(long = "by")]
        cancelled_by: i32,
        #[arg(long)]
        reason: String,
    },
    /// Show a transfer with its item and branches, by id or by number
    Show {
        #[arg(required_unless_present = "number")]
        id: Option<i32>,
        #[arg(long, conflicts_with = "id")]
        number: Option<String>,
    },
    List {
        /// Only transfers into or out of this branch
        #[arg(long)]
        branch: Option<i32>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        item: Option<i32>,
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        page_size: Option<u64>,
    },
    /// Pending transfers into or out of a branch
    Pending {
        #[arg(long)]
        branch: i32,
    },
    /// Shipped transfers into or out of a branch
    InTransit {
        #[arg(long)]
        branch: i32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Pending,
    Approved,
    InTransit,
    Completed,
    Cancelled,
}

impl From<StatusArg> for TransferStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TransferStatus::Pending,
            StatusArg::Approved => TransferStatus::Approved,
            StatusArg::InTransit => TransferStatus::InTransit,
            StatusArg::Completed => TransferStatus::Completed,
            StatusArg::Cancelled => TransferStatus::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config.logging);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Database ───────────────────────────────────────────────
    let db_config = config.database_config();
    let db = init_database(&db_config).await.map_err(InfraError::from)?;

    if let Command::Check = cli.command {
        db.ping().await.map_err(InfraError::from)?;
        println!("✅ Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   Database      : {}", db_config.url);
        println!("   Log level     : {}", config.logging.level);
        println!("   Number prefix : {}", config.transfers.number_prefix);
        return Ok(());
    }

    if matches!(cli.command, Command::Migrate) || !cli.no_migrate {
        Migrator::up(&db, None).await.map_err(InfraError::from)?;
        info!("Database migrations applied");
    }
    if let Command::Migrate = cli.command {
        return Ok(());
    }

    // ── Services ───────────────────────────────────────────────
    let repos = Arc::new(SeaOrmRepositoryProvider::with_number_prefix(
        db,
        config.transfers.number_prefix.clone(),
    ));
    let events = create_event_bus_with_capacity(config.transfers.event_capacity);
    let service = TransferService::new(repos.clone(), events);

    match cli.command {
        Command::Check | Command::Migrate => Ok(()),
        Command::Branch(cmd) => run_branch(repos.as_ref(), cmd).await,
        Command::Item(cmd) => run_item(repos.as_ref(), cmd).await,
        Command::Transfer(cmd) => run_transfer(&service, cmd).await,
    }
}

async fn run_branch(repos: &dyn RepositoryProvider, cmd: BranchCommand) -> CliResult<()> {
    match cmd {
        BranchCommand::Create {
            code,
            name,
            address,
        } => {
            let mut branch = Branch::new(code, name);
            if let Some(address) = address {
                branch = branch.with_address(address);
            }
            print_json(&repos.branches().create(branch).await?)
        }
        BranchCommand::List => print_json(&repos.branches().find_all().await?),
    }
}

async fn run_item(repos: &dyn RepositoryProvider, cmd: ItemCommand) -> CliResult<()> {
    match cmd {
        ItemCommand::Create {
            code,
            name,
            branch,
            category,
        } => {
            let mut item = Item::new(code, name, branch);
            item.category = category;
            print_json(&repos.items().create(item).await?)
        }
        ItemCommand::Show { id } => match repos.items().find_by_id(id).await? {
            Some(item) => print_json(&item),
            None => Err(DomainError::ItemNotFound(id).into()),
        },
        ItemCommand::List { branch } => print_json(&repos.items().find_by_branch(branch).await?),
    }
}

async fn run_transfer(service: &TransferService, cmd: TransferCommand) -> CliResult<()> {
    match cmd {
        TransferCommand::Create {
            item,
            from,
            to,
            requested_by,
            notes,
        } => {
            let transfer = service
                .create(CreateTransferRequest {
                    item_id: item,
                    from_branch_id: from,
                    to_branch_id: to,
                    requested_by,
                    notes,
                })
                .await?;
            print_json(&transfer)
        }
        TransferCommand::Approve {
            id,
            approved_by,
            notes,
        } => print_json(
            &service
                .approve(id, ApproveTransferRequest { approved_by, notes })
                .await?,
        ),
        TransferCommand::Ship { id, shipped_by } => print_json(&service.ship(id, shipped_by).await?),
        TransferCommand::Receive {
            id,
            received_by,
            notes,
        } => print_json(
            &service
                .receive(id, ReceiveTransferRequest { received_by, notes })
                .await?,
        ),
        TransferCommand::Cancel {
            id,
            cancelled_by,
            reason,
        } => print_json(
            &service
                .cancel(
                    id,
                    CancelTransferRequest {
                        cancelled_by,
                        reason,
                    },
                )
                .await?,
        ),
        TransferCommand::Show { id, number } => {
            let details = match (id, number) {
                (_, Some(number)) => service.get_by_number(&number).await?,
                (Some(id), None) => service.get_by_id(id).await?,
                (None, None) => {
                    return Err(DomainError::Validation("pass a transfer id or --number".into()).into())
                }
            };
            print_json(&details)
        }
        TransferCommand::List {
            branch,
            status,
            item,
            page,
            page_size,
        } => {
            let filter = TransferFilter {
                page,
                page_size,
                status: status.map(TransferStatus::from),
                item_id: item,
                ..TransferFilter::default()
            };
            let result = match branch {
                Some(branch_id) => service.list_by_branch(branch_id, &filter).await?,
                None => service.list(&filter).await?,
            };
            print_json(&result)
        }
        TransferCommand::Pending { branch } => print_json(&service.pending_for_branch(branch).await?),
        TransferCommand::InTransit { branch } => {
            print_json(&service.in_transit_for_branch(branch).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transfer_list_filters() {
        let cli = Cli::try_parse_from([
            "pawnshop-transfers",
            "transfer",
            "list",
            "--branch",
            "2",
            "--status",
            "in-transit",
            "--page-size",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::Transfer(TransferCommand::List {
                branch,
                status,
                page_size,
                ..
            }) => {
                assert_eq!(branch, Some(2));
                assert!(matches!(status, Some(StatusArg::InTransit)));
                assert_eq!(page_size, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn show_needs_id_or_number() {
        assert!(Cli::try_parse_from(["pawnshop-transfers", "transfer", "show"]).is_err());
        assert!(
            Cli::try_parse_from(["pawnshop-transfers", "transfer", "show", "--number", "TRF-1"]).is_ok()
        );
    }
}
