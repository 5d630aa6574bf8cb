//! Quorum Vault CLI Application
//!
//! A command-line interface for multi-owner wallets with M-of-N approval.

use clap::{Parser, Subcommand};
use quorum_vault::api::{create_router, ApiState, ROUTE_TABLE};
use quorum_vault::cli::{self, AppState};
use quorum_vault::multisig::{MultisigManager, TransactionStatus};
use quorum_vault::storage::{Storage, StorageConfig};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "vault")]
#[command(version = "0.1.0")]
#[command(about = "Multi-owner wallets with M-of-N transaction approval", long_about = None)]
struct Cli {
    /// Data directory for vault storage
    #[arg(short, long, default_value = ".vault_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },

    /// Transaction operations
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },

    /// Export the vault to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import the vault from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a new multisig wallet
    Create {
        /// Wallet name
        #[arg(short, long)]
        name: String,

        /// Owner identities (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<String>,

        /// Approvals required to execute a transaction
        #[arg(short, long)]
        threshold: usize,
    },

    /// List all wallets
    List,

    /// Show wallet details
    Show {
        /// Wallet id or 0x address
        #[arg(short, long)]
        id: String,
    },

    /// List the wallets an identity owns
    Mine {
        /// Identity to look up
        #[arg(long = "as")]
        identity: String,
    },

    /// Rename a wallet
    Rename {
        #[arg(short, long)]
        id: String,

        /// New name
        #[arg(short, long)]
        name: String,

        /// Acting owner
        #[arg(long = "as")]
        actor: String,
    },

    /// Add an owner
    AddOwner {
        #[arg(short, long)]
        id: String,

        /// Identity to add
        #[arg(short, long)]
        owner: String,

        /// Acting owner
        #[arg(long = "as")]
        actor: String,
    },

    /// Remove an owner
    RemoveOwner {
        #[arg(short, long)]
        id: String,

        /// Identity to remove
        #[arg(short, long)]
        owner: String,

        /// Acting owner
        #[arg(long = "as")]
        actor: String,
    },

    /// Change the approval threshold
    Threshold {
        #[arg(short, long)]
        id: String,

        /// New threshold
        #[arg(short, long)]
        threshold: usize,

        /// Acting owner
        #[arg(long = "as")]
        actor: String,
    },

    /// Set the display balance
    Fund {
        #[arg(short, long)]
        id: String,

        /// New balance
        #[arg(short, long)]
        balance: Decimal,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Propose a transaction
    Propose {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,

        /// Recipient
        #[arg(short, long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: Decimal,

        /// What the transfer is for
        #[arg(short, long)]
        description: String,

        /// Proposing owner
        #[arg(long = "as")]
        proposer: String,
    },

    /// Approve a transaction
    Approve {
        /// Transaction id
        #[arg(short, long)]
        id: String,

        #[arg(long = "as")]
        identity: String,
    },

    /// Reject a transaction
    Reject {
        /// Transaction id
        #[arg(short, long)]
        id: String,

        #[arg(long = "as")]
        identity: String,
    },

    /// Execute an approved transaction
    Execute {
        /// Transaction id
        #[arg(short, long)]
        id: String,

        #[arg(long = "as")]
        identity: String,
    },

    /// List a wallet's transactions
    List {
        /// Wallet id
        #[arg(short, long)]
        wallet: String,

        /// Only show this status (pending, approved, rejected, executed)
        #[arg(short, long)]
        status: Option<TransactionStatus>,
    },

    /// Show transaction details
    Show {
        /// Transaction id
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on for REST API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle API commands with tokio runtime
    if let Commands::Api { ref action } = cli.command {
        return run_api_command(action, &cli.data_dir);
    }

    // Initialize application state
    let mut state = AppState::new(cli.data_dir.clone())?;

    // Process commands
    match cli.command {
        Commands::Api { .. } => unreachable!(),

        Commands::Wallet { action } => match action {
            WalletCommands::Create {
                name,
                owners,
                threshold,
            } => {
                cli::cmd_wallet_create(&mut state, &name, owners, threshold)?;
            }
            WalletCommands::List => {
                cli::cmd_wallet_list(&state)?;
            }
            WalletCommands::Show { id } => {
                cli::cmd_wallet_show(&state, &id)?;
            }
            WalletCommands::Mine { identity } => {
                cli::cmd_wallet_mine(&state, &identity)?;
            }
            WalletCommands::Rename { id, name, actor } => {
                cli::cmd_wallet_rename(&mut state, &id, &actor, &name)?;
            }
            WalletCommands::AddOwner { id, owner, actor } => {
                cli::cmd_wallet_add_owner(&mut state, &id, &actor, &owner)?;
            }
            WalletCommands::RemoveOwner { id, owner, actor } => {
                cli::cmd_wallet_remove_owner(&mut state, &id, &actor, &owner)?;
            }
            WalletCommands::Threshold {
                id,
                threshold,
                actor,
            } => {
                cli::cmd_wallet_threshold(&mut state, &id, &actor, threshold)?;
            }
            WalletCommands::Fund { id, balance } => {
                cli::cmd_wallet_fund(&mut state, &id, balance)?;
            }
        },

        Commands::Tx { action } => match action {
            TxCommands::Propose {
                wallet,
                to,
                amount,
                description,
                proposer,
            } => {
                cli::cmd_tx_propose(&mut state, &wallet, &proposer, &to, amount, &description)?;
            }
            TxCommands::Approve { id, identity } => {
                cli::cmd_tx_approve(&mut state, &id, &identity)?;
            }
            TxCommands::Reject { id, identity } => {
                cli::cmd_tx_reject(&mut state, &id, &identity)?;
            }
            TxCommands::Execute { id, identity } => {
                cli::cmd_tx_execute(&mut state, &id, &identity)?;
            }
            TxCommands::List { wallet, status } => {
                cli::cmd_tx_list(&state, &wallet, status)?;
            }
            TxCommands::Show { id } => {
                cli::cmd_tx_show(&state, &id)?;
            }
        },

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}

fn run_api_command(action: &ApiCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                // Initialize storage
                let storage_config = StorageConfig {
                    data_dir: data_dir.to_path_buf(),
                    ..Default::default()
                };
                let storage = Storage::new(storage_config)?;

                // Load or create the vault
                let manager = if storage.exists() {
                    println!("📂 Loading existing vault...");
                    storage.load()?
                } else {
                    println!("📂 Creating new vault...");
                    let manager = MultisigManager::new();
                    storage.save(&manager)?;
                    manager
                };

                let state = ApiState::new(manager, storage);
                let app = create_router(state);

                // Start server
                let addr = format!("0.0.0.0:{}", port);
                println!("🚀 REST API server starting on http://localhost:{}", port);
                println!("\n📚 Endpoints:");
                for (method, path, about) in ROUTE_TABLE {
                    println!("   {:<5} {:<38} - {}", method, path, about);
                }

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        tokio::signal::ctrl_c().await.ok();
                        println!("\n📴 Shutting down API server...");
                    })
                    .await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
