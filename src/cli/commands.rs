//! CLI commands for the vault
//!
//! Implements all command handlers for the CLI interface. Each mutating
//! command saves the vault before returning.

use crate::multisig::{MultisigManager, StatusChange, Transaction, TransactionStatus, Wallet};
use crate::storage::{Storage, StorageConfig};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub manager: MultisigManager,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize application state
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage_config = StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        };

        let storage = Storage::new(storage_config)?;

        log::debug!("Opening vault in {:?}", data_dir);
        let manager = storage.load_or_default()?;

        Ok(Self {
            manager,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.manager)?;
        Ok(())
    }
}

fn print_wallet(wallet: &Wallet) {
    println!("   🆔 ID: {}", wallet.id);
    println!("   🏷️  Name: {}", wallet.name);
    println!("   📍 Address: {}", wallet.address);
    println!("   🔐 Type: {}", wallet.description());
    println!("   👥 Owners: {}", wallet.owners.join(", "));
    println!("   💰 Balance: {}", wallet.balance);
}

fn print_transaction(tx: &Transaction, wallet: &Wallet) {
    println!("   🆔 ID: {}", tx.id);
    println!("   📤 To: {}", tx.recipient);
    println!("   💰 Amount: {}", tx.amount);
    if !tx.description.is_empty() {
        println!("   📝 Description: {}", tx.description);
    }
    println!("   🙋 Proposer: {}", tx.proposer);
    println!(
        "   ✍️  Approvals: {}/{} ({})",
        tx.valid_approvals(wallet),
        wallet.threshold,
        tx.approvals.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    if !tx.status.is_terminal() {
        println!("   ⏳ Remaining: {}", tx.approvals_remaining(wallet));
    }
    if !tx.rejections.is_empty() {
        println!(
            "   ✋ Rejections: {}",
            tx.rejections.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    println!("   📊 Status: {}", tx.status);
    if let Some(executed_at) = tx.executed_at {
        println!("   🕐 Executed: {}", executed_at.format("%Y-%m-%d %H:%M:%S"));
    }
}

fn print_status_changes(changes: &[StatusChange]) {
    for change in changes {
        println!(
            "   🔄 {} moved from {} to {}",
            change.tx_id, change.from, change.to
        );
    }
}

// ============================================================================
// Wallets
// ============================================================================

/// Create a new multisig wallet
pub fn cmd_wallet_create(
    state: &mut AppState,
    name: &str,
    owners: Vec<String>,
    threshold: usize,
) -> CliResult<()> {
    let wallet = state.manager.create_wallet(name, owners, threshold)?;
    state.save()?;

    println!("🔐 New multisig wallet created!");
    print_wallet(&wallet);
    Ok(())
}

/// List all wallets
pub fn cmd_wallet_list(state: &AppState) -> CliResult<()> {
    let wallets = state.manager.list_wallets();

    if wallets.is_empty() {
        println!("📭 No wallets found. Create one with: vault wallet create");
        return Ok(());
    }

    println!("👛 Wallets ({}):", wallets.len());
    for wallet in wallets {
        println!(
            "   {} {} [{}] {} ({})",
            wallet.id,
            wallet.address,
            wallet.description(),
            wallet.name,
            wallet.balance
        );
    }
    Ok(())
}

/// Show wallet details and transaction counts
pub fn cmd_wallet_show(state: &AppState, key: &str) -> CliResult<()> {
    let wallet = state.manager.find_wallet(key)?;
    let summary = state.manager.wallet_summary(&wallet.id)?;

    println!("👛 Wallet {}", wallet.id);
    print_wallet(wallet);
    println!(
        "   📊 Transactions: {} pending, {} approved, {} rejected, {} executed",
        summary.transactions.pending,
        summary.transactions.approved,
        summary.transactions.rejected,
        summary.transactions.executed
    );
    Ok(())
}

/// List the wallets an identity owns
pub fn cmd_wallet_mine(state: &AppState, identity: &str) -> CliResult<()> {
    let wallets = state.manager.wallets_for_owner(identity);

    if wallets.is_empty() {
        println!("📭 {} owns no wallets", identity);
        return Ok(());
    }

    println!("👛 Wallets owned by {} ({}):", identity, wallets.len());
    for wallet in wallets {
        println!(
            "   {} [{}] {} ({})",
            wallet.id,
            wallet.description(),
            wallet.name,
            wallet.balance
        );
    }
    println!(
        "💰 Total balance: {}",
        state.manager.total_balance_for_owner(identity)
    );
    Ok(())
}

/// Rename a wallet
pub fn cmd_wallet_rename(
    state: &mut AppState,
    wallet_id: &str,
    actor: &str,
    name: &str,
) -> CliResult<()> {
    let wallet = state.manager.rename_wallet(wallet_id, actor, name)?;
    state.save()?;

    println!("✅ Wallet {} renamed to \"{}\"", wallet.id, wallet.name);
    Ok(())
}

/// Add an owner to a wallet
pub fn cmd_wallet_add_owner(
    state: &mut AppState,
    wallet_id: &str,
    actor: &str,
    owner: &str,
) -> CliResult<()> {
    let (wallet, changes) = state.manager.add_owner(wallet_id, actor, owner)?;
    state.save()?;

    println!("✅ {} added to {} ({})", owner, wallet.id, wallet.description());
    print_status_changes(&changes);
    Ok(())
}

/// Remove an owner from a wallet
pub fn cmd_wallet_remove_owner(
    state: &mut AppState,
    wallet_id: &str,
    actor: &str,
    owner: &str,
) -> CliResult<()> {
    let (wallet, changes) = state.manager.remove_owner(wallet_id, actor, owner)?;
    state.save()?;

    println!(
        "✅ {} removed from {} ({})",
        owner,
        wallet.id,
        wallet.description()
    );
    print_status_changes(&changes);
    Ok(())
}

/// Change a wallet's approval threshold
pub fn cmd_wallet_threshold(
    state: &mut AppState,
    wallet_id: &str,
    actor: &str,
    threshold: usize,
) -> CliResult<()> {
    let (wallet, changes) = state.manager.change_threshold(wallet_id, actor, threshold)?;
    state.save()?;

    println!("✅ {} now requires {}", wallet.id, wallet.description());
    print_status_changes(&changes);
    Ok(())
}

/// Set a wallet's display balance
pub fn cmd_wallet_fund(state: &mut AppState, wallet_id: &str, balance: Decimal) -> CliResult<()> {
    let wallet = state.manager.set_balance(wallet_id, balance)?;
    state.save()?;

    println!("💰 {} balance set to {}", wallet.id, wallet.balance);
    Ok(())
}

// ============================================================================
// Transactions
// ============================================================================

/// Propose a transaction
pub fn cmd_tx_propose(
    state: &mut AppState,
    wallet_id: &str,
    proposer: &str,
    recipient: &str,
    amount: Decimal,
    description: &str,
) -> CliResult<()> {
    let tx = state
        .manager
        .propose_transaction(wallet_id, proposer, recipient, amount, description)?;
    state.save()?;

    let wallet = state.manager.get_wallet(wallet_id)?;
    println!("📝 Transaction proposed!");
    print_transaction(&tx, wallet);
    Ok(())
}

/// Approve a transaction
pub fn cmd_tx_approve(state: &mut AppState, tx_id: &str, identity: &str) -> CliResult<()> {
    let tx = state.manager.approve(tx_id, identity)?;
    state.save()?;

    let wallet = state.manager.get_wallet(&tx.wallet_id)?;
    println!("✍️  {} approved {}", identity, tx.id);
    println!(
        "   Approvals: {}/{} ({})",
        tx.valid_approvals(wallet),
        wallet.threshold,
        tx.status
    );
    if tx.status == TransactionStatus::Approved {
        println!("   ✅ Quorum reached, ready to execute");
    }
    Ok(())
}

/// Reject a transaction
pub fn cmd_tx_reject(state: &mut AppState, tx_id: &str, identity: &str) -> CliResult<()> {
    let tx = state.manager.reject(tx_id, identity)?;
    state.save()?;

    println!("✋ {} rejected {} ({})", identity, tx.id, tx.status);
    Ok(())
}

/// Execute an approved transaction
pub fn cmd_tx_execute(state: &mut AppState, tx_id: &str, identity: &str) -> CliResult<()> {
    let tx = state.manager.execute(tx_id, identity)?;
    state.save()?;

    println!("🚀 Transaction {} executed!", tx.id);
    println!("   📤 {} to {}", tx.amount, tx.recipient);
    Ok(())
}

/// List a wallet's transactions
pub fn cmd_tx_list(
    state: &AppState,
    wallet_id: &str,
    status: Option<TransactionStatus>,
) -> CliResult<()> {
    let wallet = state.manager.get_wallet(wallet_id)?;
    let txs = state.manager.list_by_wallet(wallet_id, status)?;

    if txs.is_empty() {
        println!("📭 No transactions for {}", wallet_id);
        return Ok(());
    }

    println!("📋 Transactions for {} ({}):", wallet_id, txs.len());
    for tx in txs {
        println!(
            "   {} {:>9} {} to {} [{}/{}]",
            tx.id,
            tx.status,
            tx.amount,
            tx.recipient,
            tx.valid_approvals(wallet),
            wallet.threshold
        );
    }
    Ok(())
}

/// Show transaction details
pub fn cmd_tx_show(state: &AppState, tx_id: &str) -> CliResult<()> {
    let tx = state.manager.get_transaction(tx_id)?;
    let wallet = state.manager.get_wallet(&tx.wallet_id)?;

    println!("📄 Transaction {} on {}", tx.id, wallet.id);
    print_transaction(tx, wallet);
    Ok(())
}

// ============================================================================
// Export / Import
// ============================================================================

/// Export the vault to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.manager, path)?;
    println!("📦 Vault exported to {:?}", path);
    Ok(())
}

/// Import the vault from file
///
/// The file is checked against every wallet and transaction invariant
/// before it replaces the current vault.
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let manager = crate::storage::load_from_file(path)?;

    state.manager = manager;
    state.save()?;

    println!("📥 Vault imported from {:?}", path);
    println!(
        "   {} wallets, {} transactions",
        state.manager.wallet_count(),
        state.manager.transaction_count()
    );
    Ok(())
}
