//! REST API handlers for vault operations

use crate::multisig::{
    ErrorKind, MultisigError, MultisigManager, StatusChange, Transaction, TransactionStatus,
    Wallet, WalletSummary,
};
use crate::storage::{Storage, StorageError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
///
/// The write guard on `manager` is held for the whole read-modify-write
/// of every mutating handler, including the save. Mutations run on a copy
/// that replaces the live vault only after it has been saved.
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<RwLock<MultisigManager>>,
    pub storage: Arc<Storage>,
}

impl ApiState {
    pub fn new(manager: MultisigManager, storage: Storage) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
            storage: Arc::new(storage),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize, Debug)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

type ApiFailure = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<Json<T>, ApiFailure>;

#[derive(Clone, Debug, Serialize)]
pub struct WalletInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub owners: Vec<String>,
    pub threshold: usize,
    pub description: String,
    pub balance: Decimal,
    pub created_at: String,
}

impl From<&Wallet> for WalletInfo {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id.clone(),
            name: wallet.name.clone(),
            address: wallet.address.clone(),
            owners: wallet.owners.clone(),
            threshold: wallet.threshold,
            description: wallet.description(),
            balance: wallet.balance,
            created_at: wallet.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TransactionInfo {
    pub id: String,
    pub wallet_id: String,
    pub recipient: String,
    pub amount: Decimal,
    pub description: String,
    pub proposer: String,
    pub approvals: Vec<String>,
    pub rejections: Vec<String>,
    pub approvals_required: usize,
    pub approvals_remaining: usize,
    pub can_execute: bool,
    pub status: TransactionStatus,
    pub created_at: String,
    pub executed_at: Option<String>,
}

impl TransactionInfo {
    fn new(tx: &Transaction, wallet: &Wallet) -> Self {
        Self {
            id: tx.id.clone(),
            wallet_id: tx.wallet_id.clone(),
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            description: tx.description.clone(),
            proposer: tx.proposer.clone(),
            approvals: tx.approvals.iter().cloned().collect(),
            rejections: tx.rejections.iter().cloned().collect(),
            approvals_required: wallet.threshold,
            approvals_remaining: tx.approvals_remaining(wallet),
            can_execute: tx.can_execute(wallet),
            status: tx.status,
            created_at: tx.created_at.to_rfc3339(),
            executed_at: tx.executed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Wallet after an owner-set or threshold change, with any transactions
/// whose status moved as a result
#[derive(Debug, Serialize)]
pub struct WalletChangeResponse {
    pub wallet: WalletInfo,
    pub status_changes: Vec<StatusChange>,
}

#[derive(Debug, Serialize)]
pub struct OwnerWalletsResponse {
    pub identity: String,
    pub wallets: Vec<WalletInfo>,
    pub total_balance: Decimal,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateWalletRequest {
    pub name: String,
    pub owners: Vec<String>,
    pub threshold: usize,
}

#[derive(Deserialize)]
pub struct RenameWalletRequest {
    pub actor: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct OwnerRequest {
    pub actor: String,
    pub owner: String,
}

#[derive(Deserialize)]
pub struct ThresholdRequest {
    pub actor: String,
    pub threshold: usize,
}

#[derive(Deserialize)]
pub struct BalanceRequest {
    pub balance: Decimal,
}

#[derive(Deserialize)]
pub struct ProposeTransactionRequest {
    pub proposer: String,
    pub recipient: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

/// Identity approving, rejecting or executing a transaction
#[derive(Deserialize)]
pub struct ActionRequest {
    pub identity: String,
}

#[derive(Deserialize, Default)]
pub struct TransactionFilter {
    pub status: Option<String>,
    /// Only open transactions this identity has neither approved nor
    /// rejected
    pub awaiting: Option<String>,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotAnOwner => StatusCode::FORBIDDEN,
        ErrorKind::DuplicateAction => StatusCode::CONFLICT,
        ErrorKind::TerminalState => StatusCode::CONFLICT,
        ErrorKind::QuorumNotMet => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn engine_error(e: MultisigError) -> ApiFailure {
    let kind = e.kind();
    (
        status_for(kind),
        Json(ApiError {
            error: e.to_string(),
            kind: Some(kind),
        }),
    )
}

fn storage_error(e: StorageError) -> ApiFailure {
    log::error!("Failed to persist vault: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: format!("Failed to save vault: {}", e),
            kind: None,
        }),
    )
}

/// Save `next` and only then install it as the live vault; a failed save
/// leaves `manager` untouched
fn commit(
    state: &ApiState,
    manager: &mut MultisigManager,
    next: MultisigManager,
) -> Result<(), ApiFailure> {
    state.storage.save(&next).map_err(storage_error)?;
    *manager = next;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/wallets - List all wallets
pub async fn list_wallets(State(state): State<ApiState>) -> Json<Vec<WalletInfo>> {
    let manager = state.manager.read().await;
    Json(manager.list_wallets().into_iter().map(WalletInfo::from).collect())
}

/// POST /api/wallets - Create a wallet
pub async fn create_wallet(
    State(state): State<ApiState>,
    Json(req): Json<CreateWalletRequest>,
) -> ApiResult<WalletInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let wallet = next
        .create_wallet(&req.name, req.owners, req.threshold)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletInfo::from(&wallet)))
}

/// GET /api/wallets/{id} - Get wallet details; `id` may also be the
/// wallet's `0x` address
pub async fn get_wallet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<WalletInfo> {
    let manager = state.manager.read().await;
    let wallet = manager.find_wallet(&id).map_err(engine_error)?;
    Ok(Json(WalletInfo::from(wallet)))
}

/// GET /api/wallets/{id}/summary - Wallet overview with per-status counts
pub async fn get_wallet_summary(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<WalletSummary> {
    let manager = state.manager.read().await;
    manager.wallet_summary(&id).map(Json).map_err(engine_error)
}

/// GET /api/owners/{identity}/wallets - Wallets owned by an identity
pub async fn list_owner_wallets(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
) -> Json<OwnerWalletsResponse> {
    let manager = state.manager.read().await;
    let wallets = manager
        .wallets_for_owner(&identity)
        .into_iter()
        .map(WalletInfo::from)
        .collect();
    let total_balance = manager.total_balance_for_owner(&identity);

    Json(OwnerWalletsResponse {
        identity,
        wallets,
        total_balance,
    })
}

/// POST /api/wallets/{id}/rename - Rename a wallet
pub async fn rename_wallet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<RenameWalletRequest>,
) -> ApiResult<WalletInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let wallet = next
        .rename_wallet(&id, &req.actor, &req.name)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletInfo::from(&wallet)))
}

/// POST /api/wallets/{id}/owners - Add an owner
pub async fn add_owner(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<OwnerRequest>,
) -> ApiResult<WalletChangeResponse> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let (wallet, status_changes) = next
        .add_owner(&id, &req.actor, &req.owner)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletChangeResponse {
        wallet: WalletInfo::from(&wallet),
        status_changes,
    }))
}

/// POST /api/wallets/{id}/owners/remove - Remove an owner
pub async fn remove_owner(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<OwnerRequest>,
) -> ApiResult<WalletChangeResponse> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let (wallet, status_changes) = next
        .remove_owner(&id, &req.actor, &req.owner)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletChangeResponse {
        wallet: WalletInfo::from(&wallet),
        status_changes,
    }))
}

/// POST /api/wallets/{id}/threshold - Change the approval threshold
pub async fn change_threshold(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ThresholdRequest>,
) -> ApiResult<WalletChangeResponse> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let (wallet, status_changes) = next
        .change_threshold(&id, &req.actor, req.threshold)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletChangeResponse {
        wallet: WalletInfo::from(&wallet),
        status_changes,
    }))
}

/// POST /api/wallets/{id}/balance - Update the display balance
pub async fn set_balance(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<BalanceRequest>,
) -> ApiResult<WalletInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let wallet = next
        .set_balance(&id, req.balance)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    Ok(Json(WalletInfo::from(&wallet)))
}

/// GET /api/wallets/{id}/transactions - List a wallet's transactions
pub async fn list_wallet_transactions(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Vec<TransactionInfo>> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<TransactionStatus>)
        .transpose()
        .map_err(engine_error)?;

    let manager = state.manager.read().await;
    let wallet = manager.get_wallet(&id).map_err(engine_error)?;
    let txs = manager.list_by_wallet(&id, status).map_err(engine_error)?;

    Ok(Json(
        txs.into_iter()
            .filter(|tx| match filter.awaiting.as_deref() {
                Some(identity) => !tx.status.is_terminal() && !tx.has_acted(identity),
                None => true,
            })
            .map(|tx| TransactionInfo::new(tx, wallet))
            .collect(),
    ))
}

/// POST /api/wallets/{id}/transactions - Propose a transaction
pub async fn propose_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ProposeTransactionRequest>,
) -> ApiResult<TransactionInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let tx = next
        .propose_transaction(&id, &req.proposer, &req.recipient, req.amount, &req.description)
        .map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    transaction_response(&manager, &tx)
}

/// GET /api/transactions/{id} - Get transaction details
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<TransactionInfo> {
    let manager = state.manager.read().await;
    let tx = manager.get_transaction(&id).map_err(engine_error)?;
    transaction_response(&manager, tx)
}

/// POST /api/transactions/{id}/approve - Approve a transaction
pub async fn approve_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<TransactionInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let tx = next.approve(&id, &req.identity).map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    transaction_response(&manager, &tx)
}

/// POST /api/transactions/{id}/reject - Reject a transaction
pub async fn reject_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<TransactionInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let tx = next.reject(&id, &req.identity).map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    transaction_response(&manager, &tx)
}

/// POST /api/transactions/{id}/execute - Execute an approved transaction
pub async fn execute_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> ApiResult<TransactionInfo> {
    let mut manager = state.manager.write().await;
    let mut next = manager.clone();
    let tx = next.execute(&id, &req.identity).map_err(engine_error)?;
    commit(&state, &mut manager, next)?;

    transaction_response(&manager, &tx)
}

fn transaction_response(manager: &MultisigManager, tx: &Transaction) -> ApiResult<TransactionInfo> {
    let wallet = manager.get_wallet(&tx.wallet_id).map_err(engine_error)?;
    Ok(Json(TransactionInfo::new(tx, wallet)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageConfig;

    fn test_state() -> (ApiState, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        (ApiState::new(MultisigManager::new(), storage), temp_dir)
    }

    fn owners(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    async fn create(state: &ApiState, threshold: usize) -> WalletInfo {
        create_wallet(
            State(state.clone()),
            Json(CreateWalletRequest {
                name: "Treasury".to_string(),
                owners: owners(&["A", "B", "C"]),
                threshold,
            }),
        )
        .await
        .unwrap()
        .0
    }

    async fn propose(state: &ApiState, wallet_id: &str) -> TransactionInfo {
        propose_transaction(
            State(state.clone()),
            Path(wallet_id.to_string()),
            Json(ProposeTransactionRequest {
                proposer: "A".to_string(),
                recipient: "0xrecipient".to_string(),
                amount: Decimal::new(5, 0),
                description: "Audit".to_string(),
            }),
        )
        .await
        .unwrap()
        .0
    }

    fn action(identity: &str) -> Json<ActionRequest> {
        Json(ActionRequest {
            identity: identity.to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_and_list_wallets() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;

        assert_eq!(wallet.id, "wallet-1");
        assert_eq!(wallet.description, "2-of-3");
        assert!(wallet.address.starts_with("0x"));

        let listed = list_wallets(State(state.clone())).await.0;
        assert_eq!(listed.len(), 1);

        let fetched = get_wallet(State(state.clone()), Path("wallet-1".to_string()))
            .await
            .unwrap();
        assert_eq!(fetched.0.address, wallet.address);

        // Mutation was saved
        assert!(state.storage.exists());
    }

    #[tokio::test]
    async fn test_invalid_wallet_is_bad_request() {
        let (state, _dir) = test_state();
        let err = create_wallet(
            State(state.clone()),
            Json(CreateWalletRequest {
                name: "Solo".to_string(),
                owners: owners(&["A"]),
                threshold: 2,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1 .0.kind, Some(ErrorKind::Validation));
        assert!(!state.storage.exists());
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_not_found() {
        let (state, _dir) = test_state();
        let err = get_wallet(State(state), Path("wallet-9".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_approval_flow_and_status_codes() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;
        let tx = propose(&state, &wallet.id).await;
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.approvals_remaining, 1);

        // Executing early fails with 422
        let err = execute_transaction(State(state.clone()), Path(tx.id.clone()), action("A"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        // Outsider gets 403
        let err = approve_transaction(State(state.clone()), Path(tx.id.clone()), action("D"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);

        // Duplicate approval gets 409
        let err = approve_transaction(State(state.clone()), Path(tx.id.clone()), action("A"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1 .0.kind, Some(ErrorKind::DuplicateAction));

        let approved = approve_transaction(State(state.clone()), Path(tx.id.clone()), action("B"))
            .await
            .unwrap()
            .0;
        assert_eq!(approved.status, TransactionStatus::Approved);
        assert!(approved.can_execute);

        let executed = execute_transaction(State(state.clone()), Path(tx.id.clone()), action("C"))
            .await
            .unwrap()
            .0;
        assert_eq!(executed.status, TransactionStatus::Executed);
        assert!(executed.executed_at.is_some());

        // Terminal state gets 409
        let err = reject_transaction(State(state.clone()), Path(tx.id.clone()), action("C"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1 .0.kind, Some(ErrorKind::TerminalState));

        // Saved snapshot reflects the execution
        let saved = state.storage.load().unwrap();
        assert_eq!(
            saved.get_transaction(&tx.id).unwrap().status,
            TransactionStatus::Executed
        );
    }

    #[tokio::test]
    async fn test_list_transactions_with_filter() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;
        let t1 = propose(&state, &wallet.id).await;
        propose(&state, &wallet.id).await;
        let rejected = reject_transaction(State(state.clone()), Path(t1.id.clone()), action("B"))
            .await
            .unwrap()
            .0;
        assert_eq!(rejected.status, TransactionStatus::Rejected);

        let all = list_wallet_transactions(
            State(state.clone()),
            Path(wallet.id.clone()),
            Query(TransactionFilter::default()),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(all.len(), 2);

        let rejected = list_wallet_transactions(
            State(state.clone()),
            Path(wallet.id.clone()),
            Query(TransactionFilter {
                status: Some("rejected".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, t1.id);

        let err = list_wallet_transactions(
            State(state.clone()),
            Path(wallet.id.clone()),
            Query(TransactionFilter {
                status: Some("bogus".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let summary = get_wallet_summary(State(state.clone()), Path(wallet.id.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(summary.transactions.pending, 1);
        assert_eq!(summary.transactions.rejected, 1);
    }

    #[tokio::test]
    async fn test_owner_changes_report_status_moves() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;
        let tx = propose(&state, &wallet.id).await;

        let response = change_threshold(
            State(state.clone()),
            Path(wallet.id.clone()),
            Json(ThresholdRequest {
                actor: "B".to_string(),
                threshold: 1,
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(response.wallet.threshold, 1);
        assert_eq!(response.status_changes.len(), 1);
        assert_eq!(response.status_changes[0].tx_id, tx.id);
        assert_eq!(response.status_changes[0].to, TransactionStatus::Approved);

        let err = add_owner(
            State(state.clone()),
            Path(wallet.id.clone()),
            Json(OwnerRequest {
                actor: "Z".to_string(),
                owner: "D".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_owner_wallets_and_balance() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;
        let funded = set_balance(
            State(state.clone()),
            Path(wallet.id.clone()),
            Json(BalanceRequest {
                balance: Decimal::new(1575, 2),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(funded.balance, Decimal::new(1575, 2));

        let mine = list_owner_wallets(State(state.clone()), Path("B".to_string()))
            .await
            .0;
        assert_eq!(mine.wallets.len(), 1);
        assert_eq!(mine.total_balance, Decimal::new(1575, 2));

        let none = list_owner_wallets(State(state.clone()), Path("Z".to_string()))
            .await
            .0;
        assert!(none.wallets.is_empty());
        assert_eq!(none.total_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_vault_unchanged() {
        let (state, dir) = test_state();
        let wallet = create_wallet(
            State(state.clone()),
            Json(CreateWalletRequest {
                name: "Solo".to_string(),
                owners: owners(&["A"]),
                threshold: 1,
            }),
        )
        .await
        .unwrap()
        .0;
        let tx = propose(&state, &wallet.id).await;
        assert_eq!(tx.status, TransactionStatus::Approved);

        // Saves now fail
        std::fs::remove_dir_all(dir.path()).unwrap();

        let err = execute_transaction(State(state.clone()), Path(tx.id.clone()), action("A"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.1 .0.kind, None);

        let err = add_owner(
            State(state.clone()),
            Path(wallet.id.clone()),
            Json(OwnerRequest {
                actor: "A".to_string(),
                owner: "B".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);

        let after = get_transaction(State(state.clone()), Path(tx.id.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(after.status, TransactionStatus::Approved);
        assert!(after.executed_at.is_none());

        let wallet = get_wallet(State(state.clone()), Path(wallet.id.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(wallet.owners, vec!["A"]);

        // Once storage is back the same call goes through
        std::fs::create_dir_all(dir.path()).unwrap();
        let executed = execute_transaction(State(state.clone()), Path(tx.id.clone()), action("A"))
            .await
            .unwrap()
            .0;
        assert_eq!(executed.status, TransactionStatus::Executed);
    }

    #[tokio::test]
    async fn test_get_wallet_by_address() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 2).await;

        let fetched = get_wallet(State(state.clone()), Path(wallet.address.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(fetched.id, wallet.id);

        let err = get_wallet(State(state.clone()), Path("0xdeadbeef".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_transactions_awaiting_identity() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 3).await;
        let t1 = propose(&state, &wallet.id).await;
        let t2 = propose(&state, &wallet.id).await;
        let t3 = propose(&state, &wallet.id).await;

        let approved = approve_transaction(State(state.clone()), Path(t1.id.clone()), action("B"))
            .await
            .unwrap()
            .0;
        assert_eq!(approved.status, TransactionStatus::Pending);
        let vetoed = reject_transaction(State(state.clone()), Path(t3.id.clone()), action("C"))
            .await
            .unwrap()
            .0;
        assert_eq!(vetoed.status, TransactionStatus::Rejected);

        let awaiting = |identity: &str| TransactionFilter {
            awaiting: Some(identity.to_string()),
            ..Default::default()
        };

        let for_b = list_wallet_transactions(
            State(state.clone()),
            Path(wallet.id.clone()),
            Query(awaiting("B")),
        )
        .await
        .unwrap()
        .0;
        let ids: Vec<&str> = for_b.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![t2.id.as_str()]);

        // Proposer already approved everything
        let for_a = list_wallet_transactions(
            State(state.clone()),
            Path(wallet.id.clone()),
            Query(awaiting("A")),
        )
        .await
        .unwrap()
        .0;
        assert!(for_a.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approvals_are_serialised() {
        let (state, _dir) = test_state();
        let wallet = create(&state, 3).await;
        let tx = propose(&state, &wallet.id).await;

        // Two distinct owners plus a duplicate of one of them
        let mut handles = Vec::new();
        for identity in ["B", "C", "B"] {
            let state = state.clone();
            let tx_id = tx.id.clone();
            handles.push(tokio::spawn(async move {
                approve_transaction(State(state), Path(tx_id), action(identity)).await
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err((status, _)) => {
                    assert_eq!(status, StatusCode::CONFLICT);
                    conflicts += 1;
                }
            }
        }
        assert_eq!(successes, 2);
        assert_eq!(conflicts, 1);

        let final_tx = get_transaction(State(state.clone()), Path(tx.id.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(final_tx.approvals, vec!["A", "B", "C"]);
        assert_eq!(final_tx.status, TransactionStatus::Approved);
    }
}
