//! Transaction endpoints

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pgledger_core::{ClientHandle, NewTransaction, Transaction};
use serde::{Deserialize, Serialize};

use super::accounts::IdQuery;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            from_account: t.from_account,
            to_account: t.to_account,
            amount: t.amount,
            id: t.id,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub account: i64,
}

/// GET /tx-by-index?id=
async fn tx_by_index<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Query(q): Query<IdQuery>,
) -> ApiResult<Json<TransactionResponse>> {
    let tx = state.ledger().transaction(q.id).await?;
    Ok(Json(tx.into()))
}

/// GET /tx-history?account= - transfers touching the account, ascending by ID
async fn tx_history<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let rows = state.ledger().transactions_for_account(q.account).await?;
    Ok(Json(rows.into_iter().map(TransactionResponse::from).collect()))
}

/// POST /create-tx
async fn create_tx<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Json(req): Json<NewTransaction>,
) -> ApiResult<Json<TransactionResponse>> {
    let tx = state.ledger().create_transaction(&req).await?;
    tracing::info!(
        id = tx.id,
        from = tx.from_account,
        to = tx.to_account,
        amount = tx.amount,
        "transaction recorded"
    );
    Ok(Json(tx.into()))
}

/// Transaction routes
pub fn router<C: ClientHandle + 'static>() -> Router<AppState<C>> {
    Router::new()
        .route("/tx-by-index", get(tx_by_index::<C>))
        .route("/tx-history", get(tx_history::<C>))
        .route("/create-tx", post(create_tx::<C>))
}
