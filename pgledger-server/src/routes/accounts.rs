//! Account endpoints

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pgledger_core::{Account, ClientHandle, NewAccount};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

/// Account response; a missing email renders as an empty string
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub username: String,
    pub email: String,
    pub id: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            username: a.username,
            email: a.email.unwrap_or_default(),
            id: a.id,
            balance: a.balance,
            created_at: a.created_at,
        }
    }
}

/// Missing parameters fall through to the ledger's own validation.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

/// GET /accounts - all accounts, ascending by ID
async fn list_accounts<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let accounts = state.ledger().accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// GET /account-by-index?id=
async fn account_by_index<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Query(q): Query<IdQuery>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.ledger().account(q.id).await?;
    Ok(Json(account.into()))
}

/// GET /account-by-username?username=
async fn account_by_username<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Query(q): Query<UsernameQuery>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.ledger().account_by_username(&q.username).await?;
    Ok(Json(account.into()))
}

/// GET /account-by-email?email=
async fn account_by_email<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Query(q): Query<EmailQuery>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.ledger().account_by_email(&q.email).await?;
    Ok(Json(account.into()))
}

/// POST /create-account
async fn create_account<C: ClientHandle + 'static>(
    State(state): State<AppState<C>>,
    Json(req): Json<NewAccount>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.ledger().create_account(&req).await?;
    tracing::info!(id = account.id, username = %account.username, "account created");
    Ok(Json(account.into()))
}

/// Account routes
pub fn router<C: ClientHandle + 'static>() -> Router<AppState<C>> {
    Router::new()
        .route("/accounts", get(list_accounts::<C>))
        .route("/account-by-index", get(account_by_index::<C>))
        .route("/account-by-username", get(account_by_username::<C>))
        .route("/account-by-email", get(account_by_email::<C>))
        .route("/create-account", post(create_account::<C>))
}
