//! Transaction list.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracker_core::{Money, Transaction};
use utoipa::ToSchema;

use crate::state::AppState;

/// A transaction with its counterparty resolved for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionEntry {
    #[schema(value_type = Object)]
    pub transaction: Transaction,
    /// The counterparty's display name, or the free-text counterparty.
    pub other_display: String,
    /// Counterparty's page, when the counterparty is a user.
    pub other_url: Option<String>,
}

/// Transaction list page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListPage {
    pub currency: String,
    pub transaction_list: Vec<TransactionEntry>,
    #[schema(value_type = String, example = "1250.00")]
    pub total: Money,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/transactions/", get(transaction_list))
}

/// GET /transactions/ — Every transaction, newest first, with the total.
#[utoipa::path(
    get,
    path = "/transactions/",
    responses((status = 200, description = "Transaction list page", body = TransactionListPage)),
    tag = "transactions"
)]
pub(crate) async fn transaction_list(State(state): State<AppState>) -> Json<TransactionListPage> {
    let mut transactions = state.transactions.list();
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
    let total = transactions.iter().map(|tx| tx.amount).sum();

    let transaction_list = transactions
        .into_iter()
        .map(|transaction| {
            let user = transaction.other.and_then(|id| state.users.get(&id));
            TransactionEntry {
                other_display: user
                    .as_ref()
                    .map(|u| u.display_name())
                    .unwrap_or_else(|| transaction.other_text.clone()),
                other_url: user.as_ref().map(|u| u.absolute_url()),
                transaction,
            }
        })
        .collect();

    Json(TransactionListPage {
        currency: state.config.currency.clone(),
        transaction_list,
        total,
    })
}
