//! User list with per-user figures, and user detail.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracker_core::{GroupSummary, Totals, TrackerUser, UserSummary};
use utoipa::ToSchema;

use super::TicketView;
use crate::error::AppError;
use crate::state::AppState;

/// One row of the user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListEntry {
    pub display_name: String,
    pub url: String,
    #[schema(value_type = Object)]
    pub summary: UserSummary,
}

/// User list page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListPage {
    pub user_list: Vec<UserListEntry>,
    /// Figures for tickets filed without a user; null when there are none.
    #[schema(value_type = Option<Object>)]
    pub unassigned: Option<GroupSummary>,
    pub currency: String,
    #[schema(value_type = Object)]
    pub totals: Totals,
}

/// User detail page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailPage {
    #[schema(value_type = Object)]
    pub user_obj: TrackerUser,
    pub display_name: String,
    pub ticket_list: Vec<TicketView>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(user_list))
        .route("/user/:username/", get(user_detail))
}

/// GET /users/ — Every user with ticket, expense and transaction totals.
#[utoipa::path(
    get,
    path = "/users/",
    responses((status = 200, description = "User list page", body = UserListPage)),
    tag = "users"
)]
pub(crate) async fn user_list(State(state): State<AppState>) -> Json<UserListPage> {
    let snapshot = state.snapshot();
    let user_list = snapshot
        .user_summaries()
        .into_iter()
        .map(|summary| UserListEntry {
            display_name: summary.user.display_name(),
            url: summary.user.absolute_url(),
            summary,
        })
        .collect();

    Json(UserListPage {
        user_list,
        unassigned: snapshot.unassigned(),
        currency: state.config.currency.clone(),
        totals: snapshot.totals(),
    })
}

/// GET /user/:username/ — A user and the tickets they filed.
#[utoipa::path(
    get,
    path = "/user/{username}/",
    params(("username" = String, Path, description = "Login name")),
    responses(
        (status = 200, description = "User detail page", body = UserDetailPage),
        (status = 404, description = "Unknown user", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn user_detail(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserDetailPage>, AppError> {
    let user = state
        .user_by_username(&username)
        .ok_or_else(|| AppError::not_found(format!("user {username} not found")))?;
    let ticket_list = state
        .snapshot()
        .tickets_where(|t| t.requested_user == Some(user.id))
        .into_iter()
        .map(TicketView::from)
        .collect();

    Ok(Json(UserDetailPage {
        display_name: user.display_name(),
        user_obj: user,
        ticket_list,
    }))
}
