//! # Route Modules
//!
//! Every page answers with a JSON page context: the data a template would
//! be rendered with. Form pages answer 200 on GET, 422 when a post fails
//! validation (the context then carries the errors) and 303 to the new
//! location on success.
//!
//! | Module | Paths |
//! |---|---|
//! | [`tickets`] | `/ticket/:id/`, `/ticket/new/`, `/ticket/:id/edit/` |
//! | [`topics`] | `/topics/`, `/topic/:id/`, `/topics.js` |
//! | [`users`] | `/users/`, `/user/:username/` |
//! | [`transactions`] | `/transactions/` |
//! | [`admin`] | `/admin/*` (staff only, JSON bodies) |

pub mod admin;
pub mod tickets;
pub mod topics;
pub mod transactions;
pub mod users;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use tracker_core::{Ticket, TicketId, TopicId};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::messages::Notice;
use crate::state::AppState;

/// Notice queued when a visitor returns from posting a comment.
pub const COMMENT_POSTED: &str = "Comment posted, thank you.";

/// A ticket as listed on pages, with its display state and location.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketView {
    #[schema(value_type = Object)]
    pub ticket: Ticket,
    pub display: String,
    pub display_state: String,
    pub url: String,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            display: ticket.to_string(),
            display_state: ticket.display_state().to_string(),
            url: ticket.absolute_url(),
            ticket,
        }
    }
}

/// Comment-posted catcher for detail pages.
///
/// The comment form sends visitors back with a `c` query parameter. Turn it
/// into a notice and redirect to the bare path so a reload does not repeat
/// the notice.
pub(crate) fn catch_comment_posted(
    state: &AppState,
    caller: Option<&CallerIdentity>,
    uri: &Uri,
) -> Option<Response> {
    let query = uri.query()?;
    if !url::form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == "c") {
        return None;
    }
    state
        .messages
        .push(caller.map(|c| c.user.id), Notice::success(COMMENT_POSTED));
    tracing::debug!(path = uri.path(), "comment posted, redirecting to bare path");
    Some(Redirect::to(uri.path()).into_response())
}

/// Answer a form post that failed validation: the page again, with errors.
pub(crate) fn rerender<T: Serialize>(page: T) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response()
}

pub(crate) fn parse_ticket_id(raw: &str) -> Result<TicketId, AppError> {
    TicketId::parse(raw).ok_or_else(|| AppError::not_found(format!("ticket {raw} not found")))
}

pub(crate) fn parse_topic_id(raw: &str) -> Result<TopicId, AppError> {
    TopicId::parse(raw).ok_or_else(|| AppError::not_found(format!("topic {raw} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::TrackerUser;

    #[test]
    fn catcher_ignores_requests_without_c() {
        let state = AppState::new();
        let uri: Uri = "/ticket/1/?page=2".parse().unwrap();
        assert!(catch_comment_posted(&state, None, &uri).is_none());
        let bare: Uri = "/ticket/1/".parse().unwrap();
        assert!(catch_comment_posted(&state, None, &bare).is_none());
    }

    #[test]
    fn catcher_redirects_and_queues_notice() {
        let state = AppState::new();
        let caller = CallerIdentity {
            user: TrackerUser::new("jana").unwrap(),
        };
        let uri: Uri = "/topic/abc/?c=17".parse().unwrap();
        let response = catch_comment_posted(&state, Some(&caller), &uri).unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/topic/abc/");
        let notices = state.messages.drain(Some(caller.user.id));
        assert_eq!(notices, vec![Notice::success(COMMENT_POSTED)]);
    }

    #[test]
    fn bad_ids_are_not_found() {
        assert!(matches!(parse_ticket_id("42"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_topic_id("x"), Err(AppError::NotFound(_))));
    }
}
