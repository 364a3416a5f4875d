//! Topic pages and the `/topics.js` table the ticket form script reads.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::{header, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracker_core::{GroupSummary, Topic};
use utoipa::ToSchema;

use super::{catch_comment_posted, parse_topic_id, TicketView};
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::messages::Notice;
use crate::state::AppState;

/// A topic with its figures, as listed on `/topics/`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicListEntry {
    #[schema(value_type = Object)]
    pub topic: Topic,
    pub url: String,
    #[schema(value_type = Object)]
    pub summary: GroupSummary,
}

/// Topic list page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicListPage {
    pub topic_list: Vec<TopicListEntry>,
}

/// Topic detail page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopicDetailPage {
    #[schema(value_type = Object)]
    pub topic: Topic,
    pub ticket_list: Vec<TicketView>,
    #[schema(value_type = Object)]
    pub summary: GroupSummary,
    pub messages: Vec<Notice>,
}

/// What the ticket form script needs to know about a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicScriptEntry {
    pub form_description: String,
    pub ticket_media: bool,
    pub ticket_expenses: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/topics/", get(topic_list))
        .route("/topics.js", get(topics_js))
        .route("/topic/:id/", get(topic_detail))
}

/// Location of a topic's detail page.
pub fn topic_url(topic: &Topic) -> String {
    format!("/topic/{}/", topic.id)
}

/// GET /topics/ — All topics, by name.
#[utoipa::path(
    get,
    path = "/topics/",
    responses((status = 200, description = "Topic list page", body = TopicListPage)),
    tag = "topics"
)]
pub(crate) async fn topic_list(State(state): State<AppState>) -> Json<TopicListPage> {
    let snapshot = state.snapshot();
    let mut topics = state.topics.list();
    topics.sort_by(|a, b| a.name.cmp(&b.name));

    let topic_list = topics
        .into_iter()
        .map(|topic| TopicListEntry {
            url: topic_url(&topic),
            summary: snapshot.topic_summary(topic.id),
            topic,
        })
        .collect();
    Json(TopicListPage { topic_list })
}

/// GET /topic/:id/ — A topic and its tickets.
#[utoipa::path(
    get,
    path = "/topic/{id}/",
    params(("id" = String, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic detail page", body = TopicDetailPage),
        (status = 303, description = "Comment posted; redirect to the bare path"),
        (status = 404, description = "Unknown topic", body = crate::error::ErrorBody),
    ),
    tag = "topics"
)]
pub(crate) async fn topic_detail(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if let Some(redirect) = catch_comment_posted(&state, caller.as_ref(), &uri) {
        return Ok(redirect);
    }

    let id = parse_topic_id(&id)?;
    let topic = state
        .topics
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("topic {id} not found")))?;
    let snapshot = state.snapshot();

    let page = TopicDetailPage {
        ticket_list: snapshot
            .tickets_where(|t| t.topic == id)
            .into_iter()
            .map(TicketView::from)
            .collect(),
        summary: snapshot.topic_summary(id),
        messages: state.messages.drain(caller.map(|c| c.user.id)),
        topic,
    };
    Ok(Json(page).into_response())
}

/// GET /topics.js — Per-topic form hints as a script assignment.
#[utoipa::path(
    get,
    path = "/topics.js",
    responses((status = 200, description = "`topics_table = {...};`", content_type = "text/javascript", body = String)),
    tag = "topics"
)]
pub(crate) async fn topics_js(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = render_topics_table(&state.topics.list())?;
    Ok(([(header::CONTENT_TYPE, "text/javascript")], body).into_response())
}

/// `topics_table = {<id>: {...}, ...};`, keyed by topic id.
pub fn render_topics_table(topics: &[Topic]) -> Result<String, AppError> {
    let table: BTreeMap<String, TopicScriptEntry> = topics
        .iter()
        .map(|t| {
            (
                t.id.to_string(),
                TopicScriptEntry {
                    form_description: t.form_description.clone(),
                    ticket_media: t.ticket_media,
                    ticket_expenses: t.ticket_expenses,
                },
            )
        })
        .collect();
    let json = serde_json::to_string(&table)
        .map_err(|e| AppError::Internal(format!("topics table serialization: {e}")))?;
    Ok(format!("topics_table = {json};"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_table_is_a_script_assignment() {
        let mut topic = Topic::new("Photography").unwrap();
        topic.form_description = "Say what you shot.".into();
        topic.ticket_media = true;
        let script = render_topics_table(std::slice::from_ref(&topic)).unwrap();

        let json = script
            .strip_prefix("topics_table = ")
            .and_then(|s| s.strip_suffix(';'))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        let entry = &value[topic.id.to_string()];
        assert_eq!(entry["form_description"], "Say what you shot.");
        assert_eq!(entry["ticket_media"], true);
        assert_eq!(entry["ticket_expenses"], false);
    }

    #[test]
    fn empty_table_is_still_valid_script() {
        assert_eq!(render_topics_table(&[]).unwrap(), "topics_table = {};");
    }
}
