//! # Staff Endpoints
//!
//! JSON endpoints for the records only staff maintain: users, topics,
//! ticket reviews and payment transactions. Every handler starts with
//! [`require_staff`]; bodies are validated with [`Validate`] before any
//! store is touched.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracker_core::topic::TOPIC_NAME_MAX;
use tracker_core::user::validate_username;
use tracker_core::{Money, Review, Ticket, Topic, TrackerUser, Transaction};
use utoipa::ToSchema;

use super::{parse_ticket_id, parse_topic_id, TicketView};
use crate::auth::{require_staff, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to register a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), String> {
        validate_username(&self.username).map_err(|e| e.to_string())
    }
}

/// Request to create a topic.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTopicRequest {
    pub name: String,
    #[serde(default)]
    pub grant: String,
    #[serde(default)]
    pub description: String,
    /// Help text shown on the ticket form.
    #[serde(default)]
    pub form_description: String,
    #[serde(default = "default_true")]
    pub open_for_tickets: bool,
    #[serde(default)]
    pub ticket_media: bool,
    #[serde(default)]
    pub ticket_expenses: bool,
}

fn default_true() -> bool {
    true
}

fn validate_topic_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.chars().count() > TOPIC_NAME_MAX {
        return Err(format!("name must not exceed {TOPIC_NAME_MAX} characters"));
    }
    Ok(())
}

impl Validate for CreateTopicRequest {
    fn validate(&self) -> Result<(), String> {
        validate_topic_name(&self.name)
    }
}

/// Request to change a topic. Absent fields keep their value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTopicRequest {
    pub name: Option<String>,
    pub grant: Option<String>,
    pub description: Option<String>,
    pub form_description: Option<String>,
    /// `false` closes the topic to new tickets.
    pub open_for_tickets: Option<bool>,
    pub ticket_media: Option<bool>,
    pub ticket_expenses: Option<bool>,
}

impl Validate for UpdateTopicRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) => validate_topic_name(name),
            None => Ok(()),
        }
    }
}

/// Staff review of a ticket.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewTicketRequest {
    /// `for consideration`, `accepted`, `rejected`, `expenses filed` or `closed`.
    #[schema(value_type = String, example = "expenses filed")]
    pub state: tracker_core::TicketState,
    #[serde(default)]
    pub custom_state: String,
    /// 0 to 100.
    pub rating_percentage: Option<i64>,
    #[schema(value_type = Option<String>, example = "1500.00")]
    pub amount_paid: Option<Money>,
}

impl Validate for ReviewTicketRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(pct) = self.rating_percentage {
            if !(0..=100).contains(&pct) {
                return Err(format!("rating_percentage must be between 0 and 100, got {pct}"));
            }
        }
        if self.amount_paid.is_some_and(|m| m.is_negative()) {
            return Err("amount_paid must not be negative".to_string());
        }
        Ok(())
    }
}

/// Request to record a payment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub date: NaiveDate,
    /// Username of the counterparty, when it is a user.
    pub other: Option<String>,
    /// Free-text counterparty.
    #[serde(default)]
    pub other_text: String,
    #[schema(value_type = String, example = "-250.00")]
    pub amount: Money,
    #[serde(default)]
    pub description: String,
}

impl Validate for CreateTransactionRequest {
    fn validate(&self) -> Result<(), String> {
        let named = self.other.as_deref().is_some_and(|o| !o.trim().is_empty());
        if !named && self.other_text.trim().is_empty() {
            return Err("either other or other_text must name the counterparty".to_string());
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", post(create_user))
        .route("/admin/topics", post(create_topic))
        .route("/admin/topics/:id", put(update_topic))
        .route("/admin/tickets/:id/review", post(review_ticket))
        .route("/admin/transactions", post(create_transaction))
}

/// POST /admin/users — Register a user.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 409, description = "Username taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TrackerUser>), AppError> {
    require_staff(&caller)?;
    let req = extract_validated_json(body)?;

    let mut user = TrackerUser::new(req.username)?;
    user.set_name(&req.first_name, &req.last_name)?;
    user.is_staff = req.is_staff;
    if !state
        .users
        .insert_unless(user.id, user.clone(), |u| u.username == user.username)
    {
        return Err(AppError::Conflict(format!(
            "user {} already exists",
            user.username
        )));
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::users::upsert(pool, &user).await {
            tracing::error!(user_id = %user.id, error = %e, "failed to persist user to database");
            return Err(AppError::Internal(
                "user recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(user_id = %user.id, username = %user.username, by = %caller.user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /admin/topics — Create a topic.
#[utoipa::path(
    post,
    path = "/admin/topics",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Topic created"),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 409, description = "Topic name taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub(crate) async fn create_topic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    require_staff(&caller)?;
    let req = extract_validated_json(body)?;

    let mut topic = Topic::new(req.name)?;
    topic.grant = req.grant.trim().to_string();
    topic.description = req.description;
    topic.form_description = req.form_description;
    topic.open_for_tickets = req.open_for_tickets;
    topic.ticket_media = req.ticket_media;
    topic.ticket_expenses = req.ticket_expenses;
    if !state
        .topics
        .insert_unless(topic.id, topic.clone(), |t| t.name == topic.name)
    {
        return Err(AppError::Conflict(format!("topic {} already exists", topic.name)));
    }

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::topics::upsert(pool, &topic).await {
            tracing::error!(topic_id = %topic.id, error = %e, "failed to persist topic to database");
            return Err(AppError::Internal(
                "topic recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(topic_id = %topic.id, name = %topic.name, by = %caller.user.username, "topic created");
    Ok((StatusCode::CREATED, Json(topic)))
}

/// PUT /admin/topics/:id — Change a topic, including closing it to new tickets.
#[utoipa::path(
    put,
    path = "/admin/topics/{id}",
    params(("id" = String, Path, description = "Topic id")),
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Topic updated"),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown topic", body = crate::error::ErrorBody),
        (status = 409, description = "Topic name taken", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub(crate) async fn update_topic(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<UpdateTopicRequest>, JsonRejection>,
) -> Result<Json<Topic>, AppError> {
    require_staff(&caller)?;
    let id = parse_topic_id(&id)?;
    let req = extract_validated_json(body)?;

    let topic = state.topics.with_exclusive(|topics| -> Result<Topic, AppError> {
        let mut topic = topics
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("topic {id} not found")))?;
        if let Some(name) = req.name {
            topic.rename(name)?;
            if topics.values().any(|t| t.id != id && t.name == topic.name) {
                return Err(AppError::Conflict(format!("topic {} already exists", topic.name)));
            }
        }
        if let Some(grant) = req.grant {
            topic.grant = grant.trim().to_string();
        }
        if let Some(description) = req.description {
            topic.description = description;
        }
        if let Some(form_description) = req.form_description {
            topic.form_description = form_description;
        }
        if let Some(open) = req.open_for_tickets {
            topic.open_for_tickets = open;
        }
        if let Some(media) = req.ticket_media {
            topic.ticket_media = media;
        }
        if let Some(expenses) = req.ticket_expenses {
            topic.ticket_expenses = expenses;
        }
        topics.insert(id, topic.clone());
        Ok(topic)
    })?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::topics::upsert(pool, &topic).await {
            tracing::error!(topic_id = %id, error = %e, "failed to persist topic update to database");
            return Err(AppError::Internal(
                "topic recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(
        topic_id = %id,
        open_for_tickets = topic.open_for_tickets,
        by = %caller.user.username,
        "topic updated"
    );
    Ok(Json(topic))
}

/// POST /admin/tickets/:id/review — Set a ticket's state, rating and payment.
#[utoipa::path(
    post,
    path = "/admin/tickets/{id}/review",
    params(("id" = String, Path, description = "Ticket id")),
    request_body = ReviewTicketRequest,
    responses(
        (status = 200, description = "Ticket reviewed", body = TicketView),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown ticket", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub(crate) async fn review_ticket(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<ReviewTicketRequest>, JsonRejection>,
) -> Result<Json<TicketView>, AppError> {
    require_staff(&caller)?;
    let id = parse_ticket_id(&id)?;
    let req = extract_validated_json(body)?;
    let review = Review {
        state: req.state,
        custom_state: req.custom_state,
        rating_percentage: req.rating_percentage,
        amount_paid: req.amount_paid,
    };

    let now = Utc::now();
    let ticket: Ticket = state
        .tickets
        .try_update(&id, |ticket| {
            ticket.review(review, now)?;
            Ok::<_, tracker_core::TrackerError>(ticket.clone())
        })
        .ok_or_else(|| AppError::not_found(format!("ticket {id} not found")))??;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::save(pool, &ticket).await {
            tracing::error!(ticket_id = %id, error = %e, "failed to persist ticket review to database");
            return Err(AppError::Internal(
                "review recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(
        ticket_id = %id,
        state = ticket.state.as_str(),
        rating = ?ticket.rating_percentage,
        by = %caller.user.username,
        "ticket reviewed"
    );
    Ok(Json(ticket.into()))
}

/// POST /admin/transactions — Record a payment.
#[utoipa::path(
    post,
    path = "/admin/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded"),
        (status = 403, description = "Caller is not staff", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or unknown counterparty", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub(crate) async fn create_transaction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    require_staff(&caller)?;
    let req = extract_validated_json(body)?;

    let other = match req.other.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        Some(username) => Some(
            state
                .user_by_username(username)
                .ok_or_else(|| AppError::Validation(format!("unknown user {username}")))?
                .id,
        ),
        None => None,
    };
    let tx = Transaction::new(req.date, other, req.other_text, req.amount, req.description)?;
    state.transactions.insert(tx.id, tx.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::transactions::insert(pool, &tx).await {
            tracing::error!(transaction_id = %tx.id, error = %e, "failed to persist transaction to database");
            return Err(AppError::Internal(
                "transaction recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(transaction_id = %tx.id, amount = %tx.amount, by = %caller.user.username, "transaction recorded");
    Ok((StatusCode::CREATED, Json(tx)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: Option<i64>, paid: Option<i64>) -> ReviewTicketRequest {
        ReviewTicketRequest {
            state: tracker_core::TicketState::Accepted,
            custom_state: String::new(),
            rating_percentage: rating,
            amount_paid: paid.map(Money::from_cents),
        }
    }

    #[test]
    fn review_rating_must_be_a_percentage() {
        assert!(review(Some(0), None).validate().is_ok());
        assert!(review(Some(100), Some(0)).validate().is_ok());
        assert!(review(Some(101), None).validate().is_err());
        assert!(review(Some(-1), None).validate().is_err());
        assert!(review(None, Some(-5)).validate().is_err());
    }

    #[test]
    fn topic_name_is_required() {
        let req: CreateTopicRequest = serde_json::from_str(r#"{"name": "  "}"#).unwrap();
        assert!(req.validate().is_err());
        let req: CreateTopicRequest = serde_json::from_str(r#"{"name": "Photography"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.open_for_tickets);
        assert!(!req.ticket_media);
    }

    #[test]
    fn topic_update_checks_only_a_given_name() {
        let req: UpdateTopicRequest =
            serde_json::from_str(r#"{"open_for_tickets": false}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.open_for_tickets, Some(false));
        assert!(req.ticket_media.is_none());
        let req: UpdateTopicRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn transaction_needs_a_counterparty() {
        let req: CreateTransactionRequest =
            serde_json::from_str(r#"{"date": "2026-03-14", "amount": "10.00"}"#).unwrap();
        assert!(req.validate().is_err());
        let req: CreateTransactionRequest = serde_json::from_str(
            r#"{"date": "2026-03-14", "amount": "-10.00", "other_text": "Print shop"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
