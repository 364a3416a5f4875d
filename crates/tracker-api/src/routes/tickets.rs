//! # Ticket Pages
//!
//! Ticket detail, the creation form and the edit form.
//!
//! Creating a ticket validates only the line-item formsets its topic asks
//! for; when no valid topic was chosen both are validated so every error is
//! shown at once. Editing always validates and saves both. The formset
//! payloads must be well-formed in either case (see
//! [`crate::forms::ManagementError`]).

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracker_core::{
    Expediture, MediaInfo, MediaTotals, Money, Ticket, TicketSummary, Topic, TopicChoices,
    TopicId, TrackerUser,
};
use utoipa::ToSchema;

use super::{catch_comment_posted, parse_ticket_id, rerender, TicketView};
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::extract_form;
use crate::forms::{
    ExpeditureForm, Formset, FormsetChanges, FormsetOptions, FormsetView, MediaForm, TicketForm,
    TicketFormView,
};
use crate::messages::Notice;
use crate::state::AppState;

/// Ticket detail page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketDetailPage {
    pub ticket: TicketView,
    #[schema(value_type = Object)]
    pub topic: Topic,
    #[schema(value_type = Option<Object>)]
    pub requester: Option<TrackerUser>,
    #[schema(value_type = Vec<Object>)]
    pub media: Vec<MediaInfo>,
    #[schema(value_type = Vec<Object>)]
    pub expeditures: Vec<Expediture>,
    #[schema(value_type = Object)]
    pub summary: TicketSummary,
    pub user_can_edit_ticket: bool,
    pub messages: Vec<Notice>,
}

/// Create and edit form page context.
#[derive(Debug, Serialize, ToSchema)]
pub struct TicketFormPage {
    /// The ticket being edited; absent on the creation form.
    pub ticket: Option<TicketView>,
    pub ticketform: TicketFormView,
    pub mediainfo: FormsetView,
    pub expeditures: FormsetView,
}

/// Query parameters of the creation form.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewTicketParams {
    /// Topic to preselect.
    pub topic: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ticket/new/", get(new_ticket_form).post(create_ticket))
        .route("/ticket/:id/", get(ticket_detail))
        .route("/ticket/:id/edit/", get(edit_ticket_form).post(edit_ticket))
}

/// GET /ticket/:id/ — Ticket detail.
#[utoipa::path(
    get,
    path = "/ticket/{id}/",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket detail page", body = TicketDetailPage),
        (status = 303, description = "Comment posted; redirect to the bare path"),
        (status = 404, description = "Unknown ticket", body = crate::error::ErrorBody),
    ),
    tag = "tickets"
)]
pub(crate) async fn ticket_detail(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if let Some(redirect) = catch_comment_posted(&state, caller.as_ref(), &uri) {
        return Ok(redirect);
    }

    let id = parse_ticket_id(&id)?;
    let ticket = state
        .tickets
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("ticket {id} not found")))?;
    let topic = topic_of(&state, &ticket)?;
    let media = state.media_for(ticket.id);
    let expeditures = state.expeditures_for(ticket.id);

    let total: Money = expeditures.iter().map(|e| e.amount).sum();
    let summary = TicketSummary {
        media: MediaTotals::of(&media),
        total_expeditures: total,
        accepted_expeditures: ticket.accepted_expeditures(total),
    };
    let user = caller.map(|c| c.user);

    let page = TicketDetailPage {
        user_can_edit_ticket: ticket.can_edit(user.as_ref()),
        requester: ticket.requested_user.and_then(|u| state.users.get(&u)),
        messages: state.messages.drain(user.as_ref().map(|u| u.id)),
        ticket: ticket.into(),
        topic,
        media,
        expeditures,
        summary,
    };
    Ok(Json(page).into_response())
}

/// GET /ticket/new/ — Blank creation form.
#[utoipa::path(
    get,
    path = "/ticket/new/",
    params(("topic" = Option<String>, Query, description = "Topic to preselect")),
    responses(
        (status = 200, description = "Creation form", body = TicketFormPage),
        (status = 401, description = "Login required", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub(crate) async fn new_ticket_form(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(params): Query<NewTicketParams>,
) -> Json<TicketFormPage> {
    let topics = state.topics.list();
    let initial_topic = params.topic.as_deref().and_then(TopicId::parse);
    let form = TicketForm::blank(
        TopicChoices::for_new_ticket(&topics),
        initial_topic,
        Utc::now().date_naive(),
    );

    Json(TicketFormPage {
        ticket: None,
        ticketform: form.view(),
        mediainfo: Formset::<MediaForm>::unbound(FormsetOptions::CREATE, Vec::new()).view(),
        expeditures: Formset::<ExpeditureForm>::unbound(FormsetOptions::CREATE, Vec::new())
            .view(),
    })
}

/// POST /ticket/new/ — File a ticket.
#[utoipa::path(
    post,
    path = "/ticket/new/",
    request_body(content = String, content_type = "application/x-www-form-urlencoded",
        description = "Ticket form fields plus `mediainfo-*` and `expediture-*` formsets"),
    responses(
        (status = 303, description = "Ticket created; redirect to its detail page"),
        (status = 400, description = "Undecodable body or tampered formset data", body = crate::error::ErrorBody),
        (status = 401, description = "Login required", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed; the form page with errors", body = TicketFormPage),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub(crate) async fn create_ticket(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, AppError> {
    let data = extract_form(body)?;
    let topics = state.topics.list();
    let form = TicketForm::bind(TopicChoices::for_new_ticket(&topics), &data);
    let mut mediainfo = Formset::<MediaForm>::bind(FormsetOptions::CREATE, Vec::new(), &data)?;
    let mut expeditures =
        Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, Vec::new(), &data)?;

    // A valid topic decides which line items apply.
    if let Some(topic) = form.topic() {
        if !topic.ticket_media {
            mediainfo = mediainfo.skip_validation();
        }
        if !topic.ticket_expenses {
            expeditures = expeditures.skip_validation();
        }
    }

    let ready = match (form.draft(), form.topic()) {
        (Some(draft), Some(topic))
            if (!topic.ticket_media || mediainfo.is_valid())
                && (!topic.ticket_expenses || expeditures.is_valid()) =>
        {
            Some((draft.clone(), topic.clone()))
        }
        _ => None,
    };
    let Some((draft, topic)) = ready else {
        tracing::debug!(user = %caller.user.username, "ticket creation failed validation");
        return Ok(rerender(TicketFormPage {
            ticket: None,
            ticketform: form.view(),
            mediainfo: mediainfo.view(),
            expeditures: expeditures.view(),
        }));
    };

    let ticket = Ticket::file(draft, Some(caller.user.id), Utc::now());
    let media_changes = if topic.ticket_media {
        mediainfo.into_changes(ticket.id)
    } else {
        FormsetChanges::default()
    };
    let expense_changes = if topic.ticket_expenses {
        expeditures.into_changes(ticket.id)
    } else {
        FormsetChanges::default()
    };

    state.tickets.insert(ticket.id, ticket.clone());
    apply_line_items(&state, &media_changes, &expense_changes);
    persist(&state, &ticket, &media_changes, &expense_changes).await?;

    tracing::info!(
        ticket_id = %ticket.id,
        user = %caller.user.username,
        topic = %topic.name,
        media = media_changes.created.len(),
        expeditures = expense_changes.created.len(),
        "ticket created"
    );
    state.messages.push(
        Some(caller.user.id),
        Notice::success(format!("Ticket {ticket} created.")),
    );
    Ok(Redirect::to(&ticket.absolute_url()).into_response())
}

/// GET /ticket/:id/edit/ — Prefilled edit form.
#[utoipa::path(
    get,
    path = "/ticket/{id}/edit/",
    params(("id" = String, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Edit form", body = TicketFormPage),
        (status = 401, description = "Login required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller may not edit this ticket", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown ticket", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub(crate) async fn edit_ticket_form(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<TicketFormPage>, AppError> {
    let ticket = editable_ticket(&state, &caller, &id)?;
    let topics = state.topics.list();
    let form = TicketForm::for_ticket(
        TopicChoices::for_existing_ticket(&topics, ticket.topic),
        &ticket,
    );

    Ok(Json(TicketFormPage {
        mediainfo: Formset::<MediaForm>::unbound(FormsetOptions::EDIT, state.media_for(ticket.id))
            .view(),
        expeditures: Formset::<ExpeditureForm>::unbound(
            FormsetOptions::EDIT,
            state.expeditures_for(ticket.id),
        )
        .view(),
        ticketform: form.view(),
        ticket: Some(ticket.into()),
    }))
}

/// POST /ticket/:id/edit/ — Save ticket changes.
#[utoipa::path(
    post,
    path = "/ticket/{id}/edit/",
    params(("id" = String, Path, description = "Ticket id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded",
        description = "Ticket form fields plus `mediainfo-*` and `expediture-*` formsets"),
    responses(
        (status = 303, description = "Ticket saved; redirect to its detail page"),
        (status = 400, description = "Undecodable body or tampered formset data", body = crate::error::ErrorBody),
        (status = 401, description = "Login required", body = crate::error::ErrorBody),
        (status = 403, description = "Caller may not edit this ticket", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown ticket", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed; the form page with errors", body = TicketFormPage),
    ),
    security(("bearer_auth" = [])),
    tag = "tickets"
)]
pub(crate) async fn edit_ticket(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, AppError> {
    let mut ticket = editable_ticket(&state, &caller, &id)?;
    let data = extract_form(body)?;
    let topics = state.topics.list();
    let form = TicketForm::bind(
        TopicChoices::for_existing_ticket(&topics, ticket.topic),
        &data,
    );
    let mediainfo =
        Formset::<MediaForm>::bind(FormsetOptions::EDIT, state.media_for(ticket.id), &data)?;
    let expeditures = Formset::<ExpeditureForm>::bind(
        FormsetOptions::EDIT,
        state.expeditures_for(ticket.id),
        &data,
    )?;

    let draft = match form.draft() {
        Some(draft) if mediainfo.is_valid() && expeditures.is_valid() => draft.clone(),
        _ => {
            tracing::debug!(ticket_id = %ticket.id, "ticket edit failed validation");
            return Ok(rerender(TicketFormPage {
                ticketform: form.view(),
                mediainfo: mediainfo.view(),
                expeditures: expeditures.view(),
                ticket: Some(ticket.into()),
            }));
        }
    };

    ticket.apply_draft(draft, Utc::now());
    let media_changes = mediainfo.into_changes(ticket.id);
    let expense_changes = expeditures.into_changes(ticket.id);

    state.tickets.insert(ticket.id, ticket.clone());
    apply_line_items(&state, &media_changes, &expense_changes);
    persist(&state, &ticket, &media_changes, &expense_changes).await?;

    tracing::info!(
        ticket_id = %ticket.id,
        user = %caller.user.username,
        media_created = media_changes.created.len(),
        media_updated = media_changes.updated.len(),
        media_deleted = media_changes.deleted.len(),
        expeditures_created = expense_changes.created.len(),
        expeditures_updated = expense_changes.updated.len(),
        expeditures_deleted = expense_changes.deleted.len(),
        "ticket saved"
    );
    state.messages.push(
        Some(caller.user.id),
        Notice::success(format!("Ticket {ticket} saved.")),
    );
    Ok(Redirect::to(&ticket.absolute_url()).into_response())
}

// -- Helpers ------------------------------------------------------------------

fn topic_of(state: &AppState, ticket: &Ticket) -> Result<Topic, AppError> {
    state.topics.get(&ticket.topic).ok_or_else(|| {
        tracing::error!(ticket_id = %ticket.id, topic_id = %ticket.topic, "ticket references missing topic");
        AppError::Internal(format!("topic {} of ticket {} missing", ticket.topic, ticket.id))
    })
}

/// Load a ticket for the edit pages: 404 when unknown, 403 when the
/// caller may not edit it.
fn editable_ticket(state: &AppState, caller: &CallerIdentity, raw_id: &str) -> Result<Ticket, AppError> {
    let id = parse_ticket_id(raw_id)?;
    let ticket = state
        .tickets
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("ticket {id} not found")))?;
    if !ticket.can_edit(Some(&caller.user)) {
        tracing::warn!(ticket_id = %id, user = %caller.user.username, "edit refused");
        return Err(AppError::Forbidden("You cannot edit this ticket.".into()));
    }
    Ok(ticket)
}

fn apply_line_items(
    state: &AppState,
    media: &FormsetChanges<MediaInfo>,
    expeditures: &FormsetChanges<Expediture>,
) {
    for item in media.created.iter().chain(&media.updated) {
        state.media.insert(item.id, item.clone());
    }
    for item in &media.deleted {
        state.media.remove(&item.id);
    }
    for item in expeditures.created.iter().chain(&expeditures.updated) {
        state.expeditures.insert(item.id, item.clone());
    }
    for item in &expeditures.deleted {
        state.expeditures.remove(&item.id);
    }
}

/// Write the ticket and its line-item changes through to Postgres.
async fn persist(
    state: &AppState,
    ticket: &Ticket,
    media: &FormsetChanges<MediaInfo>,
    expeditures: &FormsetChanges<Expediture>,
) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::tickets::save_with_items(pool, ticket, media, expeditures).await {
            tracing::error!(ticket_id = %ticket.id, error = %e, "failed to persist ticket to database");
            return Err(AppError::Internal(
                "ticket recorded in-memory but database persist failed".to_string(),
            ));
        }
    }
    Ok(())
}
