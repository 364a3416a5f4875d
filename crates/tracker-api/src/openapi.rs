//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme to the spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "`Bearer {username}:{secret}`; the secret is set via AUTH_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tracker API",
        version = "0.1.0",
        description = "Grant and expense tracker: tickets with media and expense line items, topics, payment transactions and per-user reporting. Pages answer with JSON page contexts.",
        license(name = "MIT")
    ),
    paths(
        // Tickets
        crate::routes::tickets::ticket_detail,
        crate::routes::tickets::new_ticket_form,
        crate::routes::tickets::create_ticket,
        crate::routes::tickets::edit_ticket_form,
        crate::routes::tickets::edit_ticket,
        // Topics
        crate::routes::topics::topic_list,
        crate::routes::topics::topic_detail,
        crate::routes::topics::topics_js,
        // Users
        crate::routes::users::user_list,
        crate::routes::users::user_detail,
        // Transactions
        crate::routes::transactions::transaction_list,
        // Admin
        crate::routes::admin::create_user,
        crate::routes::admin::create_topic,
        crate::routes::admin::update_topic,
        crate::routes::admin::review_ticket,
        crate::routes::admin::create_transaction,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Messages
        crate::messages::Level,
        crate::messages::Notice,
        // Forms
        crate::forms::TicketFormView,
        crate::forms::ticket_form::TicketFormValues,
        crate::forms::ticket_form::TopicOption,
        crate::forms::ticket_form::FormMedia,
        crate::forms::FormsetView,
        crate::forms::formset::ManagementView,
        crate::forms::formset::SubformView,
        // Pages
        crate::routes::TicketView,
        crate::routes::tickets::TicketDetailPage,
        crate::routes::tickets::TicketFormPage,
        crate::routes::tickets::NewTicketParams,
        crate::routes::topics::TopicListPage,
        crate::routes::topics::TopicListEntry,
        crate::routes::topics::TopicDetailPage,
        crate::routes::users::UserListPage,
        crate::routes::users::UserListEntry,
        crate::routes::users::UserDetailPage,
        crate::routes::transactions::TransactionListPage,
        crate::routes::transactions::TransactionEntry,
        // Admin DTOs
        crate::routes::admin::CreateUserRequest,
        crate::routes::admin::CreateTopicRequest,
        crate::routes::admin::UpdateTopicRequest,
        crate::routes::admin::ReviewTicketRequest,
        crate::routes::admin::CreateTransactionRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "tickets", description = "Ticket detail and the create/edit forms with line-item formsets"),
        (name = "topics", description = "Topic pages and the ticket form's topic table"),
        (name = "users", description = "Per-user reporting"),
        (name = "transactions", description = "Payment transactions"),
        (name = "admin", description = "Staff maintenance: users, topics, reviews, transactions"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
