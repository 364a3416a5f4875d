//! The ticket form: topic, event date, summary and description.
//!
//! The topic field only accepts topics from the [`TopicChoices`] the form
//! was built with, so the same form serves creation (open topics only) and
//! editing (open topics plus the ticket's current one).

use chrono::NaiveDate;
use serde::Serialize;
use tracker_core::ticket::SUMMARY_MAX;
use tracker_core::{Ticket, TicketDraft, Topic, TopicChoices, TopicId};
use utoipa::ToSchema;

use super::{clean_optional_date, clean_text, FieldErrors, FormData, INVALID_CHOICE, REQUIRED};

/// Scripts the rendered form needs; `/topics.js` feeds the per-topic help
/// text and line-item toggles.
pub const FORM_MEDIA_JS: [&str; 2] = ["ticketform.js", "/topics.js"];

/// Raw field values as shown in the form inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TicketFormValues {
    pub topic: String,
    pub event_date: String,
    pub summary: String,
    pub description: String,
}

/// One option of the topic select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TopicOption {
    #[schema(value_type = String, format = Uuid)]
    pub id: TopicId,
    pub name: String,
}

/// Script and stylesheet references of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormMedia {
    pub js: Vec<String>,
}

/// Render context of the ticket form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketFormView {
    pub values: TicketFormValues,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
    pub topic_choices: Vec<TopicOption>,
    pub form_media: FormMedia,
}

/// A ticket form, unbound (initial values) or bound to submitted data.
#[derive(Debug, Clone)]
pub struct TicketForm {
    choices: TopicChoices,
    values: TicketFormValues,
    errors: FieldErrors,
    topic: Option<TopicId>,
    draft: Option<TicketDraft>,
}

impl TicketForm {
    /// Blank creation form. `event_date` starts at `today`; `initial_topic`
    /// is preselected when it is a valid choice.
    pub fn blank(choices: TopicChoices, initial_topic: Option<TopicId>, today: NaiveDate) -> Self {
        let topic = initial_topic
            .filter(|id| choices.contains(*id))
            .map(|id| id.to_string())
            .unwrap_or_default();
        Self {
            values: TicketFormValues {
                topic,
                event_date: today.format("%Y-%m-%d").to_string(),
                ..TicketFormValues::default()
            },
            choices,
            errors: FieldErrors::default(),
            topic: None,
            draft: None,
        }
    }

    /// Edit form prefilled from `ticket`.
    pub fn for_ticket(choices: TopicChoices, ticket: &Ticket) -> Self {
        Self {
            values: TicketFormValues {
                topic: ticket.topic.to_string(),
                event_date: ticket
                    .event_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                summary: ticket.summary.clone(),
                description: ticket.description.clone(),
            },
            choices,
            errors: FieldErrors::default(),
            topic: None,
            draft: None,
        }
    }

    /// Bind submitted data and clean every field.
    pub fn bind(choices: TopicChoices, data: &FormData) -> Self {
        let values = TicketFormValues {
            topic: data.value("topic").to_string(),
            event_date: data.value("event_date").to_string(),
            summary: data.value("summary").to_string(),
            description: data.value("description").to_string(),
        };
        let mut errors = FieldErrors::default();

        let topic = if values.topic.is_empty() {
            errors.add("topic", REQUIRED);
            None
        } else {
            match TopicId::parse(&values.topic).filter(|id| choices.contains(*id)) {
                Some(id) => Some(id),
                None => {
                    errors.add("topic", INVALID_CHOICE);
                    None
                }
            }
        };
        let event_date = clean_optional_date(&values.event_date, "event_date", &mut errors);
        let summary = clean_text(&values.summary, "summary", true, Some(SUMMARY_MAX), &mut errors);
        let description = clean_text(&values.description, "description", false, None, &mut errors);

        let draft = match (topic, event_date, summary, description) {
            (Some(topic), Ok(event_date), Some(summary), Some(description)) => Some(TicketDraft {
                topic,
                event_date,
                summary,
                description,
            }),
            _ => None,
        };

        Self {
            choices,
            values,
            errors,
            topic,
            draft,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.draft.is_some()
    }

    /// The selected topic, when the topic field itself validated.
    /// Available even if other fields failed.
    pub fn topic(&self) -> Option<&Topic> {
        self.topic.and_then(|id| self.choices.get(id))
    }

    /// Cleaned data of a valid form.
    pub fn draft(&self) -> Option<&TicketDraft> {
        self.draft.as_ref()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn view(&self) -> TicketFormView {
        TicketFormView {
            values: self.values.clone(),
            errors: self.errors.clone(),
            topic_choices: self
                .choices
                .iter()
                .map(|t| TopicOption {
                    id: t.id,
                    name: t.name.clone(),
                })
                .collect(),
            form_media: FormMedia {
                js: FORM_MEDIA_JS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}
