//! Topics: the grant categories tickets are filed under.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::TopicId;

/// Maximum length of a topic name.
pub const TOPIC_NAME_MAX: usize = 80;

/// A grant category. Its flags decide whether new tickets may be filed
/// under it and which line-item subforms those tickets carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Identifier.
    pub id: TopicId,
    /// Display name.
    pub name: String,
    /// Name of the grant program funding this topic.
    #[serde(default)]
    pub grant: String,
    /// Long description shown on the topic page.
    #[serde(default)]
    pub description: String,
    /// Help text shown on the ticket form when this topic is selected.
    #[serde(default)]
    pub form_description: String,
    /// Whether new tickets may be filed under this topic.
    #[serde(default)]
    pub open_for_tickets: bool,
    /// Whether tickets under this topic collect media-usage line items.
    #[serde(default)]
    pub ticket_media: bool,
    /// Whether tickets under this topic collect expense line items.
    #[serde(default)]
    pub ticket_expenses: bool,
}

impl Topic {
    /// Create a topic that is open for tickets and collects no line items.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: TopicId::new(),
            name: clean_name(name.into())?,
            grant: String::new(),
            description: String::new(),
            form_description: String::new(),
            open_for_tickets: true,
            ticket_media: false,
            ticket_expenses: false,
        })
    }

    /// Replace the name, under the same rules as [`Topic::new`].
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        self.name = clean_name(name.into())?;
        Ok(())
    }
}

fn clean_name(name: String) -> Result<String, ValidationError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    let len = name.chars().count();
    if len > TOPIC_NAME_MAX {
        return Err(ValidationError::FieldTooLong {
            field: "name",
            max: TOPIC_NAME_MAX,
            actual: len,
        });
    }
    Ok(name)
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
