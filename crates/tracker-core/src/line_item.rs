//! Line items owned by a ticket: media usage and expenses.
//!
//! Both kinds belong to exactly one ticket and are removed with it.

use serde::{Deserialize, Serialize};

use crate::identity::{ExpeditureId, MediaInfoId, TicketId};
use crate::money::Money;

/// Maximum length of a line-item description.
pub const DESCRIPTION_MAX: usize = 255;

/// Maximum length of a media URL.
pub const URL_MAX: usize = 255;

/// Total significant digits an expense amount may have.
pub const AMOUNT_MAX_DIGITS: usize = 8;

/// Media produced or used under a ticket (photos uploaded, articles written).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Identifier.
    pub id: MediaInfoId,
    /// Owning ticket.
    pub ticket: TicketId,
    /// What the media is.
    pub description: String,
    /// Where it can be found.
    #[serde(default)]
    pub url: Option<String>,
    /// How many items (photos, pages) the entry covers.
    #[serde(default)]
    pub count: Option<u32>,
}

impl MediaInfo {
    /// Create a media entry for `ticket`.
    pub fn new(
        ticket: TicketId,
        description: impl Into<String>,
        url: Option<String>,
        count: Option<u32>,
    ) -> Self {
        Self {
            id: MediaInfoId::new(),
            ticket,
            description: description.into(),
            url,
            count,
        }
    }
}

/// An expense incurred under a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expediture {
    /// Identifier.
    pub id: ExpeditureId,
    /// Owning ticket.
    pub ticket: TicketId,
    /// What was paid for.
    pub description: String,
    /// How much.
    pub amount: Money,
}

impl Expediture {
    /// Create an expense entry for `ticket`.
    pub fn new(ticket: TicketId, description: impl Into<String>, amount: Money) -> Self {
        Self {
            id: ExpeditureId::new(),
            ticket,
            description: description.into(),
            amount,
        }
    }
}
