//! # Tickets
//!
//! A ticket is a grant or reimbursement request filed under a [`Topic`].
//! Requesters file and edit tickets through forms; staff move them through
//! the review lifecycle and record the rating and the amount paid.
//!
//! ## Lifecycle
//!
//! ```text
//! for consideration ──► accepted ──► expenses filed ──► closed
//!         │
//!         └──────────► rejected
//! ```
//!
//! Staff may set any state during review; the arrows show the usual path.
//! A free-text `custom_state` overrides the label shown to visitors.
//!
//! [`Topic`]: crate::Topic

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, ValidationError};
use crate::identity::{ClusterId, TicketId, TopicId, UserId};
use crate::money::Money;
use crate::user::TrackerUser;

/// Maximum length of a ticket summary.
pub const SUMMARY_MAX: usize = 100;

/// Review state of a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketState {
    /// Filed, awaiting a decision.
    #[default]
    #[serde(rename = "for consideration")]
    ForConsideration,
    /// Approved for funding.
    #[serde(rename = "accepted")]
    Accepted,
    /// Declined.
    #[serde(rename = "rejected")]
    Rejected,
    /// Requester has filed the incurred expenses for reimbursement.
    #[serde(rename = "expenses filed")]
    ExpensesFiled,
    /// Settled; no further changes through the forms.
    #[serde(rename = "closed")]
    Closed,
}

impl TicketState {
    /// All states in lifecycle order.
    pub const ALL: [TicketState; 5] = [
        Self::ForConsideration,
        Self::Accepted,
        Self::Rejected,
        Self::ExpensesFiled,
        Self::Closed,
    ];

    /// The wire and storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForConsideration => "for consideration",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::ExpensesFiled => "expenses filed",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownTicketState(s.to_string()))
    }
}

/// The requester-editable part of a ticket, as cleaned by the ticket form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    /// Topic the ticket is filed under.
    pub topic: TopicId,
    /// Date of the event the request concerns.
    pub event_date: Option<NaiveDate>,
    /// One-line summary.
    pub summary: String,
    /// Free-text description.
    pub description: String,
}

/// Staff review outcome applied to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// New lifecycle state.
    pub state: TicketState,
    /// Display override; empty clears it.
    #[serde(default)]
    pub custom_state: String,
    /// Approval rating in percent.
    #[serde(default)]
    pub rating_percentage: Option<i64>,
    /// Amount paid out so far.
    #[serde(default)]
    pub amount_paid: Option<Money>,
}

/// A grant or reimbursement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Identifier.
    pub id: TicketId,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub updated: DateTime<Utc>,
    /// Ordering key for listings: the event date, or the creation date.
    pub sort_date: NaiveDate,
    /// Requesting user, when the requester has an account.
    #[serde(default)]
    pub requested_user: Option<UserId>,
    /// Free-text requester for tickets filed on behalf of someone without an account.
    #[serde(default)]
    pub requested_text: String,
    /// Topic the ticket is filed under.
    pub topic: TopicId,
    /// Date of the event the request concerns.
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    /// One-line summary.
    pub summary: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Review state.
    pub state: TicketState,
    /// Display override for the state.
    #[serde(default)]
    pub custom_state: String,
    /// Approval rating in percent (0-100).
    #[serde(default)]
    pub rating_percentage: Option<u8>,
    /// Amount paid out so far.
    #[serde(default)]
    pub amount_paid: Option<Money>,
    /// Cluster of tickets reviewed together.
    #[serde(default)]
    pub cluster: Option<ClusterId>,
}

impl Ticket {
    /// File a new ticket. It starts in [`TicketState::ForConsideration`].
    pub fn file(draft: TicketDraft, requester: Option<UserId>, now: DateTime<Utc>) -> Self {
        let mut ticket = Self {
            id: TicketId::new(),
            created: now,
            updated: now,
            sort_date: now.date_naive(),
            requested_user: requester,
            requested_text: String::new(),
            topic: draft.topic,
            event_date: None,
            summary: String::new(),
            description: String::new(),
            state: TicketState::ForConsideration,
            custom_state: String::new(),
            rating_percentage: None,
            amount_paid: None,
            cluster: None,
        };
        ticket.apply_draft(draft, now);
        ticket
    }

    /// Overwrite the requester-editable fields.
    pub fn apply_draft(&mut self, draft: TicketDraft, now: DateTime<Utc>) {
        self.topic = draft.topic;
        self.event_date = draft.event_date;
        self.summary = draft.summary;
        self.description = draft.description;
        self.updated = now;
        self.sort_date = self.event_date.unwrap_or_else(|| self.created.date_naive());
    }

    /// Apply a staff review.
    pub fn review(&mut self, review: Review, now: DateTime<Utc>) -> Result<(), TrackerError> {
        let rating = match review.rating_percentage {
            None => None,
            Some(pct) if (0..=100).contains(&pct) => Some(pct as u8),
            Some(pct) => return Err(ValidationError::RatingOutOfRange(pct).into()),
        };
        if review.amount_paid.is_some_and(|m| m.is_negative()) {
            return Err(ValidationError::NegativeAmount("amount_paid").into());
        }

        self.state = review.state;
        self.custom_state = review.custom_state.trim().to_string();
        self.rating_percentage = rating;
        self.amount_paid = review.amount_paid;
        self.updated = now;
        Ok(())
    }

    /// Whether `user` may change this ticket through the requester forms.
    ///
    /// Only the requester may edit, and only until the ticket is closed.
    /// Anonymous visitors never edit.
    pub fn can_edit(&self, user: Option<&TrackerUser>) -> bool {
        match user {
            Some(user) => {
                self.requested_user == Some(user.id) && self.state != TicketState::Closed
            }
            None => false,
        }
    }

    /// The part of `total_expeditures` covered by the approval rating.
    pub fn accepted_expeditures(&self, total_expeditures: Money) -> Money {
        match self.rating_percentage {
            Some(pct) => total_expeditures.percent(pct),
            None => Money::ZERO,
        }
    }

    /// Whether this ticket counts towards accepted-expense totals.
    pub fn counts_as_accepted(&self) -> bool {
        self.state == TicketState::ExpensesFiled && self.rating_percentage.is_some_and(|p| p > 0)
    }

    /// The state label shown to visitors.
    pub fn display_state(&self) -> &str {
        if self.custom_state.is_empty() {
            self.state.as_str()
        } else {
            &self.custom_state
        }
    }

    /// Path of the ticket's detail page.
    pub fn absolute_url(&self) -> String {
        format!("/ticket/{}/", self.id)
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.summary)
    }
}
