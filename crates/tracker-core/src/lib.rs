#![deny(missing_docs)]

//! # tracker-core — Domain Records for the Grant Tracker
//!
//! Users submit tickets tied to topics, attach media-usage and expense line
//! items, and administrators review tickets and record payment transactions.
//! This crate owns the records and the rules that act on them. It performs
//! no I/O; the API crate keeps the records in stores and persists them.
//!
//! ## Design Principles
//!
//! 1. **Newtype identifiers.** A [`TicketId`] cannot be passed where a
//!    [`TopicId`] is expected.
//!
//! 2. **Fixed-point money.** [`Money`] counts cents in an `i64`. Floats never
//!    carry amounts, and sums saturate instead of wrapping.
//!
//! 3. **Rules live next to the record they guard.** Edit permission is
//!    [`Ticket::can_edit`], topic selection is [`TopicChoices`], aggregate
//!    figures come from [`report::Snapshot`].

pub mod choices;
pub mod error;
pub mod identity;
pub mod line_item;
pub mod money;
pub mod report;
pub mod ticket;
pub mod topic;
pub mod transaction;
pub mod user;

pub use choices::TopicChoices;
pub use error::{AmountError, TrackerError, ValidationError};
pub use identity::{
    ClusterId, ExpeditureId, MediaInfoId, TicketId, TopicId, TransactionId, UserId,
};
pub use line_item::{Expediture, MediaInfo};
pub use money::Money;
pub use report::{GroupSummary, MediaTotals, Snapshot, TicketSummary, Totals, UserSummary};
pub use ticket::{Review, Ticket, TicketDraft, TicketState};
pub use topic::Topic;
pub use transaction::Transaction;
pub use user::TrackerUser;
