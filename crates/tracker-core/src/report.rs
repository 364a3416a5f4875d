//! # Aggregate Reporting
//!
//! Totals for the user list, the topic pages and the ticket detail page.
//! Every figure is computed from a [`Snapshot`]: a copy of the records,
//! taken one store at a time. Records written between those copies may be
//! seen only in part.
//!
//! Accepted expenses only count for tickets in `expenses filed` with a
//! non-zero rating; see [`Ticket::counts_as_accepted`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::identity::{TicketId, TopicId, UserId};
use crate::line_item::{Expediture, MediaInfo};
use crate::money::Money;
use crate::ticket::Ticket;
use crate::transaction::Transaction;
use crate::user::TrackerUser;

/// Media line-item totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MediaTotals {
    /// Number of media entries.
    pub objects: usize,
    /// Sum of the entries' counts; entries without a count add nothing.
    pub media: u64,
}

impl MediaTotals {
    /// Total over a set of media entries.
    pub fn of<'a>(items: impl IntoIterator<Item = &'a MediaInfo>) -> Self {
        items.into_iter().fold(Self::default(), |acc, m| Self {
            objects: acc.objects + 1,
            media: acc.media + u64::from(m.count.unwrap_or(0)),
        })
    }
}

/// Figures for a single ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    /// Media totals.
    pub media: MediaTotals,
    /// Sum of all expenses.
    pub total_expeditures: Money,
    /// Part of the expenses covered by the approval rating.
    pub accepted_expeditures: Money,
}

/// Figures for a group of tickets (a topic, or the tickets without a user).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    /// Number of tickets in the group.
    pub ticket_count: usize,
    /// Media totals over the group's tickets.
    pub media: MediaTotals,
    /// Sum of all expenses of the group's tickets.
    pub total_expeditures: Money,
    /// Accepted expenses of the group's tickets.
    pub accepted_expeditures: Money,
}

/// Figures for one user on the user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// The user.
    pub user: TrackerUser,
    /// Totals over the user's tickets.
    #[serde(flatten)]
    pub tickets: GroupSummary,
    /// Sum of transactions with the user as counterparty.
    pub transactions: Money,
}

/// Expense totals across all tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseTotals {
    /// Sum of every expense.
    pub total: Money,
    /// Sum of accepted expenses.
    pub accepted: Money,
}

/// Grand totals shown under the user list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Number of tickets.
    pub ticket_count: usize,
    /// Media totals over every ticket.
    pub media: MediaTotals,
    /// Expense totals.
    pub expeditures: ExpenseTotals,
    /// Sum of every transaction.
    pub transactions: Money,
}

/// A copy of every record the reports read.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// All tickets.
    pub tickets: Vec<Ticket>,
    /// All media entries.
    pub media: Vec<MediaInfo>,
    /// All expense entries.
    pub expeditures: Vec<Expediture>,
    /// All transactions.
    pub transactions: Vec<Transaction>,
    /// All users.
    pub users: Vec<TrackerUser>,
}

impl Snapshot {
    fn expenses_by_ticket(&self) -> HashMap<TicketId, Money> {
        let mut sums: HashMap<TicketId, Money> = HashMap::new();
        for e in &self.expeditures {
            let entry = sums.entry(e.ticket).or_default();
            *entry = entry.saturating_add(e.amount);
        }
        sums
    }

    /// Figures for one ticket.
    pub fn ticket_summary(&self, ticket: &Ticket) -> TicketSummary {
        let total: Money = self
            .expeditures
            .iter()
            .filter(|e| e.ticket == ticket.id)
            .map(|e| e.amount)
            .sum();
        TicketSummary {
            media: MediaTotals::of(self.media.iter().filter(|m| m.ticket == ticket.id)),
            total_expeditures: total,
            accepted_expeditures: ticket.accepted_expeditures(total),
        }
    }

    /// Totals over the tickets matching `include`.
    pub fn group_summary(&self, include: impl Fn(&Ticket) -> bool) -> GroupSummary {
        self.group_summary_with(&self.expenses_by_ticket(), include)
    }

    fn group_summary_with(
        &self,
        by_ticket: &HashMap<TicketId, Money>,
        include: impl Fn(&Ticket) -> bool,
    ) -> GroupSummary {
        let group: Vec<&Ticket> = self.tickets.iter().filter(|t| include(t)).collect();
        let ids: HashSet<TicketId> = group.iter().map(|t| t.id).collect();

        let total_expeditures = ids
            .iter()
            .filter_map(|id| by_ticket.get(id))
            .sum::<Money>();
        let accepted_expeditures = accepted_expeditures(&group, by_ticket);

        GroupSummary {
            ticket_count: group.len(),
            media: MediaTotals::of(self.media.iter().filter(|m| ids.contains(&m.ticket))),
            total_expeditures,
            accepted_expeditures,
        }
    }

    /// Totals over a topic's tickets.
    pub fn topic_summary(&self, topic: TopicId) -> GroupSummary {
        self.group_summary(|t| t.topic == topic)
    }

    /// Totals over tickets without a requesting user, or `None` when every
    /// ticket has one.
    pub fn unassigned(&self) -> Option<GroupSummary> {
        if self.tickets.iter().all(|t| t.requested_user.is_some()) {
            return None;
        }
        Some(self.group_summary(|t| t.requested_user.is_none()))
    }

    /// Per-user figures, ordered by username.
    pub fn user_summaries(&self) -> Vec<UserSummary> {
        let by_ticket = self.expenses_by_ticket();
        let mut users: Vec<&TrackerUser> = self.users.iter().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
            .into_iter()
            .map(|user| UserSummary {
                user: user.clone(),
                tickets: self.group_summary_with(&by_ticket, |t| {
                    t.requested_user == Some(user.id)
                }),
                transactions: self.transactions_with(user.id),
            })
            .collect()
    }

    /// Sum of transactions with `user` as counterparty.
    pub fn transactions_with(&self, user: UserId) -> Money {
        self.transactions
            .iter()
            .filter(|tx| tx.other == Some(user))
            .map(|tx| tx.amount)
            .sum()
    }

    /// Grand totals.
    pub fn totals(&self) -> Totals {
        let all = self.group_summary(|_| true);
        Totals {
            ticket_count: all.ticket_count,
            media: all.media,
            expeditures: ExpenseTotals {
                total: self.expeditures.iter().map(|e| e.amount).sum(),
                accepted: all.accepted_expeditures,
            },
            transactions: self.transactions_total(),
        }
    }

    /// Sum of every transaction.
    pub fn transactions_total(&self) -> Money {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    /// Tickets matching `include`, newest `sort_date` first.
    pub fn tickets_where(&self, include: impl Fn(&Ticket) -> bool) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.tickets.iter().filter(|t| include(t)).cloned().collect();
        tickets.sort_by(|a, b| b.sort_date.cmp(&a.sort_date).then(b.created.cmp(&a.created)));
        tickets
    }
}

fn accepted_expeditures(tickets: &[&Ticket], by_ticket: &HashMap<TicketId, Money>) -> Money {
    tickets
        .iter()
        .filter(|t| t.counts_as_accepted())
        .map(|t| t.accepted_expeditures(by_ticket.get(&t.id).copied().unwrap_or_default()))
        .sum()
}
