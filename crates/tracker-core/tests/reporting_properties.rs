//! # Reporting Properties
//!
//! Aggregates on the user list must agree with the same figures computed
//! ticket by ticket. Random snapshots are generated with proptest and the
//! two computations compared.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use tracker_core::{
    Expediture, MediaInfo, Money, Snapshot, Ticket, TicketDraft, TicketState, TopicId,
    TrackerUser, Transaction,
};

#[derive(Debug, Clone)]
struct TicketSpec {
    owner: Option<usize>,
    state: usize,
    rating: Option<u8>,
    expenses: Vec<i64>,
    media: Vec<Option<u32>>,
}

fn ticket_spec(users: usize) -> impl Strategy<Value = TicketSpec> {
    (
        proptest::option::of(0..users),
        0..TicketState::ALL.len(),
        proptest::option::of(0u8..=100),
        proptest::collection::vec(0i64..1_000_000, 0..4),
        proptest::collection::vec(proptest::option::of(0u32..500), 0..3),
    )
        .prop_map(|(owner, state, rating, expenses, media)| TicketSpec {
            owner,
            state,
            rating,
            expenses,
            media,
        })
}

fn build(specs: &[TicketSpec], payments: &[(usize, i64)], user_count: usize) -> Snapshot {
    let users: Vec<TrackerUser> = (0..user_count)
        .map(|i| TrackerUser::new(format!("user{i}")).unwrap())
        .collect();
    let topic = TopicId::new();
    let mut snapshot = Snapshot {
        users: users.clone(),
        ..Snapshot::default()
    };

    for spec in specs {
        let mut ticket = Ticket::file(
            TicketDraft {
                topic,
                event_date: None,
                summary: "generated".into(),
                description: String::new(),
            },
            spec.owner.map(|i| users[i].id),
            Utc::now(),
        );
        ticket.state = TicketState::ALL[spec.state];
        ticket.rating_percentage = spec.rating;
        for cents in &spec.expenses {
            snapshot
                .expeditures
                .push(Expediture::new(ticket.id, "cost", Money::from_cents(*cents)));
        }
        for count in &spec.media {
            snapshot
                .media
                .push(MediaInfo::new(ticket.id, "media", None, *count));
        }
        snapshot.tickets.push(ticket);
    }

    for (user, cents) in payments {
        snapshot.transactions.push(
            Transaction::new(
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                Some(users[*user].id),
                "",
                Money::from_cents(*cents),
                "",
            )
            .unwrap(),
        );
    }
    snapshot
}

proptest! {
    #[test]
    fn user_list_totals_match_per_ticket_sums(
        specs in proptest::collection::vec(ticket_spec(3), 0..12),
        payments in proptest::collection::vec((0usize..3, -50_000i64..50_000), 0..6),
    ) {
        let snapshot = build(&specs, &payments, 3);
        let totals = snapshot.totals();

        let mut expected_total = Money::ZERO;
        let mut expected_accepted = Money::ZERO;
        let mut expected_media = 0u64;
        for ticket in &snapshot.tickets {
            let summary = snapshot.ticket_summary(ticket);
            expected_total = expected_total.saturating_add(summary.total_expeditures);
            expected_media += summary.media.media;
            if ticket.counts_as_accepted() {
                expected_accepted = expected_accepted.saturating_add(summary.accepted_expeditures);
            }
        }

        prop_assert_eq!(totals.ticket_count, snapshot.tickets.len());
        prop_assert_eq!(totals.expeditures.total, expected_total);
        prop_assert_eq!(totals.expeditures.accepted, expected_accepted);
        prop_assert_eq!(totals.media.media, expected_media);

        // Users plus the unassigned block partition the tickets.
        let users = snapshot.user_summaries();
        let unassigned = snapshot.unassigned().unwrap_or_default();
        let count: usize = users.iter().map(|u| u.tickets.ticket_count).sum::<usize>()
            + unassigned.ticket_count;
        prop_assert_eq!(count, totals.ticket_count);

        let accepted: Money = users
            .iter()
            .map(|u| u.tickets.accepted_expeditures)
            .chain(std::iter::once(unassigned.accepted_expeditures))
            .sum();
        prop_assert_eq!(accepted, totals.expeditures.accepted);

        let paid: Money = users.iter().map(|u| u.transactions).sum();
        prop_assert_eq!(paid, totals.transactions);
    }

    #[test]
    fn money_display_parses_back(cents in -10_000_000_000i64..10_000_000_000) {
        let money = Money::from_cents(cents);
        prop_assert_eq!(Money::parse(&money.to_string()).unwrap(), money);
    }
}
