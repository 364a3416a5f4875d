//! # Topic Choice Sets
//!
//! The ticket form only offers topics that accept new tickets. An existing
//! ticket keeps its topic selectable even after that topic has been closed,
//! otherwise the ticket could not be saved without moving it elsewhere.

use crate::identity::TopicId;
use crate::topic::Topic;

/// The topics a ticket form may select, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicChoices {
    topics: Vec<Topic>,
}

impl TopicChoices {
    /// Choices for a ticket being filed: open topics only.
    pub fn for_new_ticket<'a>(topics: impl IntoIterator<Item = &'a Topic>) -> Self {
        Self::filtered(topics, None)
    }

    /// Choices for an existing ticket: open topics plus the ticket's `current` topic.
    pub fn for_existing_ticket<'a>(
        topics: impl IntoIterator<Item = &'a Topic>,
        current: TopicId,
    ) -> Self {
        Self::filtered(topics, Some(current))
    }

    fn filtered<'a>(topics: impl IntoIterator<Item = &'a Topic>, keep: Option<TopicId>) -> Self {
        let mut topics: Vec<Topic> = topics
            .into_iter()
            .filter(|t| t.open_for_tickets || Some(t.id) == keep)
            .cloned()
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Self { topics }
    }

    /// Look up a selectable topic.
    pub fn get(&self, id: TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Whether `id` is selectable.
    pub fn contains(&self, id: TopicId) -> bool {
        self.get(id).is_some()
    }

    /// Selectable topics in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    /// Number of selectable topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether no topic is selectable.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, open: bool) -> Topic {
        let mut t = Topic::new(name).unwrap();
        t.open_for_tickets = open;
        t
    }

    #[test]
    fn new_ticket_sees_only_open_topics() {
        let topics = vec![topic("Photos", true), topic("Closed grant", false)];
        let choices = TopicChoices::for_new_ticket(&topics);
        assert_eq!(choices.len(), 1);
        assert!(choices.contains(topics[0].id));
        assert!(!choices.contains(topics[1].id));
    }

    #[test]
    fn existing_ticket_keeps_its_closed_topic() {
        let topics = vec![
            topic("Photos", true),
            topic("Closed grant", false),
            topic("Other closed", false),
        ];
        let choices = TopicChoices::for_existing_ticket(&topics, topics[1].id);
        assert_eq!(choices.len(), 2);
        assert!(choices.contains(topics[1].id));
        assert!(!choices.contains(topics[2].id));
    }

    #[test]
    fn choices_are_sorted_by_name() {
        let topics = vec![topic("Zoo", true), topic("Archive", true), topic("Museum", true)];
        let choices = TopicChoices::for_new_ticket(&topics);
        let names: Vec<&str> = choices
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["Archive", "Museum", "Zoo"]);
    }

    #[test]
    fn empty_when_nothing_open() {
        let topics = vec![topic("Closed", false)];
        assert!(TopicChoices::for_new_ticket(&topics).is_empty());
    }
}
