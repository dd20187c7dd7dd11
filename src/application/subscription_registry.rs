// Subscription registry - Topics the session currently cares about
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    topics: HashSet<String>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the topic was newly added.
    pub fn subscribe(&mut self, topic: &str) -> bool {
        self.topics.insert(topic.to_string())
    }

    /// Returns true when the topic was present.
    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        self.topics.remove(topic)
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Sorted snapshot of the subscribed topics
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.iter().cloned().collect();
        topics.sort();
        topics
    }
}
