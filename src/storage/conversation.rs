use crate::common::ChatMessage;

/// In-memory log of every message seen during one session, sent or
/// received. Entries are never removed or rewritten; threads are projected
/// from the log on demand.
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    log: Vec<ChatMessage>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self { log: Vec::new() }
    }

    /// Appends without deduplication. An echoed copy of a message we sent
    /// shows up twice.
    pub fn append(&mut self, message: ChatMessage) {
        self.log.push(message);
    }

    /// Messages exchanged between `local` and `peer`, oldest first.
    ///
    /// Ordering follows the message timestamps, not arrival order. Messages
    /// with equal timestamps keep the order they were appended in.
    pub fn thread_with(&self, peer: &str, local: &str) -> Vec<ChatMessage> {
        let mut thread: Vec<ChatMessage> = self
            .log
            .iter()
            .filter(|message| message.is_between(local, peer))
            .cloned()
            .collect();
        // stable
        thread.sort_by_key(|message| message.time);
        thread
    }

    /// The raw log in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MessageKind;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, second).unwrap()
    }

    fn msg(from: &str, to: &str, content: &str, second: u32) -> ChatMessage {
        ChatMessage {
            content: content.to_string(),
            from_user: from.to_string(),
            to_user: to.to_string(),
            kind: MessageKind::Message,
            time: at(second),
        }
    }

    fn contents(thread: &[ChatMessage]) -> Vec<&str> {
        thread.iter().map(|message| message.content.as_str()).collect()
    }

    #[test]
    fn thread_contains_exactly_the_pair() {
        let mut store = ConversationStore::new();
        store.append(msg("alice", "bob", "a->b", 1));
        store.append(msg("bob", "alice", "b->a", 2));
        store.append(msg("alice", "carol", "a->c", 3));
        store.append(msg("carol", "bob", "c->b", 4));
        store.append(msg("dave", "alice", "d->a", 5));

        let thread = store.thread_with("bob", "alice");

        assert_eq!(contents(&thread), vec!["a->b", "b->a"]);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn out_of_order_arrivals_are_sorted_by_time() {
        let mut store = ConversationStore::new();
        store.append(msg("bob", "alice", "second", 20));
        store.append(msg("alice", "bob", "third", 30));
        store.append(msg("alice", "bob", "first", 10));

        let thread = store.thread_with("bob", "alice");

        assert_eq!(contents(&thread), vec!["first", "second", "third"]);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let mut store = ConversationStore::new();
        store.append(msg("alice", "bob", "one", 5));
        store.append(msg("bob", "alice", "two", 5));
        store.append(msg("alice", "bob", "zero", 1));
        store.append(msg("alice", "bob", "three", 5));

        let thread = store.thread_with("bob", "alice");

        assert_eq!(contents(&thread), vec!["zero", "one", "two", "three"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut store = ConversationStore::new();
        let message = msg("alice", "bob", "hi", 1);
        store.append(message.clone());
        store.append(message);

        assert_eq!(store.thread_with("bob", "alice").len(), 2);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let mut store = ConversationStore::new();
        store.append(msg("bob", "alice", "later", 9));
        store.append(msg("alice", "bob", "earlier", 3));

        let first = store.thread_with("bob", "alice");
        let second = store.thread_with("alice", "bob");

        assert_eq!(first, second);
        assert_eq!(first, store.thread_with("bob", "alice"));
    }

    #[test]
    fn log_is_left_untouched_by_queries() {
        let mut store = ConversationStore::new();
        store.append(msg("bob", "alice", "b", 2));
        store.append(msg("alice", "bob", "a", 1));

        let _ = store.thread_with("bob", "alice");

        assert_eq!(contents(store.messages()), vec!["b", "a"]);
    }

    #[test]
    fn unknown_peer_has_empty_thread() {
        let mut store = ConversationStore::new();
        store.append(msg("alice", "bob", "hi", 1));

        assert!(store.thread_with("zoe", "alice").is_empty());
        assert!(ConversationStore::new().is_empty());
    }
}
