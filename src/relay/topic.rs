/// Prefix shared by every per-receiver topic.
const TOPIC_PREFIX: &str = "chat-";

/// Maps a receiver name to its broker topic.
///
/// The receiver string is used verbatim, treated as an opaque identifier:
/// the same receiver always yields the same topic.
pub fn topic_for(receiver: &str) -> String {
    format!("{TOPIC_PREFIX}{receiver}")
}
