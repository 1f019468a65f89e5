//! Rewriting of inbound context from outside the participant set.

use crate::graph::Graph;
use hive_core::Message;

/// Attribute foreign messages to the caller.
///
/// A message whose source is neither a participant of `graph` nor the
/// caller (`"user"`, any case) becomes a text message from `"user"` reading
/// `Context from <source>: <content>`. Participants therefore never see a
/// source name they cannot address.
pub fn obfuscate(messages: Vec<Message>, graph: &Graph) -> Vec<Message> {
    messages
        .into_iter()
        .map(|message| {
            if message.is_from_user() || graph.contains(&message.source) {
                message
            } else {
                Message::user(format!(
                    "Context from {}: {}",
                    message.source, message.content
                ))
            }
        })
        .collect()
}
