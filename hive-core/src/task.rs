//! What a caller hands to an agent or pipeline.

use crate::message::Message;

/// Input to a run: either a plain instruction or an existing conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// A plain instruction from the external caller.
    Text(String),
    /// A conversation carried over from elsewhere.
    Messages(Vec<Message>),
}

impl Task {
    /// Flatten the task into messages. Text becomes one message from `"user"`.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Task::Text(text) => vec![Message::user(text)],
            Task::Messages(messages) => messages,
        }
    }
}

impl From<&str> for Task {
    fn from(text: &str) -> Self {
        Task::Text(text.to_owned())
    }
}

impl From<String> for Task {
    fn from(text: String) -> Self {
        Task::Text(text)
    }
}

impl From<Message> for Task {
    fn from(message: Message) -> Self {
        Task::Messages(vec![message])
    }
}

impl From<Vec<Message>> for Task {
    fn from(messages: Vec<Message>) -> Self {
        Task::Messages(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_task_is_user_message() {
        let messages = Task::from("write a poem").into_messages();
        assert_eq!(messages, vec![Message::user("write a poem")]);
    }

    #[test]
    fn message_task_passes_through() {
        let msgs = vec![Message::text("researcher", "facts")];
        assert_eq!(Task::from(msgs.clone()).into_messages(), msgs);
    }
}
