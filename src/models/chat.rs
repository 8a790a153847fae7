use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatLog {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub name: String,
    pub color: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub channel: ChatChannel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    /// Everyone in the room: lobby and day phases.
    Room,
    /// The mafia's private channel during night phases.
    Mafia,
    System,
}

impl ChatLog {
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn add_system_message(&mut self, content: String) {
        self.add_message(ChatMessage::new(
            "system".to_string(),
            String::new(),
            content,
            ChatChannel::System,
        ));
    }

    pub fn messages_by_channel(&self, channel: ChatChannel) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.channel == channel)
            .collect()
    }
}

impl ChatMessage {
    pub fn new(name: String, color: String, content: String, channel: ChatChannel) -> Self {
        ChatMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            name,
            color,
            content,
            timestamp: Utc::now(),
            channel,
        }
    }
}
