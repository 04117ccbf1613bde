use chatlist_layout::{
    DeliveryStatus, LayoutFlags, MediaDescriptor, MessageContent, ReactionSummary, ReplyPreview,
    RichText, TimeBadge,
};
use chatlist_window::{StableId, WindowItem};
use serde::{Deserialize, Serialize};

/// Payload carried by every window item of a chat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub text: Option<RichText>,
    pub media: Option<MediaDescriptor>,
    pub reply: Option<ReplyPreview>,
    pub outgoing: bool,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default)]
    pub reactions: Vec<ReactionSummary>,
}

pub type ChatItem = WindowItem<MessageRecord>;

impl MessageRecord {
    pub fn text(sender_id: i64, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            sender_name: None,
            text: Some(RichText::plain(text)),
            media: None,
            reply: None,
            outgoing: false,
            status: DeliveryStatus::default(),
            reactions: Vec::new(),
        }
    }

    /// Layout input for this record at its current position in the list.
    pub fn to_content(
        &self,
        stable_id: StableId,
        flags: LayoutFlags,
        time_label: Option<String>,
    ) -> MessageContent {
        MessageContent {
            stable_id: stable_id.0,
            text: self.text.clone(),
            media: self.media.clone(),
            reply: self.reply.clone(),
            outgoing: self.outgoing,
            reactions: self.reactions.clone(),
            sender_name: self.sender_name.clone(),
            time: time_label.map(|label| TimeBadge {
                label,
                status: self.outgoing.then_some(self.status),
            }),
            flags,
        }
    }

    /// Width-independent once it fits on one line: no reply preview and no
    /// reaction chips to reflow.
    pub(crate) fn is_plain_text(&self) -> bool {
        self.media.is_none() && self.reply.is_none() && self.reactions.is_empty()
    }
}
