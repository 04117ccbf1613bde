//! Input descriptors for a single message row.

use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bold,
    Italic,
    Code,
    Mention,
    Link,
}

/// A rich-text span over the message text, in byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<TextEntity>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Document,
}

/// Attached media. A message carries at most one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    /// Intrinsic pixel size, when known.
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaDescriptor {
    pub fn photo(width: u32, height: u32) -> Self {
        Self {
            kind: MediaKind::Photo,
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn document() -> Self {
        Self {
            kind: MediaKind::Document,
            width: None,
            height: None,
        }
    }

    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyPreview {
    pub sender_name: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub emoji: String,
    pub count: u32,
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Sending,
    Sent,
    Read,
    Failed,
}

/// Time label rendered next to or below the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBadge {
    pub label: String,
    /// Present for outgoing messages only.
    pub status: Option<DeliveryStatus>,
}

/// Position of the row relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayoutFlags {
    pub first_in_group: bool,
    pub first_in_window: bool,
    pub last_in_window: bool,
    /// One-to-one conversation: no avatar column, no sender names.
    pub direct_chat: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageContent {
    pub stable_id: i64,
    pub text: Option<RichText>,
    pub media: Option<MediaDescriptor>,
    pub reply: Option<ReplyPreview>,
    pub outgoing: bool,
    #[serde(default)]
    pub reactions: Vec<ReactionSummary>,
    pub sender_name: Option<String>,
    pub time: Option<TimeBadge>,
    #[serde(default)]
    pub flags: LayoutFlags,
}

impl MessageContent {
    pub fn text(stable_id: i64, text: impl Into<String>) -> Self {
        Self {
            stable_id,
            text: Some(RichText::plain(text)),
            media: None,
            reply: None,
            outgoing: false,
            reactions: Vec::new(),
            sender_name: None,
            time: None,
            flags: LayoutFlags::default(),
        }
    }

    /// Hash of everything that affects geometry, excluding the stable id.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.text.hash(&mut hasher);
        self.media.hash(&mut hasher);
        self.reply.hash(&mut hasher);
        self.outgoing.hash(&mut hasher);
        self.reactions.hash(&mut hasher);
        self.sender_name.hash(&mut hasher);
        self.time.hash(&mut hasher);
        self.flags.hash(&mut hasher);
        hasher.finish()
    }
}
