//! Domain snapshots of gateway state
//!
//! The engine evaluates plain snapshot types rather than serenity's gateway
//! models: snapshots are cheap to construct in tests and pin down exactly
//! the fields triggers are allowed to look at. The `From` impls at the
//! bottom are the one place gateway types are unpacked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serenity::model::channel::{Attachment, Message, MessageType};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use serenity::model::voice::VoiceState;
use uuid::Uuid;

/// A user as seen at evaluation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    pub name: String,
    pub bot: bool,
}

/// A guild member as seen at evaluation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub user: UserSnapshot,
    pub nickname: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl MemberSnapshot {
    /// Username and nickname in the order name triggers check them
    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.user.name.as_str()).chain(self.nickname.as_deref())
    }
}

/// One attachment on a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub filename: String,
}

/// A message as seen at evaluation time, also the element type of the
/// per-channel history window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: UserSnapshot,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<AttachmentInfo>,
    pub sticker_count: usize,
    /// IDs of users mentioned in the message, in message order
    pub mentions: Vec<UserId>,
    /// Author of the replied-to message, when this message is a reply and
    /// the platform injected a mention for it
    pub reply_to: Option<UserId>,
}

impl MessageSnapshot {
    /// Whether the message carries at least one attachment
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A member's voice connection as seen at evaluation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceStateSnapshot {
    pub user_id: UserId,
    pub channel_id: Option<ChannelId>,
}

/// A past rule violation by a user. Supplied by the caller, already
/// filtered to the acting guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Name of the rule that recorded the violation
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A named word or domain list scoped to one guild. Read-only here; the
/// list store owns content and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildList {
    pub id: Uuid,
    pub guild_id: GuildId,
    pub content: Vec<String>,
}

impl From<&serenity::model::user::User> for UserSnapshot {
    fn from(user: &serenity::model::user::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            bot: user.bot,
        }
    }
}

impl From<&Member> for MemberSnapshot {
    fn from(member: &Member) -> Self {
        Self {
            user: UserSnapshot::from(&member.user),
            nickname: member.nick.clone(),
            joined_at: member
                .joined_at
                .and_then(|ts| DateTime::from_timestamp(ts.unix_timestamp(), 0)),
        }
    }
}

impl From<&Attachment> for AttachmentInfo {
    fn from(attachment: &Attachment) -> Self {
        Self {
            filename: attachment.filename.clone(),
        }
    }
}

impl From<&Message> for MessageSnapshot {
    fn from(message: &Message) -> Self {
        let reply_to = if message.kind == MessageType::InlineReply {
            message
                .referenced_message
                .as_deref()
                .map(|replied| replied.author.id)
        } else {
            None
        };

        Self {
            id: message.id,
            channel_id: message.channel_id,
            author: UserSnapshot::from(&message.author),
            content: message.content.clone(),
            timestamp: DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
                .unwrap_or_default(),
            attachments: message.attachments.iter().map(AttachmentInfo::from).collect(),
            sticker_count: message.sticker_items.len(),
            mentions: message.mentions.iter().map(|user| user.id).collect(),
            reply_to,
        }
    }
}

impl From<&VoiceState> for VoiceStateSnapshot {
    fn from(state: &VoiceState) -> Self {
        Self {
            user_id: state.user_id,
            channel_id: state.channel_id,
        }
    }
}
