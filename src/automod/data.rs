//! Typed trigger configuration data
//!
//! The rule-storage layer persists each trigger's settings as a JSON
//! object. [`TriggerData::decode`] resolves that object into the typed
//! variant matching the trigger's registry kind when a rule is loaded;
//! the result is immutable for the lifetime of an evaluation.

use crate::automod::contract::TriggerKind;
use crate::automod::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared shape of the message/name/username regex triggers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexTriggerData {
    pub pattern: String,
    /// Fire when the pattern does NOT match
    pub inverse: bool,
    pub normalize_unicode: bool,
}

/// Word blacklist/whitelist triggers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WordListTriggerData {
    pub list_id: Option<Uuid>,
    pub normalize_unicode: bool,
}

/// Domain blacklist/whitelist triggers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainTriggerData {
    pub list_id: Option<Uuid>,
}

/// Single-message mention count trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionsTriggerData {
    pub threshold: usize,
}

impl Default for MentionsTriggerData {
    fn default() -> Self {
        Self { threshold: 4 }
    }
}

/// Message length trigger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageLengthData {
    pub length: usize,
    /// Fire on messages shorter than `length` instead of longer
    pub inverse: bool,
}

/// Attachment trigger; an empty pattern matches any filename
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageAttachmentData {
    pub filename_regex: String,
}

/// Rate trigger over the recent-message window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowmodeTriggerData {
    pub threshold: usize,
    /// Window length in seconds
    pub interval: u64,
    /// Count every attachment in a message instead of one per message
    pub single_message_attachments: bool,
    /// Count every link in a message instead of one per message
    pub single_message_links: bool,
}

impl Default for SlowmodeTriggerData {
    fn default() -> Self {
        Self {
            threshold: 5,
            interval: 10,
            single_message_attachments: false,
            single_message_links: false,
        }
    }
}

/// Mention accumulation trigger over the recent-message window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiMsgMentionTriggerData {
    pub threshold: usize,
    /// Window length in seconds
    pub interval: u64,
    /// Count repeat mentions of one user instead of de-duplicating
    pub count_duplicates: bool,
    /// Skip the mention the platform injects for replies
    pub exclude_reply_mentions: bool,
}

impl Default for MultiMsgMentionTriggerData {
    fn default() -> Self {
        Self {
            threshold: 20,
            interval: 10,
            count_duplicates: false,
            exclude_reply_mentions: false,
        }
    }
}

/// Identical-message run trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamTriggerData {
    pub threshold: usize,
    /// Oldest a message in the run may be, in seconds
    pub interval: u64,
}

impl Default for SpamTriggerData {
    fn default() -> Self {
        Self {
            threshold: 4,
            interval: 30,
        }
    }
}

/// Violation-count trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationsTriggerData {
    /// Violation name to count
    pub name: String,
    pub threshold: usize,
    /// Recency window in minutes
    pub interval_minutes: u64,
    /// Stand down when a higher-severity rule of the same name already
    /// fired for this incident
    pub ignore_if_lesser: bool,
}

impl Default for ViolationsTriggerData {
    fn default() -> Self {
        Self {
            name: String::new(),
            threshold: 4,
            interval_minutes: 60,
            ignore_if_lesser: true,
        }
    }
}

/// Native-automod correlation trigger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomodExecutionData {
    pub rule_id: String,
}

/// Resolved configuration data for one trigger instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TriggerData {
    /// For triggers with no configurable parameters
    None,
    Regex(RegexTriggerData),
    WordList(WordListTriggerData),
    Domain(DomainTriggerData),
    Mentions(MentionsTriggerData),
    MessageLength(MessageLengthData),
    MessageAttachment(MessageAttachmentData),
    Slowmode(SlowmodeTriggerData),
    MultiMsgMention(MultiMsgMentionTriggerData),
    Spam(SpamTriggerData),
    Violations(ViolationsTriggerData),
    AutomodExecution(AutomodExecutionData),
}

macro_rules! data_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty, $label:literal) => {
        /// Typed view of this data, or a mismatch error when a trigger was
        /// wired to the wrong variant
        pub fn $fn_name(&self) -> EngineResult<&$ty> {
            match self {
                Self::$variant(data) => Ok(data),
                other => Err(EngineError::DataMismatch {
                    expected: $label,
                    got: other.kind_name(),
                }),
            }
        }
    };
}

impl TriggerData {
    /// Short label for error messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Regex(_) => "regex",
            Self::WordList(_) => "word_list",
            Self::Domain(_) => "domain",
            Self::Mentions(_) => "mentions",
            Self::MessageLength(_) => "message_length",
            Self::MessageAttachment(_) => "message_attachment",
            Self::Slowmode(_) => "slowmode",
            Self::MultiMsgMention(_) => "multi_msg_mention",
            Self::Spam(_) => "spam",
            Self::Violations(_) => "violations",
            Self::AutomodExecution(_) => "automod_execution",
        }
    }

    data_accessor!(regex, Regex, RegexTriggerData, "regex");
    data_accessor!(word_list, WordList, WordListTriggerData, "word_list");
    data_accessor!(domain, Domain, DomainTriggerData, "domain");
    data_accessor!(mentions, Mentions, MentionsTriggerData, "mentions");
    data_accessor!(
        message_length,
        MessageLength,
        MessageLengthData,
        "message_length"
    );
    data_accessor!(
        message_attachment,
        MessageAttachment,
        MessageAttachmentData,
        "message_attachment"
    );
    data_accessor!(slowmode, Slowmode, SlowmodeTriggerData, "slowmode");
    data_accessor!(
        multi_msg_mention,
        MultiMsgMention,
        MultiMsgMentionTriggerData,
        "multi_msg_mention"
    );
    data_accessor!(spam, Spam, SpamTriggerData, "spam");
    data_accessor!(violations, Violations, ViolationsTriggerData, "violations");
    data_accessor!(
        automod_execution,
        AutomodExecution,
        AutomodExecutionData,
        "automod_execution"
    );

    /// Decode stored settings for a trigger of the given registry kind.
    /// Absent fields take their defaults, so an empty object is always a
    /// valid stored form.
    ///
    /// # Errors
    /// Returns `EngineError::DecodeSettings` when the stored object does
    /// not fit the kind's data shape.
    pub fn decode(kind: TriggerKind, stored: serde_json::Value) -> EngineResult<Self> {
        use TriggerKind as K;

        let data = match kind {
            K::WordBlacklist | K::WordWhitelist => {
                Self::WordList(serde_json::from_value(stored)?)
            }
            K::DomainBlacklist | K::DomainWhitelist => {
                Self::Domain(serde_json::from_value(stored)?)
            }
            K::AnyLink
            | K::ServerInvite
            | K::AntiPhishingLink
            | K::GoogleSafeBrowsing
            | K::MemberJoin
            | K::VoiceStateUpdate => Self::None,
            K::Mentions => Self::Mentions(serde_json::from_value(stored)?),
            K::MessageRegex | K::NameRegex | K::UsernameRegex => {
                Self::Regex(serde_json::from_value(stored)?)
            }
            K::MessageLength => Self::MessageLength(serde_json::from_value(stored)?),
            K::MessageAttachment | K::MessageNoAttachment => {
                Self::MessageAttachment(serde_json::from_value(stored)?)
            }
            K::Slowmode
            | K::ChannelSlowmode
            | K::AttachmentSlowmode
            | K::ChannelAttachmentSlowmode
            | K::LinkSlowmode
            | K::ChannelLinkSlowmode
            | K::StickerSlowmode
            | K::ChannelStickerSlowmode => Self::Slowmode(serde_json::from_value(stored)?),
            K::MultiMsgMention | K::ChannelMultiMsgMention => {
                Self::MultiMsgMention(serde_json::from_value(stored)?)
            }
            K::Spam => Self::Spam(serde_json::from_value(stored)?),
            K::Violations => Self::Violations(serde_json::from_value(stored)?),
            K::NameWordBlacklist
            | K::NameWordWhitelist
            | K::UsernameWordBlacklist
            | K::UsernameWordWhitelist => Self::WordList(serde_json::from_value(stored)?),
            K::AutomodExecution => Self::AutomodExecution(serde_json::from_value(stored)?),
        };

        Ok(data)
    }
}
