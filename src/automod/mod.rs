//! Automod trigger-evaluation engine
//!
//! This module decides whether a configured detection rule fires for an
//! incoming event. Triggers are stateless predicates: the external rule
//! engine resolves a rule's stored settings into typed data, builds a
//! [`TriggerContext`] and calls the one capability method matching the
//! event kind. Evaluation never mutates guild state, list content or
//! violation history.

mod cache;
mod context;
mod contract;
mod data;
mod error;
mod links;
mod message;
mod member;
mod normalize;
mod registry;
mod settings;
mod window;

pub use cache::{PATTERN_TTL, RegexCache};
pub use context::{EngineServices, LinkChecker, ListStore, MessageHistory, TriggerContext};
pub use contract::{
    AutomodListener, EventKind, JoinListener, MessageTrigger, NameListener, RulePart, Trigger,
    TriggerKind, UsernameListener, ViolationListener, VoiceStateListener,
};
pub use data::{
    AutomodExecutionData, DomainTriggerData, MentionsTriggerData, MessageAttachmentData,
    MessageLengthData, MultiMsgMentionTriggerData, RegexTriggerData, SlowmodeTriggerData,
    SpamTriggerData, TriggerData, ViolationsTriggerData, WordListTriggerData,
};
pub use error::{EngineError, EngineResult};
pub use message::{
    AntiPhishingLinkTrigger, AnyLinkTrigger, DomainTrigger, GoogleSafeBrowsingTrigger,
    MentionsTrigger, MessageAttachmentTrigger, MessageLengthTrigger, MessageRegexTrigger,
    ServerInviteTrigger, WordListTrigger,
};
pub use member::{
    AutomodExecution, MemberJoinTrigger, NameRegexTrigger, NameWordlistTrigger,
    UsernameRegexTrigger, UsernameWordlistTrigger, ViolationsTrigger, VoiceStateUpdateTrigger,
};
pub use normalize::{display_length, fold_confusables, normalize_text, strip_accents};
pub use registry::TriggerRegistry;
pub use settings::{SettingDef, SettingKind, SettingValue};
pub use window::{MultiMsgMentionTrigger, SlowmodeTrigger, SpamTrigger};

/// Upper bound on the per-channel message history window.
pub const MAX_MESSAGE_HISTORY: usize = 1000;
