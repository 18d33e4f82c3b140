//! Trigger capability contracts
//!
//! Triggers are grouped by the narrow capability they satisfy instead of a
//! single mega-interface: an engine dispatching a voice-state event only
//! ever touches triggers implementing [`VoiceStateListener`]. Every trigger
//! also carries the metadata the rule engine and configuration tooling
//! need: its registry kind, a zero-valued configuration instance for
//! decoding stored settings, and its settings schema.

use crate::automod::EngineResult;
use crate::automod::context::TriggerContext;
use crate::automod::data::TriggerData;
use crate::automod::settings::SettingDef;
use crate::model::{MessageSnapshot, ViolationRecord};
use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serenity::model::id::ChannelId;

/// Which part of a rule an item occupies. This engine only ships triggers;
/// conditions and effects live in their own plugins.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePart {
    Trigger,
    Condition,
    Effect,
}

/// Identity of a registered trigger instance. Blacklist/whitelist,
/// per-user/per-channel and present/absent variants register separately,
/// so a stored rule references exactly one kind.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    WordBlacklist,
    WordWhitelist,
    DomainBlacklist,
    DomainWhitelist,
    AnyLink,
    ServerInvite,
    AntiPhishingLink,
    GoogleSafeBrowsing,
    Mentions,
    MessageRegex,
    MessageLength,
    MessageAttachment,
    MessageNoAttachment,
    Slowmode,
    ChannelSlowmode,
    AttachmentSlowmode,
    ChannelAttachmentSlowmode,
    LinkSlowmode,
    ChannelLinkSlowmode,
    StickerSlowmode,
    ChannelStickerSlowmode,
    MultiMsgMention,
    ChannelMultiMsgMention,
    Spam,
    Violations,
    NameRegex,
    NameWordBlacklist,
    NameWordWhitelist,
    UsernameRegex,
    UsernameWordBlacklist,
    UsernameWordWhitelist,
    MemberJoin,
    VoiceStateUpdate,
    AutomodExecution,
}

/// Event kinds the external rule engine dispatches on
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    Name,
    Username,
    Join,
    VoiceState,
    Violation,
    AutomodExecution,
}

/// Base contract every trigger satisfies.
///
/// The `as_*` accessors are the capability table: a trigger overrides the
/// ones it implements and the registry dispatches through them without
/// downcasting.
pub trait Trigger: Send + Sync {
    fn kind(&self) -> TriggerKind;

    fn part(&self) -> RulePart {
        RulePart::Trigger
    }

    /// Presentation only, never on the evaluation path
    fn name(&self) -> &'static str;

    /// Presentation only, never on the evaluation path
    fn description(&self) -> &'static str;

    /// Fresh zero-valued configuration instance, the decode target for
    /// stored settings
    fn default_data(&self) -> TriggerData;

    /// Declarative settings schema consumed by configuration tooling
    fn user_settings(&self) -> Vec<SettingDef>;

    /// Collapse multiple instances of the same trigger on one rule.
    /// Multiplicity adds no discriminating power for most triggers, so the
    /// default keeps the first instance.
    fn merge_duplicates(&self, instances: Vec<TriggerData>) -> TriggerData {
        instances
            .into_iter()
            .next()
            .unwrap_or_else(|| self.default_data())
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        None
    }

    fn as_name_listener(&self) -> Option<&dyn NameListener> {
        None
    }

    fn as_username_listener(&self) -> Option<&dyn UsernameListener> {
        None
    }

    fn as_join_listener(&self) -> Option<&dyn JoinListener> {
        None
    }

    fn as_voice_state_listener(&self) -> Option<&dyn VoiceStateListener> {
        None
    }

    fn as_violation_listener(&self) -> Option<&dyn ViolationListener> {
        None
    }

    fn as_automod_listener(&self) -> Option<&dyn AutomodListener> {
        None
    }
}

/// Evaluated for every message in a moderated channel
#[async_trait]
pub trait MessageTrigger: Trigger {
    /// `stripped` is the message content with markdown removed; triggers
    /// choose which form they match against.
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        channel: ChannelId,
        message: &MessageSnapshot,
        stripped: &str,
    ) -> EngineResult<bool>;
}

/// Evaluated against both username and nickname
#[async_trait]
pub trait NameListener: Trigger {
    async fn check_name(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool>;
}

/// Evaluated at join time, before a nickname exists
#[async_trait]
pub trait UsernameListener: Trigger {
    async fn check_username(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool>;
}

/// Evaluated when a member joins the guild
#[async_trait]
pub trait JoinListener: Trigger {
    async fn check_join(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool>;
}

/// Evaluated on voice-state changes; `channel` is the channel the member
/// is now connected to, if any
#[async_trait]
pub trait VoiceStateListener: Trigger {
    async fn check_voice_state(
        &self,
        ctx: &TriggerContext<'_>,
        channel: Option<ChannelId>,
    ) -> EngineResult<bool>;
}

/// Evaluated when a new violation is recorded for a user. `violations` is
/// the user's prior history, already filtered to the acting guild.
/// `triggered_by_higher_severity` reports whether a higher-severity rule
/// of the same violation name already fired for this incident.
#[async_trait]
pub trait ViolationListener: Trigger {
    async fn check_user(
        &self,
        ctx: &TriggerContext<'_>,
        violations: &[ViolationRecord],
        triggered_by_higher_severity: bool,
    ) -> EngineResult<bool>;
}

/// Correlates with the platform's native automod execution events
#[async_trait]
pub trait AutomodListener: Trigger {
    async fn check_rule_id(
        &self,
        ctx: &TriggerContext<'_>,
        external_rule_id: &str,
    ) -> EngineResult<bool>;
}
