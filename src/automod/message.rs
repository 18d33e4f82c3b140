//! Message-event triggers
//!
//! Everything here evaluates a single incoming message: regex and word-list
//! matching, domain allow/deny lists, link and invite detection, external
//! phishing/safe-browsing correlation, and the small structural checks
//! (attachments, length, mention count). Rate triggers that aggregate over
//! the recent-message window live in `window`.

use crate::TRIGGER_TARGET;
use crate::automod::context::{TriggerContext, log_config_skip};
use crate::automod::contract::{MessageTrigger, Trigger, TriggerKind};
use crate::automod::data::{
    DomainTriggerData, MentionsTriggerData, MessageAttachmentData, MessageLengthData,
    RegexTriggerData, TriggerData, WordListTriggerData,
};
use crate::automod::error::EngineResult;
use crate::automod::links::{contains_invite, contains_link, find_links, host_matches, link_host};
use crate::automod::normalize::{display_length, normalize_text};
use crate::automod::settings::SettingDef;
use crate::model::{GuildList, MessageSnapshot};
use async_trait::async_trait;
use serenity::model::id::ChannelId;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Whether a word list fires for `text` under the given mode.
///
/// Blacklist mode fires on the first token contained in the list.
/// Whitelist mode fires when any token is absent: every word must be
/// listed for the text to pass.
pub(super) fn word_list_fires(
    list: &GuildList,
    text: &str,
    blacklist: bool,
    normalize: bool,
) -> bool {
    for token in text.split_whitespace() {
        let token = if normalize {
            normalize_text(token)
        } else {
            token.to_string()
        };
        let token = token.to_lowercase();
        let listed = list
            .content
            .iter()
            .any(|entry| entry.to_lowercase() == token);

        if listed == blacklist {
            return true;
        }
    }
    false
}

/// Fires when the message matches (or, inverted, does not match) a regex
pub struct MessageRegexTrigger;

impl Trigger for MessageRegexTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::MessageRegex
    }

    fn name(&self) -> &'static str {
        "Message regex"
    }

    fn description(&self) -> &'static str {
        "Triggers when a message matches the configured regex"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Regex(RegexTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::string("Regex", "pattern"),
            SettingDef::bool("Invert (trigger when not matching)", "inverse", false),
            SettingDef::bool("Look-alike character matching", "normalize_unicode", false),
        ]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for MessageRegexTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.regex().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(regex) = ctx.compile_pattern(&data.pattern) else {
            return Ok(false);
        };

        let matched = if data.normalize_unicode {
            regex.is_match(&normalize_text(&message.content))
        } else {
            regex.is_match(&message.content)
        };

        Ok(matched != data.inverse)
    }
}

/// Word blacklist/whitelist over a guild list
pub struct WordListTrigger {
    pub blacklist: bool,
}

impl Trigger for WordListTrigger {
    fn kind(&self) -> TriggerKind {
        if self.blacklist {
            TriggerKind::WordBlacklist
        } else {
            TriggerKind::WordWhitelist
        }
    }

    fn name(&self) -> &'static str {
        if self.blacklist {
            "Word blacklist"
        } else {
            "Word whitelist"
        }
    }

    fn description(&self) -> &'static str {
        if self.blacklist {
            "Triggers when a message contains a listed word"
        } else {
            "Triggers when a message contains a word not on the list"
        }
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::WordList(WordListTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::list("List", "list_id"),
            SettingDef::bool("Look-alike character matching", "normalize_unicode", false),
        ]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for WordListTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        _message: &MessageSnapshot,
        stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.word_list().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(list) = ctx.fetch_list(data.list_id).await else {
            return Ok(false);
        };

        Ok(word_list_fires(
            &list,
            stripped,
            self.blacklist,
            data.normalize_unicode,
        ))
    }
}

/// Domain blacklist/whitelist over links in the message
pub struct DomainTrigger {
    pub blacklist: bool,
}

impl Trigger for DomainTrigger {
    fn kind(&self) -> TriggerKind {
        if self.blacklist {
            TriggerKind::DomainBlacklist
        } else {
            TriggerKind::DomainWhitelist
        }
    }

    fn name(&self) -> &'static str {
        if self.blacklist {
            "Website blacklist"
        } else {
            "Website whitelist"
        }
    }

    fn description(&self) -> &'static str {
        if self.blacklist {
            "Triggers on messages linking to a listed website"
        } else {
            "Triggers on messages linking to a website not on the list"
        }
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Domain(DomainTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![SettingDef::list("List", "list_id")]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for DomainTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.domain().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(list) = ctx.fetch_list(data.list_id).await else {
            return Ok(false);
        };

        for link in find_links(&message.content) {
            let Some(host) = link_host(link) else {
                continue;
            };
            let listed = list.content.iter().any(|entry| host_matches(&host, entry));

            if listed == self.blacklist {
                debug!(
                    target: TRIGGER_TARGET,
                    guild_id = %ctx.guild_id,
                    host = %host,
                    "Domain trigger fired"
                );
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Fires on any link-shaped content
pub struct AnyLinkTrigger;

impl Trigger for AnyLinkTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::AnyLink
    }

    fn name(&self) -> &'static str {
        "Any link"
    }

    fn description(&self) -> &'static str {
        "Triggers on any message containing a link"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for AnyLinkTrigger {
    async fn check_message(
        &self,
        _ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        Ok(contains_link(&message.content))
    }
}

/// Fires on Discord server invites
pub struct ServerInviteTrigger;

impl Trigger for ServerInviteTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::ServerInvite
    }

    fn name(&self) -> &'static str {
        "Server invites"
    }

    fn description(&self) -> &'static str {
        "Triggers on messages containing server invites"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for ServerInviteTrigger {
    async fn check_message(
        &self,
        _ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        stripped: &str,
    ) -> EngineResult<bool> {
        // Markdown can hide an invite (spoilers, embeds), so check both forms
        Ok(contains_invite(&message.content) || contains_invite(stripped))
    }
}

/// Correlates message links against the anti-phishing collaborator
pub struct AntiPhishingLinkTrigger;

impl Trigger for AntiPhishingLinkTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::AntiPhishingLink
    }

    fn name(&self) -> &'static str {
        "Flagged scam link"
    }

    fn description(&self) -> &'static str {
        "Triggers on messages containing a known scam or phishing link"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for AntiPhishingLinkTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        check_links_external(ctx, &ctx.services.phishing, message, "anti-phishing").await
    }
}

/// Correlates message links against the safe-browsing collaborator
pub struct GoogleSafeBrowsingTrigger;

impl Trigger for GoogleSafeBrowsingTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::GoogleSafeBrowsing
    }

    fn name(&self) -> &'static str {
        "Google flagged link"
    }

    fn description(&self) -> &'static str {
        "Triggers on messages containing a link flagged by safe browsing"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for GoogleSafeBrowsingTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        check_links_external(ctx, &ctx.services.safe_browsing, message, "safe-browsing").await
    }
}

async fn check_links_external(
    ctx: &TriggerContext<'_>,
    checker: &std::sync::Arc<dyn crate::automod::context::LinkChecker>,
    message: &MessageSnapshot,
    which: &'static str,
) -> EngineResult<bool> {
    match checker.check_text(&message.content).await {
        Ok(Some(domain)) => {
            debug!(
                target: TRIGGER_TARGET,
                guild_id = %ctx.guild_id,
                checker = which,
                domain = %domain,
                "External link check matched"
            );
            Ok(true)
        }
        Ok(None) => Ok(false),
        Err(error) => {
            warn!(
                target: TRIGGER_TARGET,
                guild_id = %ctx.guild_id,
                checker = which,
                error = %error,
                "External link check failed, trigger treated as non-match"
            );
            Ok(false)
        }
    }
}

/// Fires at a unique-mention threshold within one message
pub struct MentionsTrigger;

impl Trigger for MentionsTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::Mentions
    }

    fn name(&self) -> &'static str {
        "Message mentions"
    }

    fn description(&self) -> &'static str {
        "Triggers when a message mentions too many users"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Mentions(MentionsTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![SettingDef::int("Threshold", "threshold", 0, 500, 4)]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for MentionsTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.mentions().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        if data.threshold == 0 {
            return Ok(false);
        }

        let unique: HashSet<_> = message.mentions.iter().collect();
        Ok(unique.len() >= data.threshold)
    }
}

/// Fires on attachment presence (or absence), with an optional filename
/// pattern for the presence variant
pub struct MessageAttachmentTrigger {
    pub requires_attachment: bool,
}

impl Trigger for MessageAttachmentTrigger {
    fn kind(&self) -> TriggerKind {
        if self.requires_attachment {
            TriggerKind::MessageAttachment
        } else {
            TriggerKind::MessageNoAttachment
        }
    }

    fn name(&self) -> &'static str {
        if self.requires_attachment {
            "Message attachments"
        } else {
            "Message without attachments"
        }
    }

    fn description(&self) -> &'static str {
        if self.requires_attachment {
            "Triggers on messages with attachments"
        } else {
            "Triggers on messages without any attachment"
        }
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::MessageAttachment(MessageAttachmentData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        if self.requires_attachment {
            vec![SettingDef::string("Filename regex (optional)", "filename_regex")]
        } else {
            Vec::new()
        }
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for MessageAttachmentTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        if !self.requires_attachment {
            return Ok(!message.has_attachments());
        }
        if !message.has_attachments() {
            return Ok(false);
        }

        let Ok(data) = ctx
            .data
            .message_attachment()
            .inspect_err(|e| log_config_skip(ctx, e))
        else {
            return Ok(false);
        };
        if data.filename_regex.is_empty() {
            return Ok(true);
        }

        let Some(regex) = ctx.compile_pattern(&data.filename_regex) else {
            return Ok(false);
        };
        Ok(message
            .attachments
            .iter()
            .any(|attachment| regex.is_match(&attachment.filename)))
    }
}

/// Fires on messages longer (or, inverted, shorter) than a threshold
pub struct MessageLengthTrigger;

impl Trigger for MessageLengthTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::MessageLength
    }

    fn name(&self) -> &'static str {
        "Message length"
    }

    fn description(&self) -> &'static str {
        "Triggers on messages longer or shorter than the configured length"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::MessageLength(MessageLengthData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::int("Length", "length", 0, 10_000, 0),
            SettingDef::bool("Invert (trigger when shorter)", "inverse", false),
        ]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for MessageLengthTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        _channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx
            .data
            .message_length()
            .inspect_err(|e| log_config_skip(ctx, e))
        else {
            return Ok(false);
        };

        let length = display_length(&message.content);
        Ok(if data.inverse {
            length < data.length
        } else {
            length > data.length
        })
    }
}
