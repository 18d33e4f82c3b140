//! Member-event triggers
//!
//! Name and username screening, join and voice-state pass-throughs, the
//! violation-count trigger and correlation with the platform's native
//! automod executions.

use crate::automod::context::{TriggerContext, log_config_skip};
use crate::automod::contract::{
    AutomodListener, JoinListener, NameListener, Trigger, TriggerKind, UsernameListener,
    ViolationListener, VoiceStateListener,
};
use crate::automod::data::{
    AutomodExecutionData, RegexTriggerData, TriggerData, ViolationsTriggerData,
    WordListTriggerData,
};
use crate::automod::error::EngineResult;
use crate::automod::message::word_list_fires;
use crate::automod::normalize::normalize_text;
use crate::automod::settings::SettingDef;
use crate::model::ViolationRecord;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serenity::model::id::ChannelId;

/// Regex over username and nickname, fires if either matches. Inverse
/// mode requires neither to match.
pub struct NameRegexTrigger;

impl Trigger for NameRegexTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::NameRegex
    }

    fn name(&self) -> &'static str {
        "Name regex"
    }

    fn description(&self) -> &'static str {
        "Triggers when a member's username or nickname matches the regex"
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

    fn as_name_listener(&self) -> Option<&dyn NameListener> {
        Some(self)
    }
}

#[async_trait]
impl NameListener for NameRegexTrigger {
    async fn check_name(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool> {
        let Ok(data) = ctx.data.regex().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(regex) = ctx.compile_pattern(&data.pattern) else {
            return Ok(false);
        };

        let any_matched = ctx.member.names().any(|name| {
            if data.normalize_unicode {
                regex.is_match(&normalize_text(name))
            } else {
                regex.is_match(name)
            }
        });

        Ok(any_matched != data.inverse)
    }
}

/// Word list over username and nickname
pub struct NameWordlistTrigger {
    pub blacklist: bool,
}

impl Trigger for NameWordlistTrigger {
    fn kind(&self) -> TriggerKind {
        if self.blacklist {
            TriggerKind::NameWordBlacklist
        } else {
            TriggerKind::NameWordWhitelist
        }
    }

    fn name(&self) -> &'static str {
        if self.blacklist {
            "Name word blacklist"
        } else {
            "Name word whitelist"
        }
    }

    fn description(&self) -> &'static str {
        if self.blacklist {
            "Triggers when a member's name contains a listed word"
        } else {
            "Triggers when a member's name contains a word not on the list"
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

    fn as_name_listener(&self) -> Option<&dyn NameListener> {
        Some(self)
    }
}

#[async_trait]
impl NameListener for NameWordlistTrigger {
    async fn check_name(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool> {
        let Ok(data) = ctx.data.word_list().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(list) = ctx.fetch_list(data.list_id).await else {
            return Ok(false);
        };

        Ok(ctx
            .member
            .names()
            .any(|name| word_list_fires(&list, name, self.blacklist, data.normalize_unicode)))
    }
}

/// Regex over the username only, evaluated at join time
pub struct UsernameRegexTrigger;

impl Trigger for UsernameRegexTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::UsernameRegex
    }

    fn name(&self) -> &'static str {
        "Join username regex"
    }

    fn description(&self) -> &'static str {
        "Triggers when a joining member's username matches the regex"
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

    fn as_username_listener(&self) -> Option<&dyn UsernameListener> {
        Some(self)
    }
}

#[async_trait]
impl UsernameListener for UsernameRegexTrigger {
    async fn check_username(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool> {
        let Ok(data) = ctx.data.regex().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(regex) = ctx.compile_pattern(&data.pattern) else {
            return Ok(false);
        };

        let username = &ctx.member.user.name;
        let matched = if data.normalize_unicode {
            regex.is_match(&normalize_text(username))
        } else {
            regex.is_match(username)
        };

        Ok(matched != data.inverse)
    }
}

/// Word list over the username only, evaluated at join time
pub struct UsernameWordlistTrigger {
    pub blacklist: bool,
}

impl Trigger for UsernameWordlistTrigger {
    fn kind(&self) -> TriggerKind {
        if self.blacklist {
            TriggerKind::UsernameWordBlacklist
        } else {
            TriggerKind::UsernameWordWhitelist
        }
    }

    fn name(&self) -> &'static str {
        if self.blacklist {
            "Join username word blacklist"
        } else {
            "Join username word whitelist"
        }
    }

    fn description(&self) -> &'static str {
        if self.blacklist {
            "Triggers when a joining member's username contains a listed word"
        } else {
            "Triggers when a joining member's username contains a word not on the list"
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

    fn as_username_listener(&self) -> Option<&dyn UsernameListener> {
        Some(self)
    }
}

#[async_trait]
impl UsernameListener for UsernameWordlistTrigger {
    async fn check_username(&self, ctx: &TriggerContext<'_>) -> EngineResult<bool> {
        let Ok(data) = ctx.data.word_list().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        let Some(list) = ctx.fetch_list(data.list_id).await else {
            return Ok(false);
        };

        Ok(word_list_fires(
            &list,
            &ctx.member.user.name,
            self.blacklist,
            data.normalize_unicode,
        ))
    }
}

/// Pass-through: fires for every join, the rule's conditions do the
/// narrowing
pub struct MemberJoinTrigger;

impl Trigger for MemberJoinTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::MemberJoin
    }

    fn name(&self) -> &'static str {
        "Member joined"
    }

    fn description(&self) -> &'static str {
        "Triggers whenever a member joins the server"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_join_listener(&self) -> Option<&dyn JoinListener> {
        Some(self)
    }
}

#[async_trait]
impl JoinListener for MemberJoinTrigger {
    async fn check_join(&self, _ctx: &TriggerContext<'_>) -> EngineResult<bool> {
        Ok(true)
    }
}

/// Fires when a member connects to a voice channel
pub struct VoiceStateUpdateTrigger;

impl Trigger for VoiceStateUpdateTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::VoiceStateUpdate
    }

    fn name(&self) -> &'static str {
        "Voice channel joined"
    }

    fn description(&self) -> &'static str {
        "Triggers when a member connects to a voice channel"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::None
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        Vec::new()
    }

    fn as_voice_state_listener(&self) -> Option<&dyn VoiceStateListener> {
        Some(self)
    }
}

#[async_trait]
impl VoiceStateListener for VoiceStateUpdateTrigger {
    async fn check_voice_state(
        &self,
        _ctx: &TriggerContext<'_>,
        channel: Option<ChannelId>,
    ) -> EngineResult<bool> {
        Ok(channel.is_some())
    }
}

/// Fires at a violation-count threshold over the user's history
pub struct ViolationsTrigger;

impl Trigger for ViolationsTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::Violations
    }

    fn name(&self) -> &'static str {
        "x violations in y minutes"
    }

    fn description(&self) -> &'static str {
        "Triggers when a user accumulates too many violations of one name"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Violations(ViolationsTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::string("Violation name", "name"),
            SettingDef::int("Violations", "threshold", 0, 1000, 4),
            SettingDef::int("Within (minutes)", "interval_minutes", 1, 302_400, 60),
            SettingDef::bool(
                "Only trigger when no higher-severity rule fired",
                "ignore_if_lesser",
                true,
            ),
        ]
    }

    fn as_violation_listener(&self) -> Option<&dyn ViolationListener> {
        Some(self)
    }
}

#[async_trait]
impl ViolationListener for ViolationsTrigger {
    async fn check_user(
        &self,
        ctx: &TriggerContext<'_>,
        violations: &[ViolationRecord],
        triggered_by_higher_severity: bool,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.violations().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        // Most severe wins: one incident must not stack escalations
        if data.ignore_if_lesser && triggered_by_higher_severity {
            return Ok(false);
        }
        if data.threshold == 0 {
            return Ok(false);
        }

        let cutoff =
            Utc::now() - Duration::minutes(i64::try_from(data.interval_minutes).unwrap_or(i64::MAX));
        let recent = violations
            .iter()
            .filter(|violation| violation.name == data.name && violation.created_at > cutoff)
            .count();

        Ok(recent >= data.threshold)
    }
}

/// Correlates with the platform's own automod rule executions
pub struct AutomodExecution;

impl Trigger for AutomodExecution {
    fn kind(&self) -> TriggerKind {
        TriggerKind::AutomodExecution
    }

    fn name(&self) -> &'static str {
        "Discord automod rule executed"
    }

    fn description(&self) -> &'static str {
        "Triggers when a specific built-in automod rule flags a message"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::AutomodExecution(AutomodExecutionData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![SettingDef::string("Rule ID", "rule_id")]
    }

    fn as_automod_listener(&self) -> Option<&dyn AutomodListener> {
        Some(self)
    }
}

#[async_trait]
impl AutomodListener for AutomodExecution {
    async fn check_rule_id(
        &self,
        ctx: &TriggerContext<'_>,
        external_rule_id: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx
            .data
            .automod_execution()
            .inspect_err(|e| log_config_skip(ctx, e))
        else {
            return Ok(false);
        };

        Ok(!data.rule_id.is_empty() && data.rule_id == external_rule_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automod::context::EngineServices;
    use crate::automod::context::testsupport::{services, services_with_list};
    use crate::model::testutil::{guild_list, member};
    use crate::model::MemberSnapshot;
    use serenity::model::id::GuildId;
    use uuid::Uuid;

    fn ctx<'a>(
        acting: &'a MemberSnapshot,
        data: &'a TriggerData,
        services: &'a EngineServices,
    ) -> TriggerContext<'a> {
        TriggerContext::new(GuildId::new(900), acting, None, data, services)
    }

    fn regex_data(pattern: &str, inverse: bool) -> TriggerData {
        TriggerData::Regex(RegexTriggerData {
            pattern: pattern.to_string(),
            inverse,
            normalize_unicode: false,
        })
    }

    fn word_list_data() -> TriggerData {
        TriggerData::WordList(WordListTriggerData {
            list_id: Some(Uuid::new_v4()),
            normalize_unicode: false,
        })
    }

    #[tokio::test]
    async fn test_name_regex_checks_both_names() {
        let services = services();
        let data = regex_data("grifter", false);

        let by_username = member(1, "grifter2000", None);
        assert!(
            NameRegexTrigger
                .check_name(&ctx(&by_username, &data, &services))
                .await
                .unwrap()
        );

        let by_nickname = member(1, "innocent", Some("the grifter"));
        assert!(
            NameRegexTrigger
                .check_name(&ctx(&by_nickname, &data, &services))
                .await
                .unwrap()
        );

        let neither = member(1, "innocent", Some("harmless"));
        assert!(
            !NameRegexTrigger
                .check_name(&ctx(&neither, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_name_regex_inverse_requires_neither_to_match() {
        let services = services();
        let data = regex_data("grifter", true);

        // Nickname matches, so the inverted trigger must not fire
        let by_nickname = member(1, "innocent", Some("the grifter"));
        assert!(
            !NameRegexTrigger
                .check_name(&ctx(&by_nickname, &data, &services))
                .await
                .unwrap()
        );

        let neither = member(1, "innocent", Some("harmless"));
        assert!(
            NameRegexTrigger
                .check_name(&ctx(&neither, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_name_wordlist_blacklist() {
        let services = services_with_list(guild_list(900, &["slur"]));
        let data = word_list_data();

        let flagged = member(1, "some slur here", None);
        assert!(
            NameWordlistTrigger { blacklist: true }
                .check_name(&ctx(&flagged, &data, &services))
                .await
                .unwrap()
        );

        let clean = member(1, "perfectly fine", None);
        assert!(
            !NameWordlistTrigger { blacklist: true }
                .check_name(&ctx(&clean, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_username_trigger_ignores_nickname() {
        let services = services();
        let data = regex_data("grifter", false);

        // Nickname would match, but join-time screening only sees the
        // username
        let acting = member(1, "innocent", Some("the grifter"));
        assert!(
            !UsernameRegexTrigger
                .check_username(&ctx(&acting, &data, &services))
                .await
                .unwrap()
        );

        let acting = member(1, "grifter", Some("harmless"));
        assert!(
            UsernameRegexTrigger
                .check_username(&ctx(&acting, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_username_wordlist_whitelist() {
        let services = services_with_list(guild_list(900, &["alpha", "beta"]));
        let data = word_list_data();

        let allowed = member(1, "alpha beta", None);
        assert!(
            !UsernameWordlistTrigger { blacklist: false }
                .check_username(&ctx(&allowed, &data, &services))
                .await
                .unwrap()
        );

        let unlisted = member(1, "alpha gamma", None);
        assert!(
            UsernameWordlistTrigger { blacklist: false }
                .check_username(&ctx(&unlisted, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_member_join_always_fires() {
        let services = services();
        let data = TriggerData::None;
        let acting = member(1, "anyone", None);
        assert!(
            MemberJoinTrigger
                .check_join(&ctx(&acting, &data, &services))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_voice_state_fires_on_connect_only() {
        let services = services();
        let data = TriggerData::None;
        let acting = member(1, "anyone", None);

        assert!(
            VoiceStateUpdateTrigger
                .check_voice_state(&ctx(&acting, &data, &services), Some(ChannelId::new(7)))
                .await
                .unwrap()
        );
        assert!(
            !VoiceStateUpdateTrigger
                .check_voice_state(&ctx(&acting, &data, &services), None)
                .await
                .unwrap()
        );
    }

    fn violation(name: &str, minutes_ago: i64) -> ViolationRecord {
        ViolationRecord {
            name: name.to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn violations_data(threshold: usize, ignore_if_lesser: bool) -> TriggerData {
        TriggerData::Violations(ViolationsTriggerData {
            name: "spam".to_string(),
            threshold,
            interval_minutes: 60,
            ignore_if_lesser,
        })
    }

    #[tokio::test]
    async fn test_violations_counts_matching_recent_records() {
        let services = services();
        let acting = member(1, "anyone", None);
        let history = vec![
            violation("spam", 5),
            violation("spam", 30),
            violation("links", 10),  // different name
            violation("spam", 120), // outside the window
        ];

        let data = violations_data(2, false);
        assert!(
            ViolationsTrigger
                .check_user(&ctx(&acting, &data, &services), &history, false)
                .await
                .unwrap()
        );

        let data = violations_data(3, false);
        assert!(
            !ViolationsTrigger
                .check_user(&ctx(&acting, &data, &services), &history, false)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_violations_tie_break_suppression() {
        let services = services();
        let acting = member(1, "anyone", None);
        // Plenty of matching violations, but a higher-severity rule of the
        // same name already fired
        let history: Vec<_> = (0..10).map(|i| violation("spam", i)).collect();

        let data = violations_data(1, true);
        assert!(
            !ViolationsTrigger
                .check_user(&ctx(&acting, &data, &services), &history, true)
                .await
                .unwrap()
        );
        // Without the tie-break flag it fires regardless
        let data = violations_data(1, false);
        assert!(
            ViolationsTrigger
                .check_user(&ctx(&acting, &data, &services), &history, true)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_violations_empty_history() {
        let services = services();
        let acting = member(1, "anyone", None);
        let data = violations_data(1, true);
        assert!(
            !ViolationsTrigger
                .check_user(&ctx(&acting, &data, &services), &[], false)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_automod_execution_matches_rule_id() {
        let services = services();
        let acting = member(1, "anyone", None);
        let data = TriggerData::AutomodExecution(AutomodExecutionData {
            rule_id: "123456".to_string(),
        });

        let context = ctx(&acting, &data, &services);
        assert!(
            AutomodExecution
                .check_rule_id(&context, "123456")
                .await
                .unwrap()
        );
        assert!(
            !AutomodExecution
                .check_rule_id(&context, "654321")
                .await
                .unwrap()
        );

        // An unconfigured rule id never fires
        let empty = TriggerData::AutomodExecution(AutomodExecutionData::default());
        let context = ctx(&acting, &empty, &services);
        assert!(!AutomodExecution.check_rule_id(&context, "").await.unwrap());
    }
}
