//! Per-evaluation context and injected collaborators
//!
//! `EngineServices` is constructed once at engine start-up and passed by
//! reference into every trigger call; it owns the compiled-pattern cache
//! and the handles to the external collaborators. `TriggerContext` is the
//! per-call view: one event, one rule, one resolved configuration.

use crate::TRIGGER_TARGET;
use crate::automod::MAX_MESSAGE_HISTORY;
use crate::automod::cache::RegexCache;
use crate::automod::data::TriggerData;
use crate::automod::error::EngineResult;
use crate::model::{GuildList, MemberSnapshot, MessageSnapshot};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use regex::Regex;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Read access to guild word/domain lists. Idempotent and safe to call
/// once per evaluation; caching and invalidation are the store's concern.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ListStore: Send + Sync {
    async fn fetch_guild_list(&self, guild_id: GuildId, list_id: Uuid) -> EngineResult<GuildList>;
}

/// Bounded, newest-first feed of recently observed messages per channel
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageHistory: Send + Sync {
    async fn recent_messages(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        limit: usize,
    ) -> Vec<MessageSnapshot>;
}

/// External phishing / safe-browsing lookup. Returns the matched domain
/// when the text contains a flagged link. The implementation bounds its
/// own timeout; a slow call stalls only the one evaluation using it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn check_text(&self, text: &str) -> EngineResult<Option<String>>;
}

/// Shared engine state, injected into every evaluation
pub struct EngineServices {
    /// The one mutable structure in the engine; see [`RegexCache`]
    pub patterns: RegexCache,
    pub lists: Arc<dyn ListStore>,
    pub history: Arc<dyn MessageHistory>,
    pub phishing: Arc<dyn LinkChecker>,
    pub safe_browsing: Arc<dyn LinkChecker>,
}

impl EngineServices {
    #[must_use]
    pub fn new(
        lists: Arc<dyn ListStore>,
        history: Arc<dyn MessageHistory>,
        phishing: Arc<dyn LinkChecker>,
        safe_browsing: Arc<dyn LinkChecker>,
    ) -> Self {
        Self {
            patterns: RegexCache::new(),
            lists,
            history,
            phishing,
            safe_browsing,
        }
    }
}

/// Everything one trigger evaluation may look at. Built per call by the
/// rule engine, never persisted or shared across calls.
pub struct TriggerContext<'a> {
    pub guild_id: GuildId,
    /// The acting member the event belongs to
    pub member: &'a MemberSnapshot,
    /// Channel the event happened in, when the event kind has one
    pub channel_id: Option<ChannelId>,
    /// Resolved configuration for the trigger under evaluation
    pub data: &'a TriggerData,
    pub services: &'a EngineServices,
}

impl<'a> TriggerContext<'a> {
    #[must_use]
    pub fn new(
        guild_id: GuildId,
        member: &'a MemberSnapshot,
        channel_id: Option<ChannelId>,
        data: &'a TriggerData,
        services: &'a EngineServices,
    ) -> Self {
        Self {
            guild_id,
            member,
            channel_id,
            data,
            services,
        }
    }

    /// Compile `pattern` through the shared cache. A compile failure is
    /// logged and reported as `None`; the calling trigger treats it as a
    /// non-match.
    #[must_use]
    pub fn compile_pattern(&self, pattern: &str) -> Option<Arc<Regex>> {
        match self.services.patterns.get_or_compile(pattern) {
            Ok(regex) => Some(regex),
            Err(error) => {
                warn!(
                    target: TRIGGER_TARGET,
                    guild_id = %self.guild_id,
                    error = %error,
                    "Pattern rejected, trigger treated as non-match"
                );
                None
            }
        }
    }

    /// Fetch a guild list, logging store failures and reporting them as
    /// `None` so the calling trigger fails open.
    pub async fn fetch_list(&self, list_id: Option<Uuid>) -> Option<GuildList> {
        let list_id = list_id?;
        match self
            .services
            .lists
            .fetch_guild_list(self.guild_id, list_id)
            .await
        {
            Ok(list) => Some(list),
            Err(error) => {
                warn!(
                    target: TRIGGER_TARGET,
                    guild_id = %self.guild_id,
                    list_id = %list_id,
                    error = %error,
                    "Guild list unavailable, trigger treated as non-match"
                );
                None
            }
        }
    }

    /// The recent-message window for `channel`, newest first, capped at
    /// [`MAX_MESSAGE_HISTORY`]
    pub async fn recent_messages(&self, channel: ChannelId) -> Vec<MessageSnapshot> {
        self.services
            .history
            .recent_messages(self.guild_id, channel, MAX_MESSAGE_HISTORY)
            .await
    }
}

/// Log a configuration-shape mismatch. Callers fail open afterwards: a
/// misconfigured trigger is a silent no-op, never a dispatch-loop fault.
pub(crate) fn log_config_skip(ctx: &TriggerContext<'_>, error: &crate::automod::EngineError) {
    warn!(
        target: TRIGGER_TARGET,
        guild_id = %ctx.guild_id,
        error = %error,
        "Trigger configuration mismatch, treated as non-match"
    );
}


#[cfg(test)]
mod tests {
    use super::testsupport::*;
    use super::*;
    use crate::automod::error::EngineError;
    use crate::model::MemberSnapshot;
    use crate::model::testutil;

    fn ctx_parts() -> (MemberSnapshot, TriggerData) {
        (testutil::member(1, "someone", None), TriggerData::None)
    }

    #[test]
    fn test_compile_pattern_failure_is_none() {
        let services = services();
        let (member, data) = ctx_parts();
        let ctx = TriggerContext::new(GuildId::new(9), &member, None, &data, &services);

        assert!(ctx.compile_pattern("(broken").is_none());
        assert!(ctx.compile_pattern("fine").is_some());
    }

    #[tokio::test]
    async fn test_fetch_list_fails_open() {
        let services = services();
        let (member, data) = ctx_parts();
        let ctx = TriggerContext::new(GuildId::new(9), &member, None, &data, &services);

        // Store error and unset id both resolve to None
        assert!(ctx.fetch_list(Some(Uuid::new_v4())).await.is_none());
        assert!(ctx.fetch_list(None).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_list_returns_resolved_list() {
        let list = testutil::guild_list(9, &["alpha", "beta"]);
        let services = services_with_list(list);
        let (member, data) = ctx_parts();
        let ctx = TriggerContext::new(GuildId::new(9), &member, None, &data, &services);

        let resolved = ctx.fetch_list(Some(Uuid::new_v4())).await.unwrap();
        assert_eq!(resolved.content, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_recent_messages_respects_cap() {
        let many: Vec<_> = (0u64..1200)
            .map(|i| testutil::message(i + 1, 1, "x", 0))
            .collect();
        let services = services_with_history(many);
        let (member, data) = ctx_parts();
        let ctx = TriggerContext::new(GuildId::new(9), &member, None, &data, &services);

        let window = ctx.recent_messages(ChannelId::new(500)).await;
        assert_eq!(window.len(), MAX_MESSAGE_HISTORY);
    }

    #[tokio::test]
    async fn test_list_store_error_variant() {
        // Keeps the mock error shape honest for the fail-open tests above
        let services = services();
        let err = services
            .lists
            .fetch_guild_list(GuildId::new(9), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ListLookup(_)));
    }
}
