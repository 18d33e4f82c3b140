//! Sliding-window aggregation triggers
//!
//! These walk the per-channel recent-message window newest to oldest and
//! stop at the first message older than the configured interval; the
//! window is time-ordered, so the scan is an early-exit linear pass. Zero
//! history is a valid "not triggered" state.

use crate::automod::context::{TriggerContext, log_config_skip};
use crate::automod::contract::{MessageTrigger, Trigger, TriggerKind};
use crate::automod::data::{
    MultiMsgMentionTriggerData, SlowmodeTriggerData, SpamTriggerData, TriggerData,
};
use crate::automod::error::EngineResult;
use crate::automod::links::find_links;
use crate::automod::settings::SettingDef;
use crate::model::MessageSnapshot;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serenity::model::id::ChannelId;
use std::collections::HashSet;

fn window_cutoff(interval_secs: u64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::seconds(i64::try_from(interval_secs).unwrap_or(i64::MAX))
}

/// Message-rate trigger, per user or per channel, optionally restricted to
/// messages carrying attachments, links or stickers
pub struct SlowmodeTrigger {
    kind: TriggerKind,
    channel_based: bool,
    attachments: bool,
    links: bool,
    stickers: bool,
}

impl SlowmodeTrigger {
    fn build(
        kind: TriggerKind,
        channel_based: bool,
        attachments: bool,
        links: bool,
        stickers: bool,
    ) -> Self {
        Self {
            kind,
            channel_based,
            attachments,
            links,
            stickers,
        }
    }

    /// Messages by one user
    #[must_use]
    pub fn user() -> Self {
        Self::build(TriggerKind::Slowmode, false, false, false, false)
    }

    /// Messages in the whole channel
    #[must_use]
    pub fn channel() -> Self {
        Self::build(TriggerKind::ChannelSlowmode, true, false, false, false)
    }

    /// Attachments by one user
    #[must_use]
    pub fn user_attachments() -> Self {
        Self::build(TriggerKind::AttachmentSlowmode, false, true, false, false)
    }

    /// Attachments in the whole channel
    #[must_use]
    pub fn channel_attachments() -> Self {
        Self::build(
            TriggerKind::ChannelAttachmentSlowmode,
            true,
            true,
            false,
            false,
        )
    }

    /// Links by one user
    #[must_use]
    pub fn user_links() -> Self {
        Self::build(TriggerKind::LinkSlowmode, false, false, true, false)
    }

    /// Links in the whole channel
    #[must_use]
    pub fn channel_links() -> Self {
        Self::build(TriggerKind::ChannelLinkSlowmode, true, false, true, false)
    }

    /// Stickers by one user
    #[must_use]
    pub fn user_stickers() -> Self {
        Self::build(TriggerKind::StickerSlowmode, false, false, false, true)
    }

    /// Stickers in the whole channel
    #[must_use]
    pub fn channel_stickers() -> Self {
        Self::build(
            TriggerKind::ChannelStickerSlowmode,
            true,
            false,
            false,
            true,
        )
    }

    /// How much one message contributes to the running count
    fn weigh(&self, msg: &MessageSnapshot, data: &SlowmodeTriggerData) -> usize {
        if self.attachments {
            if data.single_message_attachments {
                msg.attachments.len()
            } else {
                usize::from(msg.has_attachments())
            }
        } else if self.links {
            let links = find_links(&msg.content).len();
            if data.single_message_links {
                links
            } else {
                usize::from(links > 0)
            }
        } else if self.stickers {
            msg.sticker_count
        } else {
            1
        }
    }
}

impl Trigger for SlowmodeTrigger {
    fn kind(&self) -> TriggerKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            TriggerKind::Slowmode => "x user messages in y seconds",
            TriggerKind::ChannelSlowmode => "x channel messages in y seconds",
            TriggerKind::AttachmentSlowmode => "x user attachments in y seconds",
            TriggerKind::ChannelAttachmentSlowmode => "x channel attachments in y seconds",
            TriggerKind::LinkSlowmode => "x user links in y seconds",
            TriggerKind::ChannelLinkSlowmode => "x channel links in y seconds",
            TriggerKind::StickerSlowmode => "x user stickers in y seconds",
            _ => "x channel stickers in y seconds",
        }
    }

    fn description(&self) -> &'static str {
        if self.channel_based {
            "Triggers when the channel exceeds the configured rate"
        } else {
            "Triggers when a user exceeds the configured rate"
        }
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Slowmode(SlowmodeTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        let mut settings = vec![
            SettingDef::int("Messages", "threshold", 0, 1000, 5),
            SettingDef::int("Within (seconds)", "interval", 0, 600, 10),
        ];
        if self.attachments {
            settings.push(SettingDef::bool(
                "Count multiple attachments per message",
                "single_message_attachments",
                false,
            ));
        }
        if self.links {
            settings.push(SettingDef::bool(
                "Count multiple links per message",
                "single_message_links",
                false,
            ));
        }
        settings
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for SlowmodeTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.slowmode().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        if data.threshold == 0 {
            return Ok(false);
        }

        let cutoff = window_cutoff(data.interval);
        let mut count = 0usize;

        for msg in ctx.recent_messages(channel).await {
            if msg.timestamp < cutoff {
                break;
            }
            if !self.channel_based && msg.author.id != message.author.id {
                continue;
            }

            count += self.weigh(&msg, data);
            if count >= data.threshold {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Accumulated-mentions trigger over the window, per user or per channel
pub struct MultiMsgMentionTrigger {
    kind: TriggerKind,
    channel_based: bool,
}

impl MultiMsgMentionTrigger {
    /// Mentions sent by one user
    #[must_use]
    pub fn user() -> Self {
        Self {
            kind: TriggerKind::MultiMsgMention,
            channel_based: false,
        }
    }

    /// Mentions across the whole channel
    #[must_use]
    pub fn channel() -> Self {
        Self {
            kind: TriggerKind::ChannelMultiMsgMention,
            channel_based: true,
        }
    }
}

impl Trigger for MultiMsgMentionTrigger {
    fn kind(&self) -> TriggerKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        if self.channel_based {
            "x channel mentions in y seconds"
        } else {
            "x user mentions in y seconds"
        }
    }

    fn description(&self) -> &'static str {
        "Triggers when too many users are mentioned within the interval"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::MultiMsgMention(MultiMsgMentionTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::int("Mentions", "threshold", 0, 500, 20),
            SettingDef::int("Within (seconds)", "interval", 0, 600, 10),
            SettingDef::bool("Count duplicate mentions", "count_duplicates", false),
            SettingDef::bool(
                "Ignore mentions from replies",
                "exclude_reply_mentions",
                false,
            ),
        ]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for MultiMsgMentionTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx
            .data
            .multi_msg_mention()
            .inspect_err(|e| log_config_skip(ctx, e))
        else {
            return Ok(false);
        };
        if data.threshold == 0 {
            return Ok(false);
        }

        let cutoff = window_cutoff(data.interval);
        let mut seen = HashSet::new();
        let mut count = 0usize;

        for msg in ctx.recent_messages(channel).await {
            if msg.timestamp < cutoff {
                break;
            }
            if !self.channel_based && msg.author.id != message.author.id {
                continue;
            }

            for mention in &msg.mentions {
                if data.exclude_reply_mentions && msg.reply_to == Some(*mention) {
                    continue;
                }
                if data.count_duplicates {
                    count += 1;
                } else if seen.insert(*mention) {
                    count = seen.len();
                }
                // The threshold can be crossed mid-message; stop right there
                if count >= data.threshold {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// Identical-message run detector: fires on N identical messages in a row
/// by the same author, not N occurrences anywhere in the window
pub struct SpamTrigger;

impl Trigger for SpamTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::Spam
    }

    fn name(&self) -> &'static str {
        "x consecutive identical messages"
    }

    fn description(&self) -> &'static str {
        "Triggers when a user posts the same message several times in a row"
    }

    fn default_data(&self) -> TriggerData {
        TriggerData::Spam(SpamTriggerData::default())
    }

    fn user_settings(&self) -> Vec<SettingDef> {
        vec![
            SettingDef::int("Messages", "threshold", 0, 250, 4),
            SettingDef::int("Within (seconds)", "interval", 1, 600, 30),
        ]
    }

    fn as_message_trigger(&self) -> Option<&dyn MessageTrigger> {
        Some(self)
    }
}

#[async_trait]
impl MessageTrigger for SpamTrigger {
    async fn check_message(
        &self,
        ctx: &TriggerContext<'_>,
        channel: ChannelId,
        message: &MessageSnapshot,
        _stripped: &str,
    ) -> EngineResult<bool> {
        let Ok(data) = ctx.data.spam().inspect_err(|e| log_config_skip(ctx, e)) else {
            return Ok(false);
        };
        if data.threshold == 0 {
            return Ok(false);
        }

        let cutoff = window_cutoff(data.interval);
        let reference = message.content.trim().to_lowercase();
        let mut run = 0usize;

        for msg in ctx.recent_messages(channel).await {
            // A run is broken by age, another author, an attachment or any
            // differing content; the scan never skips past a non-match
            if msg.timestamp < cutoff
                || msg.author.id != message.author.id
                || msg.has_attachments()
                || msg.content.trim().to_lowercase() != reference
            {
                break;
            }

            run += 1;
            if run >= data.threshold {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automod::context::EngineServices;
    use crate::automod::context::testsupport::services_with_history;
    use crate::model::testutil::{member, message, with_attachment, with_mentions};
    use serenity::model::id::GuildId;

    async fn check(
        trigger: &dyn MessageTrigger,
        data: TriggerData,
        services: &EngineServices,
        msg: &MessageSnapshot,
    ) -> bool {
        let acting = member(1, "member", None);
        let ctx = TriggerContext::new(
            GuildId::new(900),
            &acting,
            Some(msg.channel_id),
            &data,
            services,
        );
        trigger
            .check_message(&ctx, msg.channel_id, msg, "")
            .await
            .unwrap()
    }

    fn slowmode_data(threshold: usize, interval: u64) -> TriggerData {
        TriggerData::Slowmode(SlowmodeTriggerData {
            threshold,
            interval,
            ..SlowmodeTriggerData::default()
        })
    }

    #[tokio::test]
    async fn test_slowmode_fires_within_interval() {
        // Five messages with links inside ten seconds
        let history: Vec<_> = (0u64..5)
            .map(|i| {
                message(
                    i + 1,
                    1,
                    "spam https://example.com/offer",
                    i64::try_from(i).unwrap() * 2,
                )
            })
            .collect();
        let newest = history[0].clone();
        let services = services_with_history(history);

        assert!(
            check(
                &SlowmodeTrigger::user_links(),
                slowmode_data(5, 10),
                &services,
                &newest
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_slowmode_spread_outside_interval_does_not_fire() {
        // The same five messages spread over twenty seconds
        let history: Vec<_> = (0u64..5)
            .map(|i| {
                message(
                    i + 1,
                    1,
                    "spam https://example.com/offer",
                    i64::try_from(i).unwrap() * 5,
                )
            })
            .collect();
        let newest = history[0].clone();
        let services = services_with_history(history);

        assert!(
            !check(
                &SlowmodeTrigger::user_links(),
                slowmode_data(5, 10),
                &services,
                &newest
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_slowmode_user_scope_skips_other_authors() {
        let history = vec![
            message(1, 1, "a", 0),
            message(2, 2, "b", 1),
            message(3, 1, "c", 2),
            message(4, 2, "d", 3),
            message(5, 1, "e", 4),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);

        // User 1 only wrote three of the five
        assert!(!check(&SlowmodeTrigger::user(), slowmode_data(4, 30), &services, &newest).await);
        assert!(check(&SlowmodeTrigger::user(), slowmode_data(3, 30), &services, &newest).await);
        // Channel scope counts everyone
        assert!(
            check(&SlowmodeTrigger::channel(), slowmode_data(5, 30), &services, &newest).await
        );
    }

    #[tokio::test]
    async fn test_slowmode_single_message_attachments() {
        let mut msg = with_attachment(message(1, 1, "", 0), "a.png");
        msg = with_attachment(msg, "b.png");
        msg = with_attachment(msg, "c.png");
        let services = services_with_history(vec![msg.clone()]);

        let counting_each = TriggerData::Slowmode(SlowmodeTriggerData {
            threshold: 3,
            interval: 10,
            single_message_attachments: true,
            ..SlowmodeTriggerData::default()
        });
        assert!(
            check(
                &SlowmodeTrigger::user_attachments(),
                counting_each,
                &services,
                &msg
            )
            .await
        );

        // One-per-message counting sees a single attachment message
        assert!(
            !check(
                &SlowmodeTrigger::user_attachments(),
                slowmode_data(3, 10),
                &services,
                &msg
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_slowmode_empty_history() {
        let services = services_with_history(Vec::new());
        let msg = message(1, 1, "hi", 0);
        assert!(!check(&SlowmodeTrigger::user(), slowmode_data(1, 10), &services, &msg).await);
    }

    fn mention_data(threshold: usize, count_duplicates: bool) -> TriggerData {
        TriggerData::MultiMsgMention(MultiMsgMentionTriggerData {
            threshold,
            interval: 10,
            count_duplicates,
            exclude_reply_mentions: false,
        })
    }

    #[tokio::test]
    async fn test_multi_msg_mention_deduplicates_across_window() {
        let history = vec![
            with_mentions(message(1, 1, "", 0), &[11, 12]),
            with_mentions(message(2, 1, "", 2), &[12, 13]),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);

        // Three unique users mentioned
        assert!(
            check(
                &MultiMsgMentionTrigger::user(),
                mention_data(3, false),
                &services,
                &newest
            )
            .await
        );
        assert!(
            !check(
                &MultiMsgMentionTrigger::user(),
                mention_data(4, false),
                &services,
                &newest
            )
            .await
        );
        // Counting duplicates reaches four
        assert!(
            check(
                &MultiMsgMentionTrigger::user(),
                mention_data(4, true),
                &services,
                &newest
            )
            .await
        );
    }

    #[tokio::test]
    async fn test_multi_msg_mention_excludes_reply_mentions() {
        let mut replying = with_mentions(message(1, 1, "", 0), &[11, 12]);
        replying.reply_to = Some(serenity::model::id::UserId::new(11));
        let services = services_with_history(vec![replying.clone()]);

        let data = TriggerData::MultiMsgMention(MultiMsgMentionTriggerData {
            threshold: 2,
            interval: 10,
            count_duplicates: false,
            exclude_reply_mentions: true,
        });
        // Only the non-reply mention counts
        assert!(
            !check(&MultiMsgMentionTrigger::user(), data, &services, &replying).await
        );
    }

    fn spam_data(threshold: usize, interval: u64) -> TriggerData {
        TriggerData::Spam(SpamTriggerData {
            threshold,
            interval,
        })
    }

    #[tokio::test]
    async fn test_spam_counts_identical_run() {
        let history = vec![
            message(1, 1, "Buy Now", 0),
            message(2, 1, "buy now", 10),
            message(3, 1, "BUY NOW  ", 25),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);

        // Trimmed, case-folded contents are identical
        assert!(check(&SpamTrigger, spam_data(3, 30), &services, &newest).await);
        assert!(!check(&SpamTrigger, spam_data(4, 30), &services, &newest).await);
    }

    #[tokio::test]
    async fn test_spam_run_broken_by_other_author() {
        let history = vec![
            message(1, 1, "dup", 0),
            message(2, 1, "dup", 3),
            message(3, 2, "dup", 5),
            message(4, 1, "dup", 8),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);

        // The interleaved author stops the scan at a run of two
        assert!(!check(&SpamTrigger, spam_data(3, 30), &services, &newest).await);
        assert!(check(&SpamTrigger, spam_data(2, 30), &services, &newest).await);
    }

    #[tokio::test]
    async fn test_spam_run_broken_by_attachment_and_content() {
        let history = vec![
            message(1, 1, "dup", 0),
            with_attachment(message(2, 1, "dup", 2), "x.png"),
            message(3, 1, "dup", 4),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);
        assert!(!check(&SpamTrigger, spam_data(2, 30), &services, &newest).await);

        let history = vec![
            message(1, 1, "dup", 0),
            message(2, 1, "different", 2),
            message(3, 1, "dup", 4),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);
        // The non-matching message is not skipped over
        assert!(!check(&SpamTrigger, spam_data(2, 30), &services, &newest).await);
    }

    #[tokio::test]
    async fn test_spam_respects_time_limit() {
        let history = vec![
            message(1, 1, "dup", 0),
            message(2, 1, "dup", 50),
            message(3, 1, "dup", 55),
        ];
        let newest = history[0].clone();
        let services = services_with_history(history);

        // Only the newest message is inside the thirty-second window
        assert!(!check(&SpamTrigger, spam_data(2, 30), &services, &newest).await);
    }

    #[tokio::test]
    async fn test_spam_empty_history_never_fires() {
        let services = services_with_history(Vec::new());
        let msg = message(1, 1, "dup", 0);
        assert!(!check(&SpamTrigger, spam_data(1, 30), &services, &msg).await);
    }
}
