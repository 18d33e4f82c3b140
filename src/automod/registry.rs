//! Trigger registry
//!
//! One instance of every trigger variant, keyed by [`TriggerKind`]. The
//! rule engine resolves a stored rule's trigger kind here, decodes its
//! settings and dispatches through the capability accessors. Triggers are
//! stateless, so the registry is built once and shared.

use crate::automod::contract::{EventKind, Trigger, TriggerKind};
use crate::automod::data::TriggerData;
use crate::automod::error::EngineResult;
use crate::automod::member::{
    AutomodExecution, MemberJoinTrigger, NameRegexTrigger, NameWordlistTrigger,
    UsernameRegexTrigger, UsernameWordlistTrigger, ViolationsTrigger, VoiceStateUpdateTrigger,
};
use crate::automod::message::{
    AntiPhishingLinkTrigger, AnyLinkTrigger, DomainTrigger, GoogleSafeBrowsingTrigger,
    MentionsTrigger, MessageAttachmentTrigger, MessageLengthTrigger, MessageRegexTrigger,
    ServerInviteTrigger, WordListTrigger,
};
use crate::automod::window::{MultiMsgMentionTrigger, SlowmodeTrigger, SpamTrigger};
use std::collections::HashMap;

/// Registry of all trigger instances
pub struct TriggerRegistry {
    triggers: HashMap<TriggerKind, Box<dyn Trigger>>,
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerRegistry {
    /// Create a registry with every trigger variant registered
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            triggers: HashMap::new(),
        };

        registry.register(Box::new(WordListTrigger { blacklist: true }));
        registry.register(Box::new(WordListTrigger { blacklist: false }));
        registry.register(Box::new(DomainTrigger { blacklist: true }));
        registry.register(Box::new(DomainTrigger { blacklist: false }));
        registry.register(Box::new(AnyLinkTrigger));
        registry.register(Box::new(ServerInviteTrigger));
        registry.register(Box::new(AntiPhishingLinkTrigger));
        registry.register(Box::new(GoogleSafeBrowsingTrigger));
        registry.register(Box::new(MentionsTrigger));
        registry.register(Box::new(MessageRegexTrigger));
        registry.register(Box::new(MessageLengthTrigger));
        registry.register(Box::new(MessageAttachmentTrigger {
            requires_attachment: true,
        }));
        registry.register(Box::new(MessageAttachmentTrigger {
            requires_attachment: false,
        }));
        registry.register(Box::new(SlowmodeTrigger::user()));
        registry.register(Box::new(SlowmodeTrigger::channel()));
        registry.register(Box::new(SlowmodeTrigger::user_attachments()));
        registry.register(Box::new(SlowmodeTrigger::channel_attachments()));
        registry.register(Box::new(SlowmodeTrigger::user_links()));
        registry.register(Box::new(SlowmodeTrigger::channel_links()));
        registry.register(Box::new(SlowmodeTrigger::user_stickers()));
        registry.register(Box::new(SlowmodeTrigger::channel_stickers()));
        registry.register(Box::new(MultiMsgMentionTrigger::user()));
        registry.register(Box::new(MultiMsgMentionTrigger::channel()));
        registry.register(Box::new(SpamTrigger));
        registry.register(Box::new(ViolationsTrigger));
        registry.register(Box::new(NameRegexTrigger));
        registry.register(Box::new(NameWordlistTrigger { blacklist: true }));
        registry.register(Box::new(NameWordlistTrigger { blacklist: false }));
        registry.register(Box::new(UsernameRegexTrigger));
        registry.register(Box::new(UsernameWordlistTrigger { blacklist: true }));
        registry.register(Box::new(UsernameWordlistTrigger { blacklist: false }));
        registry.register(Box::new(MemberJoinTrigger));
        registry.register(Box::new(VoiceStateUpdateTrigger));
        registry.register(Box::new(AutomodExecution));

        registry
    }

    /// Register a trigger under its own kind
    pub fn register(&mut self, trigger: Box<dyn Trigger>) {
        self.triggers.insert(trigger.kind(), trigger);
    }

    /// Look up a trigger by kind
    #[must_use]
    pub fn get(&self, kind: TriggerKind) -> Option<&dyn Trigger> {
        self.triggers.get(&kind).map(AsRef::as_ref)
    }

    /// All registered kinds
    pub fn kinds(&self) -> impl Iterator<Item = TriggerKind> + '_ {
        self.triggers.keys().copied()
    }

    /// Triggers implementing the capability for `event`
    #[must_use]
    pub fn for_event(&self, event: EventKind) -> Vec<&dyn Trigger> {
        self.triggers
            .values()
            .map(AsRef::as_ref)
            .filter(|trigger| match event {
                EventKind::Message => trigger.as_message_trigger().is_some(),
                EventKind::Name => trigger.as_name_listener().is_some(),
                EventKind::Username => trigger.as_username_listener().is_some(),
                EventKind::Join => trigger.as_join_listener().is_some(),
                EventKind::VoiceState => trigger.as_voice_state_listener().is_some(),
                EventKind::Violation => trigger.as_violation_listener().is_some(),
                EventKind::AutomodExecution => trigger.as_automod_listener().is_some(),
            })
            .collect()
    }

    /// Decode stored settings for a rule referencing `kind`
    ///
    /// # Errors
    /// Returns an error when the stored object does not fit the kind's
    /// data shape.
    pub fn decode_settings(
        &self,
        kind: TriggerKind,
        stored: serde_json::Value,
    ) -> EngineResult<TriggerData> {
        TriggerData::decode(kind, stored)
    }
}
