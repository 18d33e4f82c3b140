pub mod automod;
pub mod logging;
pub mod model;

// Customize these constants for your bot
pub const BOT_NAME: &str = "vigilant_daemon";
pub const TRIGGER_TARGET: &str = "vigilant_daemon::automod";
pub const CACHE_TARGET: &str = "vigilant_daemon::automod::cache";
pub const CONSOLE_TARGET: &str = "vigilant_daemon";

pub use automod::{EngineError, EngineResult, EngineServices, TriggerContext, TriggerRegistry};
pub use model::{GuildList, MemberSnapshot, MessageSnapshot, ViolationRecord};
pub type Error = Box<dyn std::error::Error + Send + Sync>;
