// File: peacepod-moderation/src/models/mod.rs
pub mod moderation;

pub use moderation::{
    ActiveBan, Ban, BanDisplayInfo, BanResult, BanStatus, ContentAnalysis, ContentFlag,
    ContentType, FlagType, ModerationOutcome, RiskLevel, Violation, ViolationDetails,
};
