// File: src/services/mod.rs

pub mod ban_policy;
pub mod classifier;
pub mod moderation_service;

pub use moderation_service::ModerationService;
