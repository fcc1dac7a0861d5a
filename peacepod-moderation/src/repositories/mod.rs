// File: peacepod-moderation/src/repositories/mod.rs
pub mod postgres;

pub use postgres::bans::BanRepository;
pub use postgres::violations::ViolationRepository;
