// File: peacepod-moderation/src/repositories/postgres/mod.rs
pub mod bans;
pub mod violations;

pub use bans::PostgresBanRepository;
pub use violations::PostgresViolationRepository;
