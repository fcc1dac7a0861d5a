// File: src/tasks/mod.rs

pub mod ban_maintenance;
