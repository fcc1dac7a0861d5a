// File: peacepod-moderation/src/services/ban_policy.rs

/// Escalating ban durations, in minutes.
pub const FIRST_OFFENSE_MINUTES: i64 = 20;
pub const SECOND_OFFENSE_MINUTES: i64 = 60;
pub const THIRD_OFFENSE_MINUTES: i64 = 240;
pub const FOURTH_OFFENSE_MINUTES: i64 = 720;
pub const FIFTH_OFFENSE_MINUTES: i64 = 1440;
pub const MAX_BAN_MINUTES: i64 = 2880;

/// Ban duration for a user with `prior_violations` violations already on
/// record (0 = first-ever violation). Monotonically non-decreasing, capped
/// at [`MAX_BAN_MINUTES`].
pub fn ban_duration_minutes(prior_violations: u32) -> i64 {
    match prior_violations {
        0 => FIRST_OFFENSE_MINUTES,
        1 => SECOND_OFFENSE_MINUTES,
        2 => THIRD_OFFENSE_MINUTES,
        3 => FOURTH_OFFENSE_MINUTES,
        4 => FIFTH_OFFENSE_MINUTES,
        _ => MAX_BAN_MINUTES,
    }
}
