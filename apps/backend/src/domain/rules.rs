//! Fixed competition rules: default timer windows and round sizing.

/// Window to answer a freshly selected domain question, in seconds.
pub const DOMAIN_ANSWER_SECS: i64 = 60;
/// Window to answer a question received via a pass, in seconds.
pub const PASSED_ANSWER_SECS: i64 = 30;
/// Window for teams to buzz after a buzzer question opens, in seconds.
pub const BUZZ_WINDOW_SECS: i64 = 10;
/// Personal window to answer after buzzing, in seconds.
pub const BUZZER_ANSWER_SECS: i64 = 20;

/// Largest multiple of `team_count` that fits in `item_count`.
///
/// Used twice: the total number of domain selections in a session
/// (`floor(domains / teams) * teams`) and the per-domain question quota.
/// Rounding down keeps the pick rotation fair: every team gets the same
/// number of selections.
pub fn whole_pass_quota(item_count: usize, team_count: usize) -> u32 {
    if team_count == 0 {
        return 0;
    }
    ((item_count / team_count) * team_count) as u32
}
