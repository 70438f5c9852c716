//! Draw eligibility.
//!
//! Two paths lead to a draw:
//! - the purchase that brings the round to `min_players` ticket slots
//!   draws immediately, inside the same invocation;
//! - once the round duration has elapsed, the owner may draw any round
//!   holding at least `MIN_PLAYERS_FLOOR` slots.
//!
//! Expiry on its own only blocks purchases.

use shared::MIN_PLAYERS_FLOOR;

use crate::storage::{LotteryConfig, RoundState};

/// Timestamp at which the round stops selling, if it is time-limited.
pub fn deadline(config: &LotteryConfig, round: &RoundState) -> Option<u64> {
    if config.duration_seconds == 0 {
        return None;
    }
    Some(round.start_time.saturating_add(config.duration_seconds))
}

pub fn is_expired(config: &LotteryConfig, round: &RoundState, now: u64) -> bool {
    match deadline(config, round) {
        Some(end) => now >= end,
        None => false,
    }
}

/// True once the round holds enough slots for the automatic draw.
pub fn reaches_threshold(config: &LotteryConfig, round: &RoundState) -> bool {
    round.total_entries >= config.min_players
}

pub fn can_draw(config: &LotteryConfig, round: &RoundState, now: u64) -> bool {
    reaches_threshold(config, round)
        || (is_expired(config, round, now) && round.total_entries >= MIN_PLAYERS_FLOOR)
}

/// Seconds left before expiry; 0 for unlimited or elapsed rounds.
pub fn time_remaining(config: &LotteryConfig, round: &RoundState, now: u64) -> u64 {
    match deadline(config, round) {
        Some(end) => end.saturating_sub(now),
        None => 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(min_players: u32, duration_seconds: u64) -> LotteryConfig {
        LotteryConfig {
            ticket_price: 100,
            min_players,
            max_tickets_per_player: 0,
            organizer_fee_percent: 5,
            duration_seconds,
        }
    }

    fn round_with(total_entries: u32, start_time: u64) -> RoundState {
        RoundState {
            number: 1,
            is_active: true,
            start_time,
            prize_pool: 100 * total_entries as i128,
            total_entries,
        }
    }

    #[test]
    fn test_threshold_gates_draw() {
        let cfg = config(3, 0);
        assert!(!can_draw(&cfg, &round_with(0, 0), 0));
        assert!(!can_draw(&cfg, &round_with(2, 0), 0));
        assert!(can_draw(&cfg, &round_with(3, 0), 0));
        assert!(can_draw(&cfg, &round_with(4, 0), 0));
    }

    #[test]
    fn test_unlimited_round_never_expires() {
        let cfg = config(3, 0);
        let round = round_with(1, 10);
        assert!(!is_expired(&cfg, &round, u64::MAX));
        assert_eq!(time_remaining(&cfg, &round, 1_000), 0);
        assert_eq!(deadline(&cfg, &round), None);
    }

    #[test]
    fn test_expiry_boundary() {
        let cfg = config(5, 3_600);
        let round = round_with(0, 1_000);
        assert!(!is_expired(&cfg, &round, 4_599));
        assert!(is_expired(&cfg, &round, 4_600));
        assert_eq!(time_remaining(&cfg, &round, 1_000), 3_600);
        assert_eq!(time_remaining(&cfg, &round, 4_599), 1);
        assert_eq!(time_remaining(&cfg, &round, 9_999), 0);
    }

    #[test]
    fn test_expired_round_needs_two_slots() {
        let cfg = config(5, 60);
        assert!(!can_draw(&cfg, &round_with(1, 0), 60));
        assert!(can_draw(&cfg, &round_with(2, 0), 60));
        // not yet expired
        assert!(!can_draw(&cfg, &round_with(2, 0), 59));
    }
}
