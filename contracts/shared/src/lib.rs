//! Shared accounting helpers for BlockLucky contracts.
//!
//! Everything here is pure integer math so it can be unit-tested without a
//! contract environment and reused by any contract that splits a pot.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::contracttype;

/// Smallest `min_players` a lottery may be configured with.
pub const MIN_PLAYERS_FLOOR: u32 = 2;

/// Largest `min_players` a lottery may be configured with. Bounds the
/// entry list and the per-player counters cleared by a single draw.
pub const MIN_PLAYERS_CEILING: u32 = 100;

/// Upper bound for the organizer's cut, in whole percent.
pub const MAX_ORGANIZER_FEE_PERCENT: u32 = 20;

/// Divisor for whole-percent fees.
pub const PERCENT_DIVISOR: u32 = 100;

/// Error codes for the shared helpers.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    InvalidAmount = 1,
    InvalidFee = 2,
    Overflow = 3,
}

/// Result of splitting a prize pool between the organizer and the winner.
///
/// `fee + payout` always equals the pool that was split.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PrizeSplit {
    pub fee: i128,
    pub payout: i128,
}

/// Split `pool` into the organizer fee and the winner payout.
///
/// `fee = floor(pool * fee_percent / 100)`, `payout = pool - fee`.
pub fn split_prize(pool: i128, fee_percent: u32) -> Result<PrizeSplit, Error> {
    if pool < 0 {
        return Err(Error::InvalidAmount);
    }
    if fee_percent > MAX_ORGANIZER_FEE_PERCENT {
        return Err(Error::InvalidFee);
    }
    let fee = pool
        .checked_mul(fee_percent as i128)
        .and_then(|v| v.checked_div(PERCENT_DIVISOR as i128))
        .ok_or(Error::Overflow)?;
    let payout = pool.checked_sub(fee).ok_or(Error::Overflow)?;
    Ok(PrizeSplit { fee, payout })
}

/// Map a 32-byte digest onto a ticket slot in `[0, total_entries)`.
///
/// The first 8 bytes are read as a big-endian u64 and reduced modulo the
/// slot count. Every ticket is one slot, so a player holding three tickets
/// owns three slots. Returns `None` when there is nothing to draw from.
pub fn winner_slot(digest: &[u8; 32], total_entries: u32) -> Option<u32> {
    if total_entries == 0 {
        return None;
    }
    let raw = u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]);
    Some((raw % total_entries as u64) as u32)
}
