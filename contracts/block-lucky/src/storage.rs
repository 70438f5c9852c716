//! Ledger/state store for the lottery.
//!
//! ## Storage Strategy
//! - `instance()`: Owner, Token, Config, Deployment. Small, fixed-size
//!   contract config sharing one ledger entry and TTL.
//! - `persistent()`: Round, PurchaseNonce, Entries, per-player Tickets and
//!   per-round Winner records. Each write bumps the entry's TTL.
//!
//! ## Invariant
//! Within a round, `sum(Tickets(p)) == round.total_entries ==
//! sum(entry.tickets for entry in Entries)` and, while the ticket price is
//! unchanged, `round.prize_pool == round.total_entries * ticket_price`.

use soroban_sdk::{contracttype, Address, BytesN, Env, Vec};

use crate::Error;

/// Persistent storage TTL in ledgers (~30 days at 5 s/ledger).
pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Owner,
    Token,
    Config,
    Deployment,
    // --- persistent() ---
    /// State of the round currently selling tickets.
    Round,
    /// Purchases ever made; feeds the chain entropy.
    PurchaseNonce,
    /// Append-ordered purchases of the current round.
    Entries,
    /// Tickets held by a player in the current round.
    Tickets(Address),
    /// Result of a completed round, keyed by round number.
    Winner(u32),
}

/// Parameters fixed at `init`. Only `ticket_price` changes afterwards.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LotteryConfig {
    /// Price of one ticket in token base units. Always > 0.
    pub ticket_price: i128,
    /// Ticket slots that trigger the automatic draw. Always within 2..=100.
    pub min_players: u32,
    /// Cap on a player's tickets per round; 0 = unlimited.
    pub max_tickets_per_player: u32,
    /// Organizer cut in whole percent, 0..=20.
    pub organizer_fee_percent: u32,
    /// Round length in seconds; 0 = unlimited.
    pub duration_seconds: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundState {
    pub number: u32,
    pub is_active: bool,
    pub start_time: u64,
    pub prize_pool: i128,
    /// Ticket slots sold this round.
    pub total_entries: u32,
}

impl RoundState {
    pub fn opening(number: u32, start_time: u64) -> Self {
        RoundState {
            number,
            is_active: true,
            start_time,
            prize_pool: 0,
            total_entries: 0,
        }
    }
}

/// One purchase. Repeat buyers get one entry per purchase.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub player: Address,
    pub tickets: u32,
}

/// Immutable archive of a drawn round.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WinnerRecord {
    pub round: u32,
    pub winner: Address,
    /// Pool at draw time, before the fee.
    pub prize_pool: i128,
    pub fee: i128,
    /// Amount transferred to the winner.
    pub payout: i128,
    pub drawn_at: u64,
}

/// Where and how this instance was deployed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentRecord {
    pub contract: Address,
    pub network_id: BytesN<32>,
    pub deployer: Address,
    pub deployed_at: u64,
    pub parameters: LotteryConfig,
}

// ---------------------------------------------------------------------------
// Instance config
// ---------------------------------------------------------------------------

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Owner)
}

pub fn owner(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

pub fn set_owner(env: &Env, owner: &Address) {
    env.storage().instance().set(&DataKey::Owner, owner);
    bump_instance(env);
}

pub fn token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn config(env: &Env) -> Result<LotteryConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn set_config(env: &Env, config: &LotteryConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn deployment(env: &Env) -> Result<DeploymentRecord, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Deployment)
        .ok_or(Error::NotInitialized)
}

pub fn set_deployment(env: &Env, record: &DeploymentRecord) {
    env.storage().instance().set(&DataKey::Deployment, record);
    bump_instance(env);
}

// ---------------------------------------------------------------------------
// Round ledger
// ---------------------------------------------------------------------------

pub fn round(env: &Env) -> Result<RoundState, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Round)
        .ok_or(Error::NotInitialized)
}

pub fn set_round(env: &Env, round: &RoundState) {
    set_persistent(env, &DataKey::Round, round);
}

pub fn purchase_nonce(env: &Env) -> u64 {
    env.storage()
        .persistent()
        .get(&DataKey::PurchaseNonce)
        .unwrap_or(0)
}

pub fn set_purchase_nonce(env: &Env, nonce: u64) {
    set_persistent(env, &DataKey::PurchaseNonce, &nonce);
}

pub fn entries(env: &Env) -> Vec<Entry> {
    env.storage()
        .persistent()
        .get(&DataKey::Entries)
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_entries(env: &Env, entries: &Vec<Entry>) {
    set_persistent(env, &DataKey::Entries, entries);
}

pub fn ticket_count(env: &Env, player: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::Tickets(player.clone()))
        .unwrap_or(0)
}

pub fn set_ticket_count(env: &Env, player: &Address, count: u32) {
    set_persistent(env, &DataKey::Tickets(player.clone()), &count);
}

/// Drop every per-player counter and the entry list of the current round.
pub fn clear_round_ledger(env: &Env, entries: &Vec<Entry>) {
    for entry in entries.iter() {
        env.storage()
            .persistent()
            .remove(&DataKey::Tickets(entry.player));
    }
    env.storage().persistent().remove(&DataKey::Entries);
}

// ---------------------------------------------------------------------------
// Winner history
// ---------------------------------------------------------------------------

pub fn winner_record(env: &Env, round: u32) -> Option<WinnerRecord> {
    env.storage().persistent().get(&DataKey::Winner(round))
}

pub fn set_winner_record(env: &Env, record: &WinnerRecord) {
    set_persistent(env, &DataKey::Winner(record.round), record);
}

// ---------------------------------------------------------------------------
// TTL helpers
// ---------------------------------------------------------------------------

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}

fn set_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}
