//! BlockLucky Lottery Contract
//!
//! A round-based lottery. Players buy tickets with a SEP-41 token; every
//! ticket is one weighted slot in the round's draw. The purchase that brings
//! the round to `min_players` slots draws a winner in the same invocation,
//! pays out `pool - fee` to the winner and `fee` to the owner, archives the
//! result and opens the next round.
//!
//! ## Round Lifecycle
//! - `Active`: tickets on sale. Initial state, round 1.
//! - Threshold purchase: the round is drawn and the next one opens `Active`.
//! - `stop_lottery` -> `Stopped`; `restart_lottery` -> `Active` again with a
//!   fresh start time. Stopping keeps the pool.
//! - A time-limited round that has elapsed stays `Active` but rejects sales
//!   with `RoundExpired` until the owner draws or restarts it.
//!
//! ## Atomicity
//! Each entrypoint runs as one host invocation. Any `Err` return discards
//! every storage write and token transfer made during that invocation, so a
//! rejected purchase or failed payout is never partially visible.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, token::TokenClient, Address, BytesN, Env,
    Vec,
};

use shared::{MAX_ORGANIZER_FEE_PERCENT, MIN_PLAYERS_CEILING, MIN_PLAYERS_FLOOR};

mod draw;
pub mod eligibility;
pub mod entropy;
pub mod storage;

use entropy::{ChainEntropy, ExternalSeed, NO_SEED};
pub use storage::{DeploymentRecord, Entry, LotteryConfig, RoundState, WinnerRecord};

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized     = 1,
    NotInitialized         = 2,
    NotAuthorized          = 3,
    /// Paid amount differs from `ticket_price * ticket_count`.
    InvalidAmount          = 4,
    ZeroTickets            = 5,
    InvalidTicketPrice     = 6,
    InvalidMinPlayers      = 7,
    InvalidOrganizerFee    = 8,
    /// The lottery is stopped.
    RoundInactive          = 9,
    /// The round's duration has elapsed.
    RoundExpired           = 10,
    PerPlayerLimitExceeded = 11,
    /// Tickets have already been sold this round.
    RoundInProgress        = 12,
    NotEligible            = 13,
    PayoutFailed           = 14,
    DirectPaymentRejected  = 15,
    AlreadyActive          = 16,
    Overflow               = 17,
}

impl From<shared::Error> for Error {
    fn from(err: shared::Error) -> Self {
        match err {
            shared::Error::InvalidAmount => Error::InvalidAmount,
            shared::Error::InvalidFee => Error::InvalidOrganizerFee,
            shared::Error::Overflow => Error::Overflow,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Initialized {
    #[topic]
    pub owner: Address,
    pub token: Address,
    pub ticket_price: i128,
    pub min_players: u32,
}

#[contractevent]
pub struct TicketPurchased {
    #[topic]
    pub player: Address,
    #[topic]
    pub round: u32,
    pub count: u32,
    pub amount: i128,
}

#[contractevent]
pub struct WinnerDrawn {
    #[topic]
    pub winner: Address,
    #[topic]
    pub round: u32,
    pub payout: i128,
    pub fee: i128,
}

#[contractevent]
pub struct LotteryStopped {
    pub owner: Address,
    pub round: u32,
}

#[contractevent]
pub struct LotteryRestarted {
    pub owner: Address,
    pub round: u32,
}

#[contractevent]
pub struct TicketPriceUpdated {
    pub old_price: i128,
    pub new_price: i128,
}

#[contractevent]
pub struct OwnershipTransferred {
    #[topic]
    pub previous_owner: Address,
    #[topic]
    pub new_owner: Address,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct BlockLucky;

#[contractimpl]
impl BlockLucky {
    // -----------------------------------------------------------------------
    // init
    // -----------------------------------------------------------------------

    /// Configure the lottery and open round 1. May only be called once.
    ///
    /// `token` is the SEP-41 contract tickets are paid in. `owner` receives
    /// the organizer fee and is the only address allowed to draw manually
    /// or change settings.
    pub fn init(env: Env, owner: Address, token: Address, config: LotteryConfig) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        validate_config(&config)?;
        owner.require_auth();

        let now = env.ledger().timestamp();
        storage::set_owner(&env, &owner);
        storage::set_token(&env, &token);
        storage::set_config(&env, &config);
        storage::set_round(&env, &RoundState::opening(1, now));
        storage::set_purchase_nonce(&env, 0);
        storage::set_deployment(
            &env,
            &DeploymentRecord {
                contract: env.current_contract_address(),
                network_id: env.ledger().network_id(),
                deployer: owner.clone(),
                deployed_at: now,
                parameters: config.clone(),
            },
        );

        Initialized {
            owner,
            token,
            ticket_price: config.ticket_price,
            min_players: config.min_players,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // buy_ticket
    // -----------------------------------------------------------------------

    /// Buy `ticket_count` tickets for the current round, paying `amount`.
    ///
    /// `amount` must equal `ticket_price * ticket_count` exactly; it is
    /// transferred from `player` to the contract. If the purchase brings the
    /// round to `min_players` slots, the winner is drawn within this call and
    /// the draw result is returned.
    pub fn buy_ticket(
        env: Env,
        player: Address,
        ticket_count: u32,
        amount: i128,
    ) -> Result<Option<WinnerRecord>, Error> {
        let config = storage::config(&env)?;

        if ticket_count == 0 {
            return Err(Error::ZeroTickets);
        }
        let expected = config
            .ticket_price
            .checked_mul(ticket_count as i128)
            .ok_or(Error::Overflow)?;
        if amount != expected {
            return Err(Error::InvalidAmount);
        }

        player.require_auth();

        let mut round = storage::round(&env)?;
        if !round.is_active {
            return Err(Error::RoundInactive);
        }
        if eligibility::is_expired(&config, &round, env.ledger().timestamp()) {
            return Err(Error::RoundExpired);
        }

        let held = storage::ticket_count(&env, &player)
            .checked_add(ticket_count)
            .ok_or(Error::Overflow)?;
        if config.max_tickets_per_player != 0 && held > config.max_tickets_per_player {
            return Err(Error::PerPlayerLimitExceeded);
        }

        let token = storage::token(&env)?;
        TokenClient::new(&env, &token).transfer(&player, env.current_contract_address(), &amount);

        let mut entries = storage::entries(&env);
        entries.push_back(Entry { player: player.clone(), tickets: ticket_count });
        storage::set_entries(&env, &entries);
        storage::set_ticket_count(&env, &player, held);

        round.prize_pool = round.prize_pool.checked_add(amount).ok_or(Error::Overflow)?;
        round.total_entries = round
            .total_entries
            .checked_add(ticket_count)
            .ok_or(Error::Overflow)?;
        storage::set_round(&env, &round);

        let nonce = storage::purchase_nonce(&env)
            .checked_add(1)
            .ok_or(Error::Overflow)?;
        storage::set_purchase_nonce(&env, nonce);

        TicketPurchased {
            player,
            round: round.number,
            count: ticket_count,
            amount,
        }
        .publish(&env);

        if eligibility::reaches_threshold(&config, &round) {
            return draw::execute(&env, &ChainEntropy::new(nonce)).map(Some);
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // draw_winner
    // -----------------------------------------------------------------------

    /// Draw the current round on the owner's request. Owner only.
    ///
    /// `seed` is mixed into the chain entropy; pass all zero bytes to rely
    /// on chain entropy alone. A seed from an out-of-band source (oracle,
    /// public beacon) makes the outcome harder for validators to steer.
    pub fn draw_winner(env: Env, caller: Address, seed: BytesN<32>) -> Result<WinnerRecord, Error> {
        require_owner(&env, &caller)?;

        let config = storage::config(&env)?;
        let round = storage::round(&env)?;
        if !eligibility::can_draw(&config, &round, env.ledger().timestamp()) {
            return Err(Error::NotEligible);
        }

        let chain = ChainEntropy::new(storage::purchase_nonce(&env));
        if seed.to_array() == NO_SEED {
            draw::execute(&env, &chain)
        } else {
            draw::execute(&env, &ExternalSeed::new(chain, seed))
        }
    }

    // -----------------------------------------------------------------------
    // Admin controls
    // -----------------------------------------------------------------------

    /// Halt ticket sales. The pool and entries stay in place. Owner only.
    pub fn stop_lottery(env: Env, caller: Address) -> Result<(), Error> {
        require_owner(&env, &caller)?;

        let mut round = storage::round(&env)?;
        if !round.is_active {
            return Err(Error::RoundInactive);
        }
        round.is_active = false;
        storage::set_round(&env, &round);

        LotteryStopped { owner: caller, round: round.number }.publish(&env);
        Ok(())
    }

    /// Resume ticket sales and restart the round clock. Owner only.
    ///
    /// Accepts a stopped round, or an active round whose time has run out.
    /// Entries and pool carry over in both cases.
    pub fn restart_lottery(env: Env, caller: Address) -> Result<(), Error> {
        require_owner(&env, &caller)?;

        let config = storage::config(&env)?;
        let mut round = storage::round(&env)?;
        let now = env.ledger().timestamp();
        if round.is_active && !eligibility::is_expired(&config, &round, now) {
            return Err(Error::AlreadyActive);
        }
        round.is_active = true;
        round.start_time = now;
        storage::set_round(&env, &round);

        LotteryRestarted { owner: caller, round: round.number }.publish(&env);
        Ok(())
    }

    /// Change the ticket price. Only allowed before the round sells its
    /// first ticket. Owner only.
    pub fn update_ticket_price(env: Env, caller: Address, new_price: i128) -> Result<(), Error> {
        require_owner(&env, &caller)?;

        if new_price <= 0 {
            return Err(Error::InvalidTicketPrice);
        }
        if storage::round(&env)?.total_entries > 0 {
            return Err(Error::RoundInProgress);
        }

        let mut config = storage::config(&env)?;
        let old_price = config.ticket_price;
        config.ticket_price = new_price;
        storage::set_config(&env, &config);

        TicketPriceUpdated { old_price, new_price }.publish(&env);
        Ok(())
    }

    /// Hand the contract to `new_owner`. Takes effect immediately. Owner only.
    pub fn transfer_ownership(env: Env, caller: Address, new_owner: Address) -> Result<(), Error> {
        require_owner(&env, &caller)?;

        storage::set_owner(&env, &new_owner);

        OwnershipTransferred {
            previous_owner: caller,
            new_owner,
        }
        .publish(&env);
        Ok(())
    }

    /// Value sent outside `buy_ticket` is refused; the prize pool only grows
    /// through ticket purchases.
    pub fn fund(_env: Env, _from: Address, _amount: i128) -> Result<(), Error> {
        Err(Error::DirectPaymentRejected)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn ticket_price(env: Env) -> Result<i128, Error> {
        Ok(storage::config(&env)?.ticket_price)
    }

    pub fn min_players(env: Env) -> Result<u32, Error> {
        Ok(storage::config(&env)?.min_players)
    }

    pub fn max_tickets_per_player(env: Env) -> Result<u32, Error> {
        Ok(storage::config(&env)?.max_tickets_per_player)
    }

    /// Organizer fee in whole percent.
    pub fn organizer_fee(env: Env) -> Result<u32, Error> {
        Ok(storage::config(&env)?.organizer_fee_percent)
    }

    pub fn round_number(env: Env) -> Result<u32, Error> {
        Ok(storage::round(&env)?.number)
    }

    pub fn is_active(env: Env) -> Result<bool, Error> {
        Ok(storage::round(&env)?.is_active)
    }

    /// Ticket slots sold in the current round.
    pub fn get_players_count(env: Env) -> Result<u32, Error> {
        Ok(storage::round(&env)?.total_entries)
    }

    pub fn get_prize_pool(env: Env) -> Result<i128, Error> {
        Ok(storage::round(&env)?.prize_pool)
    }

    /// Seconds until the round stops selling; 0 if unlimited or elapsed.
    pub fn get_time_remaining(env: Env) -> Result<u64, Error> {
        let config = storage::config(&env)?;
        let round = storage::round(&env)?;
        Ok(eligibility::time_remaining(&config, &round, env.ledger().timestamp()))
    }

    pub fn can_draw_winner(env: Env) -> Result<bool, Error> {
        let config = storage::config(&env)?;
        let round = storage::round(&env)?;
        Ok(eligibility::can_draw(&config, &round, env.ledger().timestamp()))
    }

    /// One address per ticket slot, in purchase order.
    pub fn get_players(env: Env) -> Result<Vec<Address>, Error> {
        require_initialized(&env)?;

        let mut players = Vec::new(&env);
        for entry in storage::entries(&env).iter() {
            for _ in 0..entry.tickets {
                players.push_back(entry.player.clone());
            }
        }
        Ok(players)
    }

    /// Purchases of the current round, in order.
    pub fn get_entries(env: Env) -> Result<Vec<Entry>, Error> {
        require_initialized(&env)?;
        Ok(storage::entries(&env))
    }

    pub fn get_ticket_count(env: Env, player: Address) -> Result<u32, Error> {
        require_initialized(&env)?;
        Ok(storage::ticket_count(&env, &player))
    }

    pub fn owner(env: Env) -> Result<Address, Error> {
        storage::owner(&env)
    }

    /// Winner of `round`, or `None` if that round was never drawn.
    pub fn get_winner(env: Env, round: u32) -> Result<Option<Address>, Error> {
        require_initialized(&env)?;
        Ok(storage::winner_record(&env, round).map(|r| r.winner))
    }

    /// Amount paid to the winner of `round`, after the organizer fee; 0 if
    /// that round was never drawn. The pre-fee pool is in
    /// `get_round_result(round).prize_pool`.
    pub fn get_prize_pool_history(env: Env, round: u32) -> Result<i128, Error> {
        require_initialized(&env)?;
        Ok(storage::winner_record(&env, round).map_or(0, |r| r.payout))
    }

    pub fn get_round_result(env: Env, round: u32) -> Result<Option<WinnerRecord>, Error> {
        require_initialized(&env)?;
        Ok(storage::winner_record(&env, round))
    }

    pub fn get_config(env: Env) -> Result<LotteryConfig, Error> {
        storage::config(&env)
    }

    pub fn get_round(env: Env) -> Result<RoundState, Error> {
        storage::round(&env)
    }

    pub fn get_deployment(env: Env) -> Result<DeploymentRecord, Error> {
        storage::deployment(&env)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_initialized(env: &Env) -> Result<(), Error> {
    if !storage::is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

/// Verify that `caller` is the stored owner and has signed the invocation.
fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
    let owner = storage::owner(env)?;
    caller.require_auth();
    if caller != &owner {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn validate_config(config: &LotteryConfig) -> Result<(), Error> {
    if config.ticket_price <= 0 {
        return Err(Error::InvalidTicketPrice);
    }
    if config.min_players < MIN_PLAYERS_FLOOR || config.min_players > MIN_PLAYERS_CEILING {
        return Err(Error::InvalidMinPlayers);
    }
    if config.organizer_fee_percent > MAX_ORGANIZER_FEE_PERCENT {
        return Err(Error::InvalidOrganizerFee);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
