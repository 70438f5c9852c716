//! Draw engine: pick a weighted winner, split the pool, archive the result,
//! pay out and roll the ledger over to the next round.
//!
//! All ledger writes happen before the token transfers. If either transfer
//! fails the draw returns `PayoutFailed` and the host discards every write
//! made by the invocation, so a failed draw leaves the round untouched.

use soroban_sdk::{log, token::TokenClient, Address, Env, Vec};

use crate::entropy::EntropySource;
use crate::storage::{self, Entry, RoundState, WinnerRecord};
use crate::{Error, WinnerDrawn};

/// Address owning ticket slot `slot`, walking entries in purchase order.
pub fn slot_owner(entries: &Vec<Entry>, slot: u32) -> Option<Address> {
    let mut upper: u32 = 0;
    for entry in entries.iter() {
        upper = upper.checked_add(entry.tickets)?;
        if slot < upper {
            return Some(entry.player);
        }
    }
    None
}

/// Run a draw for the current round. Eligibility and authorization are the
/// caller's responsibility.
pub fn execute<S: EntropySource>(env: &Env, source: &S) -> Result<WinnerRecord, Error> {
    let config = storage::config(env)?;
    let round = storage::round(env)?;
    let entries = storage::entries(env);

    let digest = source.seed(env);
    let slot = shared::winner_slot(&digest.to_array(), round.total_entries)
        .ok_or(Error::NotEligible)?;
    let winner = slot_owner(&entries, slot).ok_or(Error::NotEligible)?;

    let split = shared::split_prize(round.prize_pool, config.organizer_fee_percent)?;
    let now = env.ledger().timestamp();

    log!(env, "draw", round.number, round.total_entries, slot);

    let record = WinnerRecord {
        round: round.number,
        winner: winner.clone(),
        prize_pool: round.prize_pool,
        fee: split.fee,
        payout: split.payout,
        drawn_at: now,
    };
    storage::set_winner_record(env, &record);

    // Roll over before paying out.
    storage::clear_round_ledger(env, &entries);
    let next = round.number.checked_add(1).ok_or(Error::Overflow)?;
    storage::set_round(env, &RoundState::opening(next, now));

    let owner = storage::owner(env)?;
    let token = TokenClient::new(env, &storage::token(env)?);
    let contract = env.current_contract_address();
    pay(&token, &contract, &winner, split.payout)?;
    pay(&token, &contract, &owner, split.fee)?;

    WinnerDrawn {
        winner,
        round: round.number,
        payout: split.payout,
        fee: split.fee,
    }
    .publish(env);

    Ok(record)
}

fn pay(token: &TokenClient<'_>, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    match token.try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::PayoutFailed),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, vec, Env};

    #[test]
    fn test_slot_owner_weights_by_tickets() {
        let env = Env::default();
        let p1 = Address::generate(&env);
        let p2 = Address::generate(&env);
        let p3 = Address::generate(&env);

        let entries = vec![
            &env,
            Entry { player: p1.clone(), tickets: 3 },
            Entry { player: p2.clone(), tickets: 1 },
            Entry { player: p3.clone(), tickets: 2 },
        ];

        assert_eq!(slot_owner(&entries, 0), Some(p1.clone()));
        assert_eq!(slot_owner(&entries, 2), Some(p1));
        assert_eq!(slot_owner(&entries, 3), Some(p2));
        assert_eq!(slot_owner(&entries, 4), Some(p3.clone()));
        assert_eq!(slot_owner(&entries, 5), Some(p3));
        assert_eq!(slot_owner(&entries, 6), None);
    }

    #[test]
    fn test_slot_owner_repeat_buyer() {
        let env = Env::default();
        let p1 = Address::generate(&env);
        let p2 = Address::generate(&env);

        let entries = vec![
            &env,
            Entry { player: p1.clone(), tickets: 1 },
            Entry { player: p2.clone(), tickets: 1 },
            Entry { player: p1.clone(), tickets: 2 },
        ];

        assert_eq!(slot_owner(&entries, 1), Some(p2));
        assert_eq!(slot_owner(&entries, 2), Some(p1.clone()));
        assert_eq!(slot_owner(&entries, 3), Some(p1));
    }

    #[test]
    fn test_slot_owner_empty() {
        let env = Env::default();
        let entries: Vec<Entry> = Vec::new(&env);
        assert_eq!(slot_owner(&entries, 0), None);
    }
}
