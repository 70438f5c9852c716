//! Entropy for the winner draw.
//!
//! ## Fairness Model
//! `ChainEntropy` hashes ledger timestamp, ledger sequence and the running
//! purchase count. It is NOT secure: validators and late buyers can bias
//! it. `ExternalSeed` mixes a caller-supplied seed (oracle output, beacon
//! value, dice roll) into the same chain entropy so that neither party
//! alone controls the outcome.
//!
//! Every source ends in `mix_seed`:
//!
//!   `sha256(internal || external_seed)`
//!
//! where `external_seed` is 32 bytes, all zero when no seed was supplied.

use soroban_sdk::{Bytes, BytesN, Env};

/// External seed value meaning "no seed supplied".
pub const NO_SEED: [u8; 32] = [0u8; 32];

/// Produces the 32-byte digest a draw is decided by.
pub trait EntropySource {
    fn seed(&self, env: &Env) -> BytesN<32>;
}

/// Ledger-derived entropy. Weak; see the module docs.
#[derive(Clone, Copy, Debug)]
pub struct ChainEntropy {
    pub nonce: u64,
}

impl ChainEntropy {
    pub fn new(nonce: u64) -> Self {
        ChainEntropy { nonce }
    }

    /// `sha256(timestamp_be || sequence_be || nonce_be)`.
    pub fn chain_state(&self, env: &Env) -> BytesN<32> {
        let mut preimage = [0u8; 20];
        preimage[..8].copy_from_slice(&env.ledger().timestamp().to_be_bytes());
        preimage[8..12].copy_from_slice(&env.ledger().sequence().to_be_bytes());
        preimage[12..].copy_from_slice(&self.nonce.to_be_bytes());
        env.crypto().sha256(&Bytes::from_slice(env, &preimage)).into()
    }
}

impl EntropySource for ChainEntropy {
    fn seed(&self, env: &Env) -> BytesN<32> {
        mix_seed(env, &self.chain_state(env), &BytesN::from_array(env, &NO_SEED))
    }
}

/// Chain entropy strengthened with a 256-bit seed from outside the ledger.
#[derive(Clone, Debug)]
pub struct ExternalSeed {
    pub chain: ChainEntropy,
    pub seed: BytesN<32>,
}

impl ExternalSeed {
    pub fn new(chain: ChainEntropy, seed: BytesN<32>) -> Self {
        ExternalSeed { chain, seed }
    }
}

impl EntropySource for ExternalSeed {
    fn seed(&self, env: &Env) -> BytesN<32> {
        mix_seed(env, &self.chain.chain_state(env), &self.seed)
    }
}

/// Combine internal entropy with an external seed.
///
/// Preimage is 64 bytes: internal (32) || external seed (32).
pub fn mix_seed(env: &Env, internal: &BytesN<32>, external: &BytesN<32>) -> BytesN<32> {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&internal.to_array());
    preimage[32..].copy_from_slice(&external.to_array());
    env.crypto().sha256(&Bytes::from_slice(env, &preimage)).into()
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Ledger, Env};

    #[test]
    fn test_mix_seed_is_deterministic() {
        let env = Env::default();
        let internal = BytesN::from_array(&env, &[7u8; 32]);
        let a = BytesN::from_array(&env, &[42u8; 32]);
        let b = BytesN::from_array(&env, &[43u8; 32]);
        assert_eq!(mix_seed(&env, &internal, &a), mix_seed(&env, &internal, &a));
        assert_ne!(mix_seed(&env, &internal, &a), mix_seed(&env, &internal, &b));
    }

    #[test]
    fn test_mix_seed_uses_every_seed_byte() {
        let env = Env::default();
        let internal = BytesN::from_array(&env, &[7u8; 32]);
        let base = mix_seed(&env, &internal, &BytesN::from_array(&env, &NO_SEED));

        // a seed differing only in its high bytes must still move the digest
        let mut high = NO_SEED;
        high[0] = 1;
        let mut low = NO_SEED;
        low[31] = 1;
        let from_high = mix_seed(&env, &internal, &BytesN::from_array(&env, &high));
        let from_low = mix_seed(&env, &internal, &BytesN::from_array(&env, &low));
        assert_ne!(from_high, base);
        assert_ne!(from_low, base);
        assert_ne!(from_high, from_low);
    }

    #[test]
    fn test_external_seed_changes_outcome() {
        let env = Env::default();
        let chain = ChainEntropy::new(3);
        let plain = chain.seed(&env);
        let seeded = ExternalSeed::new(chain, BytesN::from_array(&env, &[0xab; 32])).seed(&env);
        assert_ne!(plain, seeded);
        // an all-zero seed is the same as no seed
        let zero = ExternalSeed::new(chain, BytesN::from_array(&env, &NO_SEED));
        assert_eq!(zero.seed(&env), plain);
    }

    #[test]
    fn test_chain_entropy_tracks_ledger_and_nonce() {
        let env = Env::default();
        let a = ChainEntropy::new(1).seed(&env);
        let b = ChainEntropy::new(2).seed(&env);
        assert_ne!(a, b);

        env.ledger().set_timestamp(1_700_000_000);
        let c = ChainEntropy::new(1).seed(&env);
        assert_ne!(a, c);

        env.ledger().set_sequence_number(99);
        let d = ChainEntropy::new(1).seed(&env);
        assert_ne!(c, d);
    }
}
