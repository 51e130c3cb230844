//! Random ledger generation for stress testing.
//!
//! Produces participant rows whose books are internally consistent, so
//! settlement output can be reconciled back against them.

use crate::core::record::ParticipantRecord;
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Number of player rows.
    pub player_count: usize,
    /// Probability that a player is credit-tracked.
    pub credit_ratio: f64,
    /// Minimum win/loss magnitude.
    pub min_amount: Decimal,
    /// Maximum win/loss magnitude.
    pub max_amount: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            player_count: 10,
            credit_ratio: 0.5,
            min_amount: Decimal::from(20),
            max_amount: Decimal::from(500),
        }
    }
}

/// Generate a random ledger for testing.
///
/// Credit players split evenly between winners (positive P/L, matching sent
/// amount) and losers (negative P/L, matching send-out). Cash players buy in
/// up front; winners cash out their stack, busted players end at zero.
pub fn generate_random_ledger(config: &LedgerConfig) -> Vec<ParticipantRecord> {
    let mut rng = rand::thread_rng();
    let mut records = Vec::with_capacity(config.player_count);

    let credit_ratio = config.credit_ratio.clamp(0.0, 1.0);
    let min: f64 = config.min_amount.to_string().parse().unwrap_or(20.0);
    let max: f64 = config.max_amount.to_string().parse().unwrap_or(500.0);

    for i in 0..config.player_count {
        let name = format!("PLAYER-{:03}", i);
        let amount = Decimal::from_f64_retain(rng.gen_range(min..max))
            .unwrap_or(Decimal::from(20))
            .round_dp(2);
        let won = rng.gen_bool(0.5);

        let record = if rng.gen_bool(credit_ratio) {
            let record = ParticipantRecord::new(name.as_str(), true);
            if won {
                record.with_profit_loss(amount).with_sent(amount)
            } else {
                record.with_profit_loss(-amount).with_send_out(-amount)
            }
        } else {
            let buy_in = Decimal::from_f64_retain(rng.gen_range(min..max))
                .unwrap_or(Decimal::from(20))
                .round_dp(2);
            let record = ParticipantRecord::new(name.as_str(), false).with_received(buy_in);
            if won {
                let stack = buy_in + amount;
                record.with_ending_stack(stack).with_sent(stack)
            } else {
                record.with_ending_stack(Decimal::ZERO)
            }
        };
        records.push(record);
    }

    records
}
