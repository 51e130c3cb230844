use crate::core::identity::{CanonicalKey, Name};
use crate::core::money::format_amount;
use crate::core::positions::PositionLedger;
use crate::core::record::ParticipantRecord;
use crate::engine::settle::Transfer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One identity whose transfers do not square with the ledger.
///
/// `expected` is the pre-settlement net position; `actual` is the identity's
/// incoming minus outgoing transfer total. They must be equal for everyone,
/// the bank included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mismatch {
    pub name: Name,
    pub expected: Decimal,
    pub actual: Decimal,
}

impl Mismatch {
    /// What is still owed (positive) or overpaid (negative).
    pub fn residual(&self) -> Decimal {
        self.expected - self.actual
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, transfers net {}, residual {}",
            self.name,
            format_amount(self.expected),
            format_amount(self.actual),
            format_amount(self.residual()),
        )
    }
}

/// Verify a transfer list against the raw ledger rows it settles.
///
/// Recomputes every net position from scratch, sums each identity's signed
/// transfer flow, and reports every identity whose residual is non-zero.
/// The bank is included; its expected position is the negation of the cash
/// float. An empty result means the ledger is fully settled.
pub fn reconcile(
    records: &[ParticipantRecord],
    transfers: &[Transfer],
    bank: &Name,
) -> Vec<Mismatch> {
    let ledger = PositionLedger::from_records(records);

    let mut expected: BTreeMap<CanonicalKey, Decimal> = BTreeMap::new();
    for (key, amount) in ledger.positions() {
        expected.insert(key.clone(), amount);
    }

    let mut actual: BTreeMap<CanonicalKey, Decimal> = BTreeMap::new();
    let mut bank_actual = Decimal::ZERO;
    let mut flow = |name: &Name, signed: Decimal| {
        if name == bank {
            bank_actual += signed;
        } else if let Some(key) = ledger.resolve(name.as_str()) {
            *actual.entry(key).or_insert(Decimal::ZERO) += signed;
        } else {
            log::warn!("transfer names unknown identity {name:?}");
        }
    };
    for transfer in transfers {
        flow(&transfer.from, -transfer.amount);
        flow(&transfer.to, transfer.amount);
    }

    let mut mismatches = Vec::new();
    let keys: Vec<CanonicalKey> = expected
        .keys()
        .chain(actual.keys())
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    for key in keys {
        let want = expected.get(&key).copied().unwrap_or(Decimal::ZERO);
        let got = actual.get(&key).copied().unwrap_or(Decimal::ZERO);
        if want != got {
            let name = ledger
                .display_name(&key)
                .cloned()
                .unwrap_or_else(|| Name::new(key.as_str()));
            mismatches.push(Mismatch {
                name,
                expected: want,
                actual: got,
            });
        }
    }

    if ledger.bank_position() != bank_actual {
        mismatches.push(Mismatch {
            name: bank.clone(),
            expected: ledger.bank_position(),
            actual: bank_actual,
        });
    }

    mismatches.sort_by(|a, b| a.name.cmp(&b.name));
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cycles::cancel_cycles;
    use crate::engine::settle::{settle, SettleConfig};
    use rust_decimal_macros::dec;

    // Consistent books: the winner's $100 payout is covered by their own
    // $50 buy-in (held as house float) plus the credit loser's $50 debt.
    fn sample_records() -> Vec<ParticipantRecord> {
        vec![
            ParticipantRecord::new("Frankie", false)
                .with_received(dec!(50))
                .with_ending_stack(dec!(100))
                .with_sent(dec!(100)),
            ParticipantRecord::new("CSizzle (siz)", true)
                .with_profit_loss(dec!(-50))
                .with_send_out(dec!(-50)),
        ]
    }

    fn settle_records(records: &[ParticipantRecord], config: &SettleConfig) -> Vec<Transfer> {
        let ledger = PositionLedger::from_records(records);
        let (creditors, debtors) = ledger.settlement_sides(&config.bank);
        let transfers = settle(&creditors, &debtors, config).unwrap();
        cancel_cycles(&transfers, &config.bank)
    }

    #[test]
    fn test_settled_output_reconciles_clean() {
        let config = SettleConfig::default();
        let records = sample_records();
        let transfers = settle_records(&records, &config);
        assert!(reconcile(&records, &transfers, &config.bank).is_empty());
    }

    #[test]
    fn test_tampered_amount_is_flagged() {
        let config = SettleConfig::default();
        let records = sample_records();
        let mut transfers = settle_records(&records, &config);
        transfers[0].amount += dec!(1);

        let mismatches = reconcile(&records, &transfers, &config.bank);
        assert!(!mismatches.is_empty());
        assert!(mismatches.iter().any(|m| m.residual() != Decimal::ZERO));
    }

    #[test]
    fn test_missing_transfer_names_both_sides() {
        let config = SettleConfig::default();
        let records = sample_records();
        let mismatches = reconcile(&records, &[], &config.bank);
        // Nobody moved money: winner, loser and the bank all show up.
        assert_eq!(mismatches.len(), 3);
    }

    #[test]
    fn test_alias_in_transfer_resolves() {
        let config = SettleConfig::default();
        let records = sample_records();
        // Payouts written against the alias instead of the full display name.
        let transfers = vec![
            Transfer::new("siz", "Frankie", dec!(50)),
            Transfer::new("BANK", "Frankie", dec!(50)),
        ];
        assert!(reconcile(&records, &transfers, &config.bank).is_empty());
    }

    #[test]
    fn test_inconsistent_ledger_surfaces_on_bank() {
        // Winner owed more than the house took in: the bank eats the
        // difference and the reconciler must say so when no transfer covers
        // it.
        let records = vec![ParticipantRecord::new("Frankie", false)
            .with_received(dec!(40))
            .with_ending_stack(dec!(50))
            .with_sent(dec!(50))];
        let bank = Name::new("BANK");
        let transfers = vec![Transfer::new("BANK", "Frankie", dec!(50))];

        let mismatches = reconcile(&records, &transfers, &bank);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].name, bank);
        assert_eq!(mismatches[0].expected, dec!(-40));
        assert_eq!(mismatches[0].actual, dec!(-50));
    }
}
