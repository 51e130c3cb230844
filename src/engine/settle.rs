use crate::core::identity::Name;
use crate::core::money::format_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Settlement parameters.
///
/// The soft cap is the preferred maximum number of outgoing transfers per
/// debtor; once reached, the remainder of the debt routes to the bank. The
/// hard cap is absolute: a debtor that cannot be settled within it fails the
/// whole run. The bank name is the display identity of the intermediary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleConfig {
    pub soft_cap: u32,
    pub hard_cap: u32,
    pub bank: Name,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            soft_cap: 3,
            hard_cap: 4,
            bank: Name::new("BANK"),
        }
    }
}

/// Errors arising from settlement.
#[derive(Debug, Error)]
pub enum SettleError {
    /// A debtor could not be fully settled within the hard cap. Settlement
    /// is all-or-nothing; no partial transfer list is ever returned.
    #[error("{debtor} exceeded hard cap of {hard_cap} outgoing transfers")]
    HardCapExceeded { debtor: Name, hard_cap: u32 },

    #[error("soft cap {soft_cap} exceeds hard cap {hard_cap}")]
    InvalidCaps { soft_cap: u32, hard_cap: u32 },
}

/// A single point-to-point payment: `from` pays `to` the given amount.
///
/// # Examples
///
/// ```
/// use payout_engine::engine::settle::Transfer;
/// use rust_decimal_macros::dec;
///
/// let t = Transfer::new("Dana", "Frankie", dec!(25));
/// assert_eq!(t.amount, dec!(25));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Name,
    pub to: Name,
    pub amount: Decimal,
}

impl Transfer {
    /// Create a new transfer.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive or sender equals recipient.
    pub fn new(from: impl Into<Name>, to: impl Into<Name>, amount: Decimal) -> Self {
        let from = from.into();
        let to = to.into();
        assert!(
            amount > Decimal::ZERO,
            "transfer amount must be positive, got {}",
            amount
        );
        assert!(from != to, "transfer sender and recipient must differ");
        Self { from, to, amount }
    }
}

/// Settle creditor and debtor lists into point-to-point transfers.
///
/// # Algorithm
///
/// 1. Creditors sort largest-first; debtors likewise, except the bank (if it
///    owes payouts) always goes last so player debts fund player payouts
///    before house cash does.
/// 2. Each debtor pays the largest remaining creditor until its debt is gone.
///    At the soft cap, or when no creditors remain, the rest of the debt
///    goes to the bank in one transfer. Needing more than the hard cap is a
///    [`SettleError::HardCapExceeded`].
/// 3. Creditors still owed after every debtor is processed are paid by the
///    bank, one transfer each.
///
/// Equal amounts tie-break ascending by display name, so the output is a
/// pure function of the input lists. This is a greedy heuristic, not a
/// minimum-transfer-count solver.
pub fn settle(
    creditors: &[(Name, Decimal)],
    debtors: &[(Name, Decimal)],
    config: &SettleConfig,
) -> Result<Vec<Transfer>, SettleError> {
    if config.soft_cap > config.hard_cap {
        return Err(SettleError::InvalidCaps {
            soft_cap: config.soft_cap,
            hard_cap: config.hard_cap,
        });
    }
    let bank = &config.bank;

    let mut creditors: VecDeque<(Name, Decimal)> = {
        let mut sorted = creditors.to_vec();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.into()
    };
    let debtors: Vec<(Name, Decimal)> = {
        let mut sorted = debtors.to_vec();
        sorted.sort_by(|a, b| {
            (a.0 == *bank)
                .cmp(&(b.0 == *bank))
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted
    };

    let mut transfers = Vec::new();
    let mut outgoing: BTreeMap<Name, u32> = BTreeMap::new();

    for (debtor, owed) in debtors {
        // Bank debt is house float, not a player debt: caps do not apply,
        // and the residual loop below pays every creditor the bank would.
        if debtor == *bank {
            continue;
        }
        let mut owe = owed;
        while owe > Decimal::ZERO {
            let count = outgoing.entry(debtor.clone()).or_insert(0);
            if *count >= config.hard_cap {
                return Err(SettleError::HardCapExceeded {
                    debtor,
                    hard_cap: config.hard_cap,
                });
            }
            if *count >= config.soft_cap || creditors.is_empty() {
                transfers.push(Transfer::new(debtor.clone(), bank.clone(), owe));
                *count += 1;
                break;
            }

            let (creditor, need) = creditors
                .front_mut()
                .expect("creditor queue checked non-empty");
            let pay = owe.min(*need);
            transfers.push(Transfer::new(debtor.clone(), creditor.clone(), pay));
            *count += 1;
            owe -= pay;
            *need -= pay;
            if *need == Decimal::ZERO {
                creditors.pop_front();
            }
        }
    }

    // Bank covers whatever the debtors could not.
    for (creditor, need) in creditors {
        if need > Decimal::ZERO && creditor != *bank {
            transfers.push(Transfer::new(bank.clone(), creditor, need));
        }
    }

    Ok(transfers)
}

/// Headline numbers for a settlement run, in the spirit of a clearing
/// report: how much moved, and how much of it peer-to-peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub transfer_count: usize,
    pub peer_count: usize,
    pub bank_count: usize,
    pub total_moved: Decimal,
    pub peer_moved: Decimal,
}

impl SettlementSummary {
    pub fn from_transfers(transfers: &[Transfer], bank: &Name) -> Self {
        let mut summary = Self {
            transfer_count: transfers.len(),
            peer_count: 0,
            bank_count: 0,
            total_moved: Decimal::ZERO,
            peer_moved: Decimal::ZERO,
        };
        for transfer in transfers {
            summary.total_moved += transfer.amount;
            if transfer.from == *bank || transfer.to == *bank {
                summary.bank_count += 1;
            } else {
                summary.peer_count += 1;
                summary.peer_moved += transfer.amount;
            }
        }
        summary
    }

    /// Share of moved money that settled peer-to-peer, as a percentage.
    pub fn peer_share_percent(&self) -> f64 {
        if self.total_moved == Decimal::ZERO {
            return 0.0;
        }
        let pct = self.peer_moved * Decimal::from(100) / self.total_moved;
        pct.to_string().parse::<f64>().unwrap_or(0.0)
    }
}

impl std::fmt::Display for SettlementSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Settlement Summary ===")?;
        writeln!(f, "Transfers:     {}", self.transfer_count)?;
        writeln!(f, "Peer to peer:  {}", self.peer_count)?;
        writeln!(f, "Via bank:      {}", self.bank_count)?;
        writeln!(f, "Total moved:   ${}", format_amount(self.total_moved))?;
        writeln!(f, "Peer share:    {:.1}%", self.peer_share_percent())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn side(entries: &[(&str, Decimal)]) -> Vec<(Name, Decimal)> {
        entries
            .iter()
            .map(|(name, amount)| (Name::new(*name), *amount))
            .collect()
    }

    #[test]
    fn test_single_debtor_single_creditor() {
        let transfers = settle(
            &side(&[("Winner", dec!(50))]),
            &side(&[("Loser", dec!(50))]),
            &SettleConfig::default(),
        )
        .unwrap();
        assert_eq!(transfers, vec![Transfer::new("Loser", "Winner", dec!(50))]);
    }

    #[test]
    fn test_largest_creditor_paid_first() {
        let transfers = settle(
            &side(&[("Small", dec!(20)), ("Big", dec!(80))]),
            &side(&[("Loser", dec!(100))]),
            &SettleConfig::default(),
        )
        .unwrap();
        assert_eq!(
            transfers,
            vec![
                Transfer::new("Loser", "Big", dec!(80)),
                Transfer::new("Loser", "Small", dec!(20)),
            ]
        );
    }

    #[test]
    fn test_soft_cap_overflows_to_bank() {
        let config = SettleConfig {
            soft_cap: 2,
            hard_cap: 4,
            ..Default::default()
        };
        let transfers = settle(
            &side(&[("A", dec!(10)), ("B", dec!(10)), ("C", dec!(10))]),
            &side(&[("Loser", dec!(30))]),
            &config,
        )
        .unwrap();
        // Two peer payments use the soft cap; the rest goes to the bank.
        assert_eq!(transfers.len(), 4);
        assert_eq!(transfers[2], Transfer::new("Loser", "BANK", dec!(10)));
        // The unpaid creditor is made whole by the bank.
        assert_eq!(transfers[3], Transfer::new("BANK", "C", dec!(10)));
    }

    #[test]
    fn test_hard_cap_is_fatal() {
        let config = SettleConfig {
            soft_cap: 1,
            hard_cap: 1,
            ..Default::default()
        };
        // One slot cannot cover a split across two creditors plus the
        // bank overflow the remainder would need.
        let result = settle(
            &side(&[("A", dec!(5)), ("B", dec!(5))]),
            &side(&[("Loser", dec!(10))]),
            &config,
        );
        assert!(matches!(
            result,
            Err(SettleError::HardCapExceeded { hard_cap: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_caps_rejected() {
        let config = SettleConfig {
            soft_cap: 5,
            hard_cap: 4,
            ..Default::default()
        };
        assert!(matches!(
            settle(&[], &[], &config),
            Err(SettleError::InvalidCaps { .. })
        ));
    }

    #[test]
    fn test_bank_debtor_goes_last() {
        let config = SettleConfig::default();
        let transfers = settle(
            &side(&[("Winner", dec!(100))]),
            &[
                (Name::new("BANK"), dec!(70)),
                (Name::new("Loser"), dec!(30)),
            ],
            &config,
        )
        .unwrap();
        // The player's debt funds the winner before house cash does,
        // despite the bank owing more.
        assert_eq!(
            transfers,
            vec![
                Transfer::new("Loser", "Winner", dec!(30)),
                Transfer::new("BANK", "Winner", dec!(70)),
            ]
        );
    }

    #[test]
    fn test_no_creditors_routes_to_bank() {
        let transfers = settle(
            &[],
            &side(&[("Loser", dec!(40))]),
            &SettleConfig::default(),
        )
        .unwrap();
        assert_eq!(transfers, vec![Transfer::new("Loser", "BANK", dec!(40))]);
    }

    #[test]
    fn test_leftover_creditors_paid_by_bank() {
        let transfers = settle(
            &side(&[("Winner", dec!(100))]),
            &side(&[("Loser", dec!(30))]),
            &SettleConfig::default(),
        )
        .unwrap();
        assert_eq!(
            transfers,
            vec![
                Transfer::new("Loser", "Winner", dec!(30)),
                Transfer::new("BANK", "Winner", dec!(70)),
            ]
        );
    }

    #[test]
    fn test_equal_amounts_tie_break_by_name() {
        let transfers = settle(
            &side(&[("Zoe", dec!(10)), ("Abe", dec!(10))]),
            &side(&[("Loser", dec!(20))]),
            &SettleConfig::default(),
        )
        .unwrap();
        assert_eq!(transfers[0].to, Name::new("Abe"));
        assert_eq!(transfers[1].to, Name::new("Zoe"));
    }

    #[test]
    fn test_settlement_is_deterministic() {
        let creditors = side(&[("A", dec!(35)), ("B", dec!(35)), ("C", dec!(10))]);
        let debtors = side(&[("X", dec!(40)), ("Y", dec!(40))]);
        let config = SettleConfig::default();
        let first = settle(&creditors, &debtors, &config).unwrap();
        let second = settle(&creditors, &debtors, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_counts() {
        let bank = Name::new("BANK");
        let transfers = vec![
            Transfer::new("A", "B", dec!(30)),
            Transfer::new("A", "BANK", dec!(10)),
            Transfer::new("BANK", "C", dec!(10)),
        ];
        let summary = SettlementSummary::from_transfers(&transfers, &bank);
        assert_eq!(summary.transfer_count, 3);
        assert_eq!(summary.peer_count, 1);
        assert_eq!(summary.bank_count, 2);
        assert_eq!(summary.total_moved, dec!(50));
        assert_eq!(summary.peer_moved, dec!(30));
    }

    #[test]
    fn test_summary_peer_share() {
        use approx::assert_relative_eq;

        let bank = Name::new("BANK");
        let transfers = vec![
            Transfer::new("A", "B", dec!(75)),
            Transfer::new("C", "BANK", dec!(25)),
        ];
        let summary = SettlementSummary::from_transfers(&transfers, &bank);
        assert_relative_eq!(summary.peer_share_percent(), 75.0, epsilon = 0.01);
    }
}
