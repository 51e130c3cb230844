use crate::core::identity::{canonical_key, ledger_aliases, CanonicalKey, Name};
use crate::core::record::ParticipantRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net position of every participant plus the bank's cash float.
///
/// Positive balance: the house/peers owe this identity money (net creditor).
/// Negative balance: this identity owes money (net debtor).
///
/// Rows are classified in two regimes:
///
/// - **Not credit-tracked** — the player bought in with real funds; their
///   buy-in goes into the bank float, and a positive ending stack means they
///   are owed their post-fee sent amount.
/// - **Credit-tracked** — the player settles after the fact; a loss books the
///   absolute send-out amount against them, a win books the post-fee sent
///   amount for them.
///
/// Repeated rows for the same person net into one balance: two display
/// strings sharing any alias resolve to the same canonical key. Ordered maps
/// keep iteration, and therefore every downstream transfer list, independent
/// of hash seeding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    /// Canonical identity -> signed net balance.
    positions: BTreeMap<CanonicalKey, Decimal>,
    /// Every alias seen -> the canonical identity owning its balance.
    aliases: BTreeMap<CanonicalKey, CanonicalKey>,
    /// Canonical identity -> first display name seen for it.
    display: BTreeMap<CanonicalKey, Name>,
    /// Cash the house received up front from non-credit players.
    bank_float: Decimal,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify all rows into a ledger.
    pub fn from_records(records: &[ParticipantRecord]) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.apply(record);
        }
        ledger
    }

    /// Look up the canonical owner of a display string without registering it.
    ///
    /// Any alias of the string that has been seen before resolves to the
    /// balance owner it was registered under; otherwise the string's own
    /// primary alias is returned.
    pub fn resolve(&self, raw: &str) -> Option<CanonicalKey> {
        let aliases = raw_aliases(raw);
        aliases
            .iter()
            .find_map(|alias| self.aliases.get(alias).cloned())
            .or_else(|| aliases.into_iter().next())
    }

    /// Resolve and register every alias of a display string.
    fn register(&mut self, raw: &str) -> Option<CanonicalKey> {
        let aliases = raw_aliases(raw);
        let owner = aliases
            .iter()
            .find_map(|alias| self.aliases.get(alias).cloned())
            .or_else(|| aliases.first().cloned())?;
        for alias in aliases {
            self.aliases.entry(alias).or_insert_with(|| owner.clone());
        }
        Some(owner)
    }

    /// Classify one row and merge its effect into the running positions.
    ///
    /// Already-settled rows and rows with no usable name contribute nothing.
    pub fn apply(&mut self, record: &ParticipantRecord) {
        if record.settled() {
            return;
        }
        let Some(key) = self.register(record.name().as_str()) else {
            log::warn!("row with unusable player name {:?}, skipping", record.name());
            return;
        };
        self.display
            .entry(key.clone())
            .or_insert_with(|| record.name().clone());

        if !record.credit_tracked() {
            self.bank_float += record.received();
            if record.ending_stack() > Decimal::ZERO {
                *self.positions.entry(key).or_insert(Decimal::ZERO) += record.sent();
            }
        } else {
            let pl = record.profit_loss();
            if pl < Decimal::ZERO {
                *self.positions.entry(key).or_insert(Decimal::ZERO) -=
                    record.send_out().abs();
            } else if pl > Decimal::ZERO {
                *self.positions.entry(key).or_insert(Decimal::ZERO) += record.sent();
            }
        }
    }

    /// Net balance of one identity (zero when unknown).
    pub fn position(&self, key: &CanonicalKey) -> Decimal {
        self.positions.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    /// First display name seen for an identity.
    pub fn display_name(&self, key: &CanonicalKey) -> Option<&Name> {
        self.display.get(key)
    }

    /// All non-zero positions in key order.
    pub fn positions(&self) -> impl Iterator<Item = (&CanonicalKey, Decimal)> + '_ {
        self.positions
            .iter()
            .filter(|(_, amount)| **amount != Decimal::ZERO)
            .map(|(key, amount)| (key, *amount))
    }

    /// Cash the house is holding from up-front buy-ins.
    pub fn bank_float(&self) -> Decimal {
        self.bank_float
    }

    /// The bank's own net position: float held is float owed out.
    pub fn bank_position(&self) -> Decimal {
        -self.bank_float
    }

    /// Sum of every position including the bank's.
    ///
    /// Zero for internally consistent ledger data; any residual is absorbed
    /// by the bank during settlement.
    pub fn total_imbalance(&self) -> Decimal {
        self.positions.values().sum::<Decimal>() + self.bank_position()
    }

    /// Identities owed money, as (display name, amount due), key order.
    pub fn creditors(&self) -> Vec<(Name, Decimal)> {
        self.positions
            .iter()
            .filter(|(_, balance)| **balance > Decimal::ZERO)
            .map(|(key, balance)| (self.display[key].clone(), *balance))
            .collect()
    }

    /// Identities owing money, as (display name, amount owed), key order.
    pub fn debtors(&self) -> Vec<(Name, Decimal)> {
        self.positions
            .iter()
            .filter(|(_, balance)| **balance < Decimal::ZERO)
            .map(|(key, balance)| (self.display[key].clone(), balance.abs()))
            .collect()
    }

    /// Creditor and debtor lists with the bank slotted onto the correct side.
    ///
    /// A positive float means the bank owes payouts (debtor); a negative
    /// float means the bank is due money (creditor).
    pub fn settlement_sides(&self, bank: &Name) -> (Vec<(Name, Decimal)>, Vec<(Name, Decimal)>) {
        let mut creditors = self.creditors();
        let mut debtors = self.debtors();
        if self.bank_float > Decimal::ZERO {
            debtors.push((bank.clone(), self.bank_float));
        } else if self.bank_float < Decimal::ZERO {
            creditors.push((bank.clone(), -self.bank_float));
        }
        (creditors, debtors)
    }
}

/// Aliases of a display string, with the cleaned whole string as fallback
/// for degenerate names that yield none.
fn raw_aliases(raw: &str) -> Vec<CanonicalKey> {
    let aliases = ledger_aliases(raw);
    if aliases.is_empty() {
        canonical_key(raw).into_iter().collect()
    } else {
        aliases
    }
}
