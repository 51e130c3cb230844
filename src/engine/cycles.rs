use crate::core::identity::Name;
use crate::engine::settle::Transfer;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Bound on cancellation passes. Every successful pass removes at least one
/// edge, so this is only ever reached on malformed input.
const MAX_CANCELLATION_ROUNDS: usize = 10_000;

/// Weighted directed graph of transfers, one edge per (sender, recipient).
///
/// Amounts for duplicate pairs are summed; self-edges are dropped. The edge
/// map is ordered, so the scan order and the re-expanded transfer list are a
/// pure function of the input.
#[derive(Debug, Clone, Default)]
pub struct TransferGraph {
    edges: BTreeMap<(Name, Name), Decimal>,
}

impl TransferGraph {
    pub fn from_transfers(transfers: &[Transfer]) -> Self {
        let mut graph = Self::default();
        for transfer in transfers {
            if transfer.from != transfer.to && transfer.amount != Decimal::ZERO {
                *graph
                    .edges
                    .entry((transfer.from.clone(), transfer.to.clone()))
                    .or_insert(Decimal::ZERO) += transfer.amount;
            }
        }
        graph
    }

    /// Aggregated amount owed from `from` to `to`.
    pub fn edge(&self, from: &Name, to: &Name) -> Decimal {
        self.edges
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Cancel one triangle if any exists: distinct non-bank a, b, c with
    /// positive edges a→b, b→c, c→a. The minimum of the three weights is
    /// subtracted from each edge, removing those that reach zero.
    fn cancel_one_triangle(&mut self, bank: &Name) -> bool {
        let keys: Vec<(Name, Name)> = self.edges.keys().cloned().collect();
        for (a, b) in &keys {
            if a == bank || b == bank {
                continue;
            }
            for (b2, c) in &keys {
                if b2 != b || c == bank || c == a {
                    continue;
                }
                let closing = (c.clone(), a.clone());
                if !self.edges.contains_key(&closing) {
                    continue;
                }
                let ab = self.edges[&(a.clone(), b.clone())];
                let bc = self.edges[&(b.clone(), c.clone())];
                let ca = self.edges[&closing];
                let slack = ab.min(bc).min(ca);

                for key in [(a.clone(), b.clone()), (b.clone(), c.clone()), closing] {
                    let weight = self.edges.get_mut(&key).expect("triangle edge present");
                    *weight -= slack;
                    if *weight == Decimal::ZERO {
                        self.edges.remove(&key);
                    }
                }
                return true;
            }
        }
        false
    }

    /// Cancel triangles until none remain (or the round bound trips).
    ///
    /// Edges incident to the bank are never touched: a bank leg is a real
    /// cash movement, not a peer debt that can net away.
    pub fn cancel_triangles(&mut self, bank: &Name) {
        let mut rounds = 0;
        while rounds < MAX_CANCELLATION_ROUNDS {
            if !self.cancel_one_triangle(bank) {
                return;
            }
            rounds += 1;
        }
        log::warn!("cycle cancellation stopped at the {MAX_CANCELLATION_ROUNDS}-round bound");
    }

    /// Re-expand the edge set into transfers, lexicographic by sender then
    /// recipient.
    pub fn into_transfers(self) -> Vec<Transfer> {
        self.edges
            .into_iter()
            .map(|((from, to), amount)| Transfer { from, to, amount })
            .collect()
    }
}

/// Remove 3-node circular chains from a transfer list.
///
/// A triangle of transfers nets to no real money movement, so it can be
/// subtracted out without changing anyone's balance. Duplicate (from, to)
/// pairs are merged and the result is deterministically ordered.
///
/// # Examples
///
/// ```
/// use payout_engine::core::identity::Name;
/// use payout_engine::engine::cycles::cancel_cycles;
/// use payout_engine::engine::settle::Transfer;
/// use rust_decimal_macros::dec;
///
/// let transfers = vec![
///     Transfer::new("A", "B", dec!(10)),
///     Transfer::new("B", "C", dec!(10)),
///     Transfer::new("C", "A", dec!(10)),
/// ];
/// assert!(cancel_cycles(&transfers, &Name::new("BANK")).is_empty());
/// ```
pub fn cancel_cycles(transfers: &[Transfer], bank: &Name) -> Vec<Transfer> {
    let mut graph = TransferGraph::from_transfers(transfers);
    graph.cancel_triangles(bank);
    graph.into_transfers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bank() -> Name {
        Name::new("BANK")
    }

    #[test]
    fn test_perfect_triangle_cancels_fully() {
        let transfers = vec![
            Transfer::new("A", "B", dec!(10)),
            Transfer::new("B", "C", dec!(10)),
            Transfer::new("C", "A", dec!(10)),
        ];
        assert!(cancel_cycles(&transfers, &bank()).is_empty());
    }

    #[test]
    fn test_asymmetric_triangle_leaves_residue() {
        let transfers = vec![
            Transfer::new("A", "B", dec!(100)),
            Transfer::new("B", "C", dec!(80)),
            Transfer::new("C", "A", dec!(120)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        // The bottleneck (80) is subtracted from every leg.
        assert_eq!(
            reduced,
            vec![
                Transfer::new("A", "B", dec!(20)),
                Transfer::new("C", "A", dec!(40)),
            ]
        );
    }

    #[test]
    fn test_bank_edges_untouched() {
        let transfers = vec![
            Transfer::new("A", "B", dec!(10)),
            Transfer::new("B", "BANK", dec!(10)),
            Transfer::new("BANK", "A", dec!(10)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        assert_eq!(reduced.len(), 3);
    }

    #[test]
    fn test_two_cycles_not_cancelled() {
        // Mutual debts are not a triangle; they survive untouched.
        let transfers = vec![
            Transfer::new("A", "B", dec!(10)),
            Transfer::new("B", "A", dec!(7)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn test_duplicate_pairs_merge() {
        let transfers = vec![
            Transfer::new("A", "B", dec!(10)),
            Transfer::new("A", "B", dec!(5)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        assert_eq!(reduced, vec![Transfer::new("A", "B", dec!(15))]);
    }

    #[test]
    fn test_output_sorted_by_sender_then_recipient() {
        let transfers = vec![
            Transfer::new("Zoe", "Abe", dec!(1)),
            Transfer::new("Abe", "Zoe", dec!(2)),
            Transfer::new("Abe", "Mia", dec!(3)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        assert_eq!(
            reduced,
            vec![
                Transfer::new("Abe", "Mia", dec!(3)),
                Transfer::new("Abe", "Zoe", dec!(2)),
                Transfer::new("Zoe", "Abe", dec!(1)),
            ]
        );
    }

    #[test]
    fn test_overlapping_triangles_all_cancel() {
        // Two triangles sharing the A→B edge.
        let transfers = vec![
            Transfer::new("A", "B", dec!(20)),
            Transfer::new("B", "C", dec!(10)),
            Transfer::new("C", "A", dec!(10)),
            Transfer::new("B", "D", dec!(10)),
            Transfer::new("D", "A", dec!(10)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());
        assert!(reduced.is_empty());
    }

    #[test]
    fn test_cancellation_preserves_net_flow() {
        let transfers = vec![
            Transfer::new("A", "B", dec!(100)),
            Transfer::new("B", "C", dec!(80)),
            Transfer::new("C", "A", dec!(120)),
            Transfer::new("A", "BANK", dec!(5)),
        ];
        let reduced = cancel_cycles(&transfers, &bank());

        let net = |name: &str, list: &[Transfer]| -> Decimal {
            let name = Name::new(name);
            list.iter()
                .map(|t| {
                    if t.to == name {
                        t.amount
                    } else if t.from == name {
                        -t.amount
                    } else {
                        Decimal::ZERO
                    }
                })
                .sum()
        };

        for who in ["A", "B", "C", "BANK"] {
            assert_eq!(net(who, &transfers), net(who, &reduced), "net flow of {who}");
        }
    }
}
