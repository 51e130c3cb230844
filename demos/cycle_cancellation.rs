//! 3-cycle cancellation example.
//!
//! Demonstrates how a closed triangle of transfers nets away without
//! changing anyone's balance.

use payout_engine::core::identity::Name;
use payout_engine::engine::cycles::cancel_cycles;
use payout_engine::engine::settle::Transfer;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  payout-engine: Cycle Cancellation Example    ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let bank = Name::new("BANK");
    let transfers = vec![
        Transfer::new("Alice", "Bob", dec!(100)),
        Transfer::new("Bob", "Cara", dec!(80)),
        Transfer::new("Cara", "Alice", dec!(120)),
        Transfer::new("Dee", "BANK", dec!(25)),
    ];

    println!("Before cancellation:");
    for transfer in &transfers {
        println!("  {} → {}: ${}", transfer.from, transfer.to, transfer.amount);
    }

    // Alice → Bob → Cara → Alice closes a triangle; its bottleneck ($80)
    // nets away from every leg. The bank leg is real cash and stays.
    let reduced = cancel_cycles(&transfers, &bank);

    println!("\nAfter cancellation:");
    for transfer in &reduced {
        println!("  {} → {}: ${}", transfer.from, transfer.to, transfer.amount);
    }

    let before: rust_decimal::Decimal = transfers.iter().map(|t| t.amount).sum();
    let after: rust_decimal::Decimal = reduced.iter().map(|t| t.amount).sum();
    println!("\nGross moved before: ${before}");
    println!("Gross moved after:  ${after}");
    println!("Cancelled:          ${}", before - after);
}
