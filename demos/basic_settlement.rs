//! Basic ledger settlement example.
//!
//! Demonstrates how a session ledger turns into a small set of capped
//! payout transfers with payment instructions.

use payout_engine::core::identity::CanonicalKey;
use payout_engine::core::positions::PositionLedger;
use payout_engine::core::record::ParticipantRecord;
use payout_engine::engine::cycles::cancel_cycles;
use payout_engine::engine::settle::{settle, SettleConfig, SettlementSummary};
use payout_engine::payment::directory::{Handle, PaymentDirectory};
use payout_engine::payment::instruction::bind;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  payout-engine: Basic Settlement Example      ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    println!("Session ledger:");
    println!("  Frankie        cash player, $100 buy-in, cashes out $195");
    println!("  CSizzle (siz)  credit player, lost $120");
    println!("  Dana           credit player, lost $50");
    println!("  Joonga         credit player, won $80, $75 after fees\n");

    let records = vec![
        ParticipantRecord::new("Frankie", false)
            .with_received(dec!(100))
            .with_ending_stack(dec!(200))
            .with_sent(dec!(195)),
        ParticipantRecord::new("CSizzle (siz)", true)
            .with_profit_loss(dec!(-120))
            .with_send_out(dec!(-120)),
        ParticipantRecord::new("Dana", true)
            .with_profit_loss(dec!(-50))
            .with_send_out(dec!(-50)),
        ParticipantRecord::new("Joonga", true)
            .with_profit_loss(dec!(80))
            .with_sent(dec!(75)),
    ];

    let config = SettleConfig::default();
    let ledger = PositionLedger::from_records(&records);

    println!("━━━ Net Positions ━━━\n");
    for (key, amount) in ledger.positions() {
        let name = ledger.display_name(key).expect("display name recorded");
        println!("  {:<16} {:>8}", name.as_str(), amount.to_string());
    }
    println!("  {:<16} {:>8}\n", "BANK", ledger.bank_position().to_string());

    let (creditors, debtors) = ledger.settlement_sides(&config.bank);
    let transfers = settle(&creditors, &debtors, &config).expect("caps leave slack");
    let transfers = cancel_cycles(&transfers, &config.bank);

    let mut directory = PaymentDirectory::new();
    directory.register(
        CanonicalKey::new("frankie"),
        &[Handle::new("Venmo", "frank-v")],
    );
    directory.register(
        CanonicalKey::new("joonga"),
        &[Handle::new("Zelle", "555-0100")],
    );

    println!("━━━ Payout Transfers ━━━\n");
    for row in bind(&transfers, &directory, &config.bank) {
        println!("  {} → {}: ${}", row.from, row.to, row.amount);
        println!("      {}", row.method);
    }
    println!();

    print!(
        "{}",
        SettlementSummary::from_transfers(&transfers, &config.bank)
    );
}
