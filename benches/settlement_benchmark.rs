use criterion::{black_box, criterion_group, criterion_main, Criterion};
use payout_engine::core::positions::PositionLedger;
use payout_engine::engine::cycles::cancel_cycles;
use payout_engine::engine::settle::{settle, SettleConfig};
use payout_engine::simulation::random_ledger::{generate_random_ledger, LedgerConfig};

fn run_pipeline(records: &[payout_engine::core::record::ParticipantRecord]) {
    let config = SettleConfig::default();
    let ledger = PositionLedger::from_records(records);
    let (creditors, debtors) = ledger.settlement_sides(&config.bank);
    let transfers = settle(&creditors, &debtors, &config).expect("hard cap above soft cap");
    black_box(cancel_cycles(&transfers, &config.bank));
}

fn bench_settlement_10_players(c: &mut Criterion) {
    let config = LedgerConfig {
        player_count: 10,
        ..Default::default()
    };
    let records = generate_random_ledger(&config);

    c.bench_function("settlement_10_players", |b| {
        b.iter(|| run_pipeline(black_box(&records)))
    });
}

fn bench_settlement_100_players(c: &mut Criterion) {
    let config = LedgerConfig {
        player_count: 100,
        ..Default::default()
    };
    let records = generate_random_ledger(&config);

    c.bench_function("settlement_100_players", |b| {
        b.iter(|| run_pipeline(black_box(&records)))
    });
}

fn bench_settlement_1000_players(c: &mut Criterion) {
    let config = LedgerConfig {
        player_count: 1000,
        ..Default::default()
    };
    let records = generate_random_ledger(&config);

    c.bench_function("settlement_1000_players", |b| {
        b.iter(|| run_pipeline(black_box(&records)))
    });
}

criterion_group!(
    benches,
    bench_settlement_10_players,
    bench_settlement_100_players,
    bench_settlement_1000_players
);
criterion_main!(benches);
