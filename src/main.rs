//! payout-engine CLI
//!
//! Settle a session ledger from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle a ledger into payout transfers
//! payout-engine settle --ledger session.csv --methods payment_methods.csv
//!
//! # Tighter caps, JSON output
//! payout-engine settle --ledger session.csv --soft 2 --hard 3 --format json
//!
//! # Verify a produced payout file against the raw ledger(s)
//! payout-engine check --ledger session.csv --payouts session_payouts.csv
//!
//! # Generate a random ledger for testing
//! payout-engine generate --players 20 --output test.csv
//! ```

use payout_engine::core::identity::Name;
use payout_engine::core::money::parse_amount;
use payout_engine::core::positions::PositionLedger;
use payout_engine::core::record::{read_ledger, write_ledger, ParticipantRecord};
use payout_engine::engine::cycles::cancel_cycles;
use payout_engine::engine::reconcile::reconcile;
use payout_engine::engine::settle::{
    settle, SettleConfig, SettleError, SettlementSummary, Transfer,
};
use payout_engine::payment::directory::PaymentDirectory;
use payout_engine::payment::instruction::{bind, PayoutRow};
use payout_engine::simulation::random_ledger::{generate_random_ledger, LedgerConfig};
use rust_decimal::Decimal;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process;

fn print_usage() {
    eprintln!(
        r#"payout-engine — settle shared-stakes game ledgers into payout transfers

USAGE:
    payout-engine <COMMAND> [OPTIONS]

COMMANDS:
    settle      Settle a ledger into a payout transfer table
    check       Verify a payout table against the raw ledger(s)
    generate    Generate a random ledger (for testing)
    help        Show this message

OPTIONS (settle):
    --ledger <FILE>     Path to the session ledger CSV (required)
    --methods <FILE>    Path to the payment-methods CSV
    --soft <N>          Soft cap on outgoing transfers per debtor (default: 3)
    --hard <N>          Hard cap on outgoing transfers per debtor (default: 4)
    --bank <NAME>       Display name of the bank intermediary (default: BANK)
    --format <FORMAT>   Output format: csv (default) or json
    --output <FILE>     Write to file instead of stdout

OPTIONS (check):
    --ledger <FILE>     Raw ledger CSV; repeat for multiple sessions
    --payouts <FILE>    Payout CSV produced by `settle` (required)
    --bank <NAME>       Display name of the bank intermediary (default: BANK)

OPTIONS (generate):
    --players <N>       Number of player rows (default: 10)
    --credit-ratio <R>  Share of credit-tracked players, 0..1 (default: 0.5)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    payout-engine settle --ledger "Ledger Data/6_25_25.csv" --methods methods.csv
    payout-engine settle --ledger session.csv --soft 2 --hard 3 --output payouts.csv
    payout-engine check --ledger session.csv --payouts payouts.csv
    payout-engine generate --players 30 --credit-ratio 0.7 --output test.csv"#
    );
}

fn open_input(path: &str) -> fs::File {
    if !Path::new(path).exists() {
        eprintln!("Error: input file not found: {path}");
        process::exit(1);
    }
    fs::File::open(path).unwrap_or_else(|e| {
        eprintln!("Error opening '{path}': {e}");
        process::exit(1);
    })
}

fn load_records(path: &str) -> Vec<ParticipantRecord> {
    read_ledger(open_input(path)).unwrap_or_else(|e| {
        eprintln!("Error reading ledger '{path}': {e}");
        process::exit(1);
    })
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> &'a str {
    *i += 1;
    args.get(*i).map(String::as_str).unwrap_or_else(|| {
        eprintln!("{flag} requires a value");
        process::exit(1);
    })
}

fn write_payouts_csv<W: std::io::Write>(writer: W, rows: &[PayoutRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["From", "To", "Amount", "Method"])?;
    for row in rows {
        csv_writer.write_record([
            row.from.as_str(),
            row.to.as_str(),
            &row.amount,
            &row.method,
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn cmd_settle(args: &[String]) {
    let mut ledger_path = None;
    let mut methods_path = None;
    let mut config = SettleConfig::default();
    let mut format = "csv".to_string();
    let mut output_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ledger" => ledger_path = Some(flag_value(args, &mut i, "--ledger").to_string()),
            "--methods" => methods_path = Some(flag_value(args, &mut i, "--methods").to_string()),
            "--soft" => {
                config.soft_cap = flag_value(args, &mut i, "--soft").parse().unwrap_or_else(|_| {
                    eprintln!("--soft requires a number");
                    process::exit(1);
                })
            }
            "--hard" => {
                config.hard_cap = flag_value(args, &mut i, "--hard").parse().unwrap_or_else(|_| {
                    eprintln!("--hard requires a number");
                    process::exit(1);
                })
            }
            "--bank" => config.bank = Name::new(flag_value(args, &mut i, "--bank")),
            "--format" => format = flag_value(args, &mut i, "--format").to_string(),
            "--output" => output_path = Some(flag_value(args, &mut i, "--output").to_string()),
            other => {
                eprintln!("Unknown option: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let ledger_path = ledger_path.unwrap_or_else(|| {
        eprintln!("Error: --ledger <FILE> is required");
        process::exit(1);
    });

    let records = load_records(&ledger_path);
    let directory = match methods_path {
        Some(path) => PaymentDirectory::from_csv_reader(open_input(&path)).unwrap_or_else(|e| {
            eprintln!("Error reading payment methods '{path}': {e}");
            process::exit(1);
        }),
        None => {
            log::warn!("no --methods file given; every payout gets the default channel");
            PaymentDirectory::new()
        }
    };

    let positions = PositionLedger::from_records(&records);
    let (creditors, debtors) = positions.settlement_sides(&config.bank);
    let transfers = settle(&creditors, &debtors, &config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        let code = match e {
            SettleError::HardCapExceeded { .. } => 2,
            _ => 1,
        };
        process::exit(code);
    });
    let transfers = cancel_cycles(&transfers, &config.bank);
    let rows = bind(&transfers, &directory, &config.bank);
    let summary = SettlementSummary::from_transfers(&transfers, &config.bank);

    let rendered = if format == "json" {
        let mut out = serde_json::to_string_pretty(&rows).unwrap();
        out.push('\n');
        out
    } else {
        let mut buf = Vec::new();
        write_payouts_csv(&mut buf, &rows).unwrap_or_else(|e| {
            eprintln!("Error writing payouts: {e}");
            process::exit(1);
        });
        String::from_utf8(buf).expect("CSV output is UTF-8")
    };

    match output_path {
        Some(path) => {
            fs::write(&path, rendered).unwrap_or_else(|e| {
                eprintln!("Error writing to '{path}': {e}");
                process::exit(1);
            });
            eprintln!(
                "Wrote {} transfers to {path} (soft cap={}, hard cap={})",
                rows.len(),
                config.soft_cap,
                config.hard_cap
            );
        }
        None => {
            print!("{rendered}");
            std::io::stdout().flush().ok();
        }
    }
    eprint!("{summary}");
}

fn read_payouts(path: &str) -> Vec<Transfer> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(open_input(path));
    let headers = csv_reader
        .headers()
        .unwrap_or_else(|e| {
            eprintln!("Error reading payouts '{path}': {e}");
            process::exit(1);
        })
        .clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .unwrap_or_else(|| {
                eprintln!("Error: payouts file '{path}' has no '{wanted}' column");
                process::exit(1);
            })
    };
    let from_col = column("From");
    let to_col = column("To");
    let amount_col = column("Amount");

    let mut transfers = Vec::new();
    for row in csv_reader.records() {
        let row = row.unwrap_or_else(|e| {
            eprintln!("Error reading payouts '{path}': {e}");
            process::exit(1);
        });
        let cell = |col: usize| row.get(col).unwrap_or("").trim();
        let amount = parse_amount(cell(amount_col)).unwrap_or_else(|| {
            eprintln!("Error: bad amount {:?} in '{path}'", cell(amount_col));
            process::exit(1);
        });
        if amount == Decimal::ZERO {
            continue;
        }
        transfers.push(Transfer {
            from: Name::new(cell(from_col)),
            to: Name::new(cell(to_col)),
            amount,
        });
    }
    transfers
}

fn cmd_check(args: &[String]) {
    let mut ledger_paths: Vec<String> = Vec::new();
    let mut payouts_path = None;
    let mut bank = Name::new("BANK");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ledger" => ledger_paths.push(flag_value(args, &mut i, "--ledger").to_string()),
            "--payouts" => payouts_path = Some(flag_value(args, &mut i, "--payouts").to_string()),
            "--bank" => bank = Name::new(flag_value(args, &mut i, "--bank")),
            other => {
                eprintln!("Unknown option: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    if ledger_paths.is_empty() {
        eprintln!("Error: at least one --ledger <FILE> is required");
        process::exit(1);
    }
    let payouts_path = payouts_path.unwrap_or_else(|| {
        eprintln!("Error: --payouts <FILE> is required");
        process::exit(1);
    });

    let mut records = Vec::new();
    for path in &ledger_paths {
        records.extend(load_records(path));
    }
    let transfers = read_payouts(&payouts_path);

    let mismatches = reconcile(&records, &transfers, &bank);
    if mismatches.is_empty() {
        println!("Every player (and the bank) is fully settled.");
    } else {
        eprintln!("Mismatches:");
        for mismatch in &mismatches {
            eprintln!("  {mismatch}");
        }
        process::exit(1);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = LedgerConfig::default();
    let mut output_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--players" => {
                config.player_count = flag_value(args, &mut i, "--players")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--players requires a number");
                        process::exit(1);
                    })
            }
            "--credit-ratio" => {
                config.credit_ratio = flag_value(args, &mut i, "--credit-ratio")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--credit-ratio requires a number in 0..1");
                        process::exit(1);
                    })
            }
            "--output" => output_path = Some(flag_value(args, &mut i, "--output").to_string()),
            other => {
                eprintln!("Unknown option: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let records = generate_random_ledger(&config);
    match output_path {
        Some(path) => {
            let file = fs::File::create(&path).unwrap_or_else(|e| {
                eprintln!("Error creating '{path}': {e}");
                process::exit(1);
            });
            write_ledger(file, &records).unwrap_or_else(|e| {
                eprintln!("Error writing ledger: {e}");
                process::exit(1);
            });
            eprintln!("Generated {} player rows → {path}", records.len());
        }
        None => {
            write_ledger(std::io::stdout(), &records).unwrap_or_else(|e| {
                eprintln!("Error writing ledger: {e}");
                process::exit(1);
            });
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "settle" => cmd_settle(rest),
        "check" => cmd_check(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {command}");
            print_usage();
            process::exit(1);
        }
    }
}
