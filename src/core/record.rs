use crate::core::identity::Name;
use crate::core::money::parse_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io;

/// One participant-session row of the input ledger.
///
/// Monetary fields are optional: spreadsheet exports leave blanks, and a
/// blank (or unparsable) cell means zero. Accessors apply that default, so
/// classification code never sees an `Option`.
///
/// # Examples
///
/// ```
/// use payout_engine::core::record::ParticipantRecord;
/// use rust_decimal_macros::dec;
///
/// let row = ParticipantRecord::new("CSizzle (siz)", true)
///     .with_profit_loss(dec!(-50))
///     .with_send_out(dec!(-50));
///
/// assert_eq!(row.profit_loss(), dec!(-50));
/// assert_eq!(row.received(), dec!(0));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Display name as written in the ledger, aliases included.
    name: Name,
    /// Whether the player played on credit and settles after the session.
    credit_tracked: bool,
    /// Whether this row has already been settled and must be skipped.
    settled: bool,
    /// Cash the house received up front from this player.
    received: Option<Decimal>,
    /// Chip value the player ended the session with.
    ending_stack: Option<Decimal>,
    /// The player's net profit or loss for the session.
    profit_loss: Option<Decimal>,
    /// Debt magnitude to collect when the player lost on credit.
    send_out: Option<Decimal>,
    /// Post-fee amount owed to the player when they are paid out.
    sent: Option<Decimal>,
}

impl ParticipantRecord {
    pub fn new(name: impl Into<Name>, credit_tracked: bool) -> Self {
        Self {
            name: name.into(),
            credit_tracked,
            settled: false,
            received: None,
            ending_stack: None,
            profit_loss: None,
            send_out: None,
            sent: None,
        }
    }

    pub fn with_received(mut self, amount: Decimal) -> Self {
        self.received = Some(amount);
        self
    }

    pub fn with_ending_stack(mut self, amount: Decimal) -> Self {
        self.ending_stack = Some(amount);
        self
    }

    pub fn with_profit_loss(mut self, amount: Decimal) -> Self {
        self.profit_loss = Some(amount);
        self
    }

    pub fn with_send_out(mut self, amount: Decimal) -> Self {
        self.send_out = Some(amount);
        self
    }

    pub fn with_sent(mut self, amount: Decimal) -> Self {
        self.sent = Some(amount);
        self
    }

    pub fn with_settled(mut self, settled: bool) -> Self {
        self.settled = settled;
        self
    }

    // --- Accessors (blank cells default to zero) ---

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn credit_tracked(&self) -> bool {
        self.credit_tracked
    }

    pub fn settled(&self) -> bool {
        self.settled
    }

    pub fn received(&self) -> Decimal {
        self.received.unwrap_or(Decimal::ZERO)
    }

    pub fn ending_stack(&self) -> Decimal {
        self.ending_stack.unwrap_or(Decimal::ZERO)
    }

    pub fn profit_loss(&self) -> Decimal {
        self.profit_loss.unwrap_or(Decimal::ZERO)
    }

    pub fn send_out(&self) -> Decimal {
        self.send_out.unwrap_or(Decimal::ZERO)
    }

    pub fn sent(&self) -> Decimal {
        self.sent.unwrap_or(Decimal::ZERO)
    }
}

/// Ledger CSV column order, also used when generating test ledgers.
pub const LEDGER_COLUMNS: [&str; 8] = [
    "Player Name",
    "Credit?",
    "$ Received",
    "Ending Stack",
    "P/L Player",
    "Send Out",
    "$ Sent",
    "Done?",
];

fn is_affirmative(cell: &str) -> bool {
    cell.trim().eq_ignore_ascii_case("yes")
}

/// Parse a money cell: blank means "not recorded", garbage is logged and
/// likewise treated as absent (the accessors default both to zero).
fn money_cell(column: &str, cell: &str) -> Option<Decimal> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_amount(trimmed) {
        Some(amount) => Some(amount),
        None => {
            log::warn!("unparsable {column} value {trimmed:?}, treating as zero");
            None
        }
    }
}

/// Read ledger rows from CSV.
///
/// Columns are matched by header name, so extra columns and reordered
/// layouts are fine. Rows without a usable player name are skipped with a
/// warning.
pub fn read_ledger<R: io::Read>(reader: R) -> Result<Vec<ParticipantRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    };

    let name_col = column("Player Name");
    let credit_col = column("Credit?");
    let received_col = column("$ Received");
    let ending_col = column("Ending Stack");
    let pl_col = column("P/L Player");
    let send_out_col = column("Send Out");
    let sent_col = column("$ Sent");
    let done_col = column("Done?");

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let cell = |col: Option<usize>| col.and_then(|i| row.get(i)).unwrap_or("");

        let name = cell(name_col).trim();
        if name.is_empty() {
            log::warn!("ledger row with empty player name, skipping");
            continue;
        }

        let mut record = ParticipantRecord::new(name, is_affirmative(cell(credit_col)))
            .with_settled(is_affirmative(cell(done_col)));
        record.received = money_cell("$ Received", cell(received_col));
        record.ending_stack = money_cell("Ending Stack", cell(ending_col));
        record.profit_loss = money_cell("P/L Player", cell(pl_col));
        record.send_out = money_cell("Send Out", cell(send_out_col));
        record.sent = money_cell("$ Sent", cell(sent_col));
        records.push(record);
    }
    Ok(records)
}

/// Write ledger rows as CSV in the canonical column order.
pub fn write_ledger<W: io::Write>(
    writer: W,
    records: &[ParticipantRecord],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(LEDGER_COLUMNS)?;
    for record in records {
        let money = |value: Option<Decimal>| {
            value.map(|v| v.to_string()).unwrap_or_default()
        };
        csv_writer.write_record([
            record.name().as_str().to_string(),
            if record.credit_tracked() { "Yes" } else { "No" }.to_string(),
            money(record.received),
            money(record.ending_stack),
            money(record.profit_loss),
            money(record.send_out),
            money(record.sent),
            if record.settled() { "Yes" } else { "" }.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
