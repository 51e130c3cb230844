use crate::core::identity::{ledger_aliases, profile_aliases, CanonicalKey, Name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;

/// One payment contact: a channel label and the handle on that channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub channel: String,
    pub handle: String,
}

impl Handle {
    /// Create a handle, applying channel-specific default prefixes:
    /// Venmo handles get a leading `@`, CashApp cashtags a leading `$`.
    pub fn new(channel: impl Into<String>, handle: impl Into<String>) -> Self {
        let channel = channel.into();
        let mut handle = handle.into();
        if channel.eq_ignore_ascii_case("venmo") && !handle.starts_with('@') {
            handle.insert(0, '@');
        }
        if channel.eq_ignore_ascii_case("cashapp") && !handle.starts_with('$') {
            handle.insert(0, '$');
        }
        Self { channel, handle }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.channel, self.handle)
    }
}

/// Alias-keyed lookup table of payment contacts.
///
/// Built from the externally-owned payment-methods CSV: one row per player
/// (the name cell may list several parenthetical aliases), one column per
/// channel. Every alias of a row resolves to that row's handles.
///
/// The engine only reads this table; it never fails a run over a missing
/// entry. Unresolved recipients fall back to a default channel at binding
/// time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDirectory {
    by_alias: BTreeMap<CanonicalKey, Vec<Handle>>,
}

impl PaymentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the directory from payment-methods CSV.
    ///
    /// The name column is matched by header (`Player Name`); every other
    /// column is treated as a payment channel.
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let name_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("Player Name"));

        let mut directory = Self::new();
        for row in csv_reader.records() {
            let row = row?;
            let name = name_col.and_then(|i| row.get(i)).unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }

            let mut handles = Vec::new();
            for (col, cell) in row.iter().enumerate() {
                if Some(col) == name_col {
                    continue;
                }
                let value = cell.trim();
                // Spreadsheet exports write empty cells as literal "nan".
                if value.is_empty() || value.eq_ignore_ascii_case("nan") {
                    continue;
                }
                let channel = headers.get(col).unwrap_or("").trim();
                if channel.is_empty() {
                    continue;
                }
                handles.push(Handle::new(channel, value));
            }

            for alias in profile_aliases(name) {
                directory.register(alias, &handles);
            }
        }
        Ok(directory)
    }

    /// Register handles under an alias, skipping duplicates.
    pub fn register(&mut self, alias: CanonicalKey, handles: &[Handle]) {
        let entry = self.by_alias.entry(alias).or_default();
        for handle in handles {
            if !entry.contains(handle) {
                entry.push(handle.clone());
            }
        }
    }

    /// Resolve a ledger display name to its handles, first matching alias
    /// wins.
    pub fn lookup(&self, name: &Name) -> Option<&[Handle]> {
        ledger_aliases(name.as_str())
            .iter()
            .find_map(|alias| self.by_alias.get(alias))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}
