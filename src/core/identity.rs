use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name of a settlement participant, as it appeared in the ledger.
///
/// A name can carry one or more parenthetical aliases, e.g.
/// `"CSizzle (siz)"`. The name is kept verbatim for output; identity
/// comparisons go through [`CanonicalKey`] instead.
///
/// # Examples
///
/// ```
/// use payout_engine::core::identity::Name;
///
/// let a = Name::new("CSizzle (siz)");
/// let b = Name::new("Frankie");
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the string representation of this name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Normalized identity key owning a net balance.
///
/// Keys are lowercase with leading `.` / `@` stripped, so `"@Frankie"`,
/// `".frankie"` and `"Frankie"` all collapse to `frankie`. Every alias of a
/// player resolves to the same key, letting repeated ledger rows net together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase a raw alias token and strip leading `.` or `@` markers.
///
/// Payment apps prefix handles (`@venmo-user`, `.cashtag`); identity
/// resolution must not care about those markers.
fn clean(token: &str) -> String {
    token.trim().trim_start_matches(['.', '@']).trim().to_lowercase()
}

/// Extract the text inside every balanced `( … )` group, in order.
fn parenthetical_groups(raw: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        match after.find(')') {
            Some(close) if close > 0 => {
                groups.push(&after[..close]);
                rest = &after[close + 1..];
            }
            Some(close) => rest = &after[close + 1..],
            None => break,
        }
    }
    groups
}

/// All alias keys of a ledger display name, primary alias first.
///
/// The primary alias is the first whitespace-delimited token before any
/// parenthesis; each parenthetical group contributes one more alias.
///
/// # Examples
///
/// ```
/// use payout_engine::core::identity::ledger_aliases;
///
/// let aliases = ledger_aliases("CSizzle (siz)");
/// let keys: Vec<&str> = aliases.iter().map(|a| a.as_str()).collect();
/// assert_eq!(keys, vec!["csizzle", "siz"]);
/// ```
pub fn ledger_aliases(raw: &str) -> Vec<CanonicalKey> {
    let mut aliases: Vec<CanonicalKey> = Vec::new();
    let mut push = |alias: String| {
        if !alias.is_empty() && !aliases.iter().any(|a| a.as_str() == alias) {
            aliases.push(CanonicalKey::new(alias));
        }
    };

    let head: String = raw
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(')
        .collect();
    push(clean(&head));

    for group in parenthetical_groups(raw) {
        push(clean(group));
    }
    aliases
}

/// All alias keys of a payment-profile display name, primary alias first.
///
/// Profile rows list aliases more loosely than the ledger, e.g.
/// `"(frankie2119), (Frankie)"` or `"Frank (frankie)"`. The full head before
/// the first parenthesis (trimmed of spaces and commas) is the primary alias;
/// each parenthetical group contributes one more.
pub fn profile_aliases(raw: &str) -> Vec<CanonicalKey> {
    let mut aliases: Vec<CanonicalKey> = Vec::new();
    let mut push = |alias: String| {
        if !alias.is_empty() && !aliases.iter().any(|a| a.as_str() == alias) {
            aliases.push(CanonicalKey::new(alias));
        }
    };

    let head = raw.split('(').next().unwrap_or("").trim_matches([' ', ',']);
    push(clean(head));

    for group in parenthetical_groups(raw) {
        push(clean(group));
    }
    aliases
}

/// The canonical key owning a ledger name's balance: its primary alias.
///
/// Falls back to the cleaned whole string for degenerate names; returns
/// `None` when nothing usable remains.
pub fn canonical_key(raw: &str) -> Option<CanonicalKey> {
    if let Some(first) = ledger_aliases(raw).into_iter().next() {
        return Some(first);
    }
    let fallback = clean(raw);
    if fallback.is_empty() {
        None
    } else {
        Some(CanonicalKey::new(fallback))
    }
}
