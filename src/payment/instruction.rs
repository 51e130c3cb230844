use crate::core::identity::Name;
use crate::core::money::format_amount;
use crate::engine::settle::Transfer;
use crate::payment::directory::PaymentDirectory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Build the human-readable payment instruction for one recipient.
///
/// The bank gets a fixed internal-transfer description. Everyone else is
/// resolved through their aliases; a recipient missing from the directory
/// gets the default channel with an empty handle rather than failing the
/// run.
pub fn instruction_for(
    recipient: &Name,
    amount: Decimal,
    directory: &PaymentDirectory,
    bank: &Name,
) -> String {
    if recipient == bank {
        return format!("Internal bank transfer of ${}", format_amount(amount));
    }
    match directory.lookup(recipient) {
        Some(handles) if !handles.is_empty() => {
            let listed: Vec<String> = handles.iter().map(|h| format!("({h})")).collect();
            format!(
                "Pay user ${} on {}",
                format_amount(amount),
                listed.join(", ")
            )
        }
        _ => {
            log::warn!("no payment profile for {recipient:?}, using default channel");
            format!("Pay user ${} on (Venmo: )", format_amount(amount))
        }
    }
}

/// One finished output row: a transfer bound to its payment instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRow {
    pub from: Name,
    pub to: Name,
    /// Two-decimal amount string, e.g. `"12.50"`.
    pub amount: String,
    pub method: String,
}

/// Bind every transfer to its recipient's payment instruction.
pub fn bind(
    transfers: &[Transfer],
    directory: &PaymentDirectory,
    bank: &Name,
) -> Vec<PayoutRow> {
    transfers
        .iter()
        .map(|transfer| PayoutRow {
            from: transfer.from.clone(),
            to: transfer.to.clone(),
            amount: format_amount(transfer.amount),
            method: instruction_for(&transfer.to, transfer.amount, directory, bank),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::CanonicalKey;
    use crate::payment::directory::Handle;
    use rust_decimal_macros::dec;

    fn directory() -> PaymentDirectory {
        let mut directory = PaymentDirectory::new();
        directory.register(
            CanonicalKey::new("frankie"),
            &[
                Handle::new("Venmo", "frank-v"),
                Handle::new("Zelle", "555-0100"),
            ],
        );
        directory
    }

    #[test]
    fn test_bank_instruction() {
        let bank = Name::new("BANK");
        let text = instruction_for(&bank, dec!(42.5), &directory(), &bank);
        assert_eq!(text, "Internal bank transfer of $42.50");
    }

    #[test]
    fn test_known_recipient_lists_all_channels() {
        let bank = Name::new("BANK");
        let text = instruction_for(&Name::new("Frankie"), dec!(10), &directory(), &bank);
        assert_eq!(
            text,
            "Pay user $10.00 on (Venmo: @frank-v), (Zelle: 555-0100)"
        );
    }

    #[test]
    fn test_unknown_recipient_gets_default_channel() {
        let bank = Name::new("BANK");
        let text = instruction_for(&Name::new("Stranger"), dec!(7), &directory(), &bank);
        assert_eq!(text, "Pay user $7.00 on (Venmo: )");
    }

    #[test]
    fn test_bind_rows() {
        let bank = Name::new("BANK");
        let transfers = vec![
            Transfer::new("Dana", "Frankie", dec!(25)),
            Transfer::new("Dana", "BANK", dec!(5)),
        ];
        let rows = bind(&transfers, &directory(), &bank);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, "25.00");
        assert!(rows[0].method.starts_with("Pay user $25.00 on (Venmo"));
        assert_eq!(rows[1].method, "Internal bank transfer of $5.00");
    }
}
