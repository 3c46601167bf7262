use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use crate::fields::{determine_date_format, parse_date, DateFormat};

/// Everything a parse run extracts from a QIF file. The importer consumes
/// this; nothing in here references ledger state.
#[derive(Debug, Default)]
pub struct QifDocument {
    pub classes: Vec<QifClassItem>,
    pub categories: Vec<QifCategory>,
    pub securities: Vec<QifSecurity>,
    pub accounts: Vec<QifAccount>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

/// A category list entry (`!Type:Cat`). The name may be a colon-separated
/// path like "Auto:Gas".
#[derive(Debug, Default, Eq, PartialEq)]
pub struct QifCategory {
    pub name: String,
    pub description: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct QifClassItem {
    pub name: String,
    pub description: String,
}

/// A security list entry. Parsed so the file round-trips cleanly, but never
/// imported: investment accounts are skipped at the conversion stage.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct QifSecurity {
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QifSplitTransaction {
    pub category: String,
    pub memo: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QifTransaction {
    /// The raw date string as read from the file. Kept so dates can be
    /// re-resolved once the whole account is known and the date format has
    /// been inferred.
    pub odate: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub status: Option<String>,
    pub check_number: Option<String>,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub category: Option<String>,
    /// Investment fields, parsed but never converted.
    pub security: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub amount_trans: Option<String>,
    /// Assigned by the caller for partial imports, where the target account
    /// is known from the surrounding context rather than the file.
    pub transfer_account: Option<String>,
    pub splits: Vec<QifSplitTransaction>,
}

impl Default for QifTransaction {
    fn default() -> Self {
        QifTransaction {
            odate: String::new(),
            date: Local::now().date_naive(),
            amount: Decimal::ZERO,
            status: None,
            check_number: None,
            payee: None,
            memo: None,
            category: None,
            security: None,
            price: None,
            quantity: None,
            amount_trans: None,
            transfer_account: None,
            splits: Vec::new(),
        }
    }
}

impl QifTransaction {
    pub fn has_splits(&self) -> bool {
        !self.splits.is_empty()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct QifAccount {
    pub name: String,
    /// The raw QIF type code ("Bank", "CCard", "Invst", ...).
    pub kind: String,
    pub description: String,
    pub transactions: Vec<QifTransaction>,
}

impl QifAccount {
    /// Infers the date format from all raw transaction dates of this
    /// account. The format is a per-account decision, never per transaction.
    pub fn date_format(&self) -> DateFormat {
        determine_date_format(self.transactions.iter().map(|t| t.odate.as_str()))
    }

    /// Re-resolves every transaction and split date against the account-wide
    /// date format.
    pub fn reparse_dates(&mut self, format: DateFormat) {
        for transaction in &mut self.transactions {
            transaction.date = parse_date(&transaction.odate, format);
        }
    }

    /// Account identity for coalescing duplicate `!Account` declarations.
    /// `Invst` and `Port` count as the same type.
    pub fn is_duplicate_of(&self, other: &QifAccount) -> bool {
        self.name == other.name
            && self.description == other.description
            && type_class(&self.kind) == type_class(&other.kind)
    }
}

fn type_class(kind: &str) -> &str {
    match kind {
        "Invst" | "Port" => "Invst",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn transaction(odate: &str) -> QifTransaction {
        QifTransaction {
            odate: odate.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reparse_dates_switches_format() {
        let mut account = QifAccount {
            name: "Checking".to_string(),
            kind: "Bank".to_string(),
            transactions: vec![transaction("1/2/03"), transaction("21/2/07")],
            ..Default::default()
        };
        assert_eq!(account.date_format(), DateFormat::Eu);
        account.reparse_dates(account.date_format());
        assert_eq!(account.transactions[0].date, date(2003, 2, 1));
        assert_eq!(account.transactions[1].date, date(2007, 2, 21));
    }

    #[test]
    fn test_is_duplicate_of() {
        let account = |name: &str, kind: &str, description: &str| QifAccount {
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            ..Default::default()
        };
        let tests = [
            (
                account("Brokerage", "Invst", ""),
                account("Brokerage", "Port", ""),
                true,
            ),
            (
                account("Checking", "Bank", ""),
                account("Checking", "Bank", ""),
                true,
            ),
            (
                account("Checking", "Bank", ""),
                account("Savings", "Bank", ""),
                false,
            ),
            (
                account("Checking", "Bank", ""),
                account("Checking", "CCard", ""),
                false,
            ),
            (
                account("Checking", "Bank", "primary"),
                account("Checking", "Bank", ""),
                false,
            ),
        ];
        for (a, b, expected) in tests {
            assert_eq!(a.is_duplicate_of(&b), expected, "{:?} vs {:?}", a.name, b.kind);
        }
    }
}
