//! The QIF format is badly underspecified and every exporter emits a
//! different dialect, so this parser works by brute force: a dispatcher over
//! header lines and a prefix switch per section, no grammar. AutoSwitch
//! headers are consumed and ignored wholesale since not even Quicken uses
//! them consistently.

use std::io::{self, BufRead};
use std::mem;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::document::{
    CategoryKind, QifAccount, QifCategory, QifClassItem, QifDocument, QifSecurity,
    QifSplitTransaction, QifTransaction,
};
use crate::fields::parse_money;
use crate::reader::QifReader;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("read error: {0}")]
    Io(#[from] io::Error),
    #[error("the file contains transactions without an account context; import it against a preselected account")]
    NoAccountContext,
    #[error("unexpected line: {0}")]
    UnexpectedLine(String),
    #[error("the file does not start with a transaction type header")]
    NotPartialFile,
}

/// Case-insensitive prefix test. QIF headers show up in any capitalization.
fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// A file is "full" iff a structural header appears before any
/// transaction-only header. Files that open with `!Type:Bank` and friends
/// are online statements for a single, externally known account.
pub fn is_full_file<R: BufRead>(reader: &mut QifReader<R>) -> io::Result<bool> {
    while let Some(line) = reader.read_line()? {
        for header in [
            "!Type:Class",
            "!Type:Cat",
            "!Account",
            "!Type:Memorized",
            "!Type:Security",
            "!Type:Prices",
        ] {
            if starts_with_ignore_case(&line, header) {
                return Ok(true);
            }
        }
        for header in ["!Type:Bank", "!Type:CCard", "!Type:Oth", "!Type:Cash"] {
            if starts_with_ignore_case(&line, header) {
                return Ok(false);
            }
        }
    }
    Ok(false)
}

#[derive(Debug, Default)]
pub struct QifParser {
    document: QifDocument,
}

impl QifParser {
    pub fn new() -> Self {
        QifParser::default()
    }

    pub fn document(&self) -> &QifDocument {
        &self.document
    }

    pub fn into_document(self) -> QifDocument {
        self.document
    }

    /// Parses a full QIF export: the top-level loop reads successive header
    /// lines and routes to a section handler. Once the whole file is read,
    /// every account's dates are re-resolved with the account-wide format.
    pub fn parse_full<R: BufRead>(&mut self, reader: &mut QifReader<R>) -> Result<(), ParseError> {
        while let Some(line) = reader.read_line()? {
            if starts_with_ignore_case(&line, "!Type:Class") {
                self.parse_class_list(reader)?;
            } else if starts_with_ignore_case(&line, "!Type:Cat") {
                self.parse_category_list(reader)?;
            } else if starts_with_ignore_case(&line, "!Account") {
                self.parse_account(reader)?;
            } else if starts_with_ignore_case(&line, "!Type:Memorized") {
                parse_memorized_transactions(reader)?;
            } else if starts_with_ignore_case(&line, "!Type:Security") {
                self.parse_security_list(reader)?;
            } else if starts_with_ignore_case(&line, "!Type:Prices") {
                parse_price_records(reader)?;
            } else if ["!Type:Bank", "!Type:CCard", "!Type:Oth", "!Type:Cash"]
                .iter()
                .any(|header| starts_with_ignore_case(&line, header))
            {
                return Err(ParseError::NoAccountContext);
            } else if starts_with_ignore_case(&line, "!Option:AutoSwitch") {
                info!("consuming !Option:AutoSwitch");
            } else if starts_with_ignore_case(&line, "!Clear:AutoSwitch") {
                info!("consuming !Clear:AutoSwitch");
            } else {
                error!(line = %line, "unrecognized header");
            }
        }
        self.resolve_dates();
        Ok(())
    }

    /// Parses a partial file (an online statement): transactions only, no
    /// account headers. They land in an anonymous holding account; the
    /// caller knows which real account the statement belongs to.
    pub fn parse_partial<R: BufRead>(
        &mut self,
        reader: &mut QifReader<R>,
    ) -> Result<(), ParseError> {
        match reader.peek_line()? {
            Some(peek) if starts_with_ignore_case(peek, "!Type:") => (),
            _ => return Err(ParseError::NotPartialFile),
        }
        let mut account = QifAccount::default();
        parse_account_transactions(reader, &mut account)?;
        let format = account.date_format();
        account.reparse_dates(format);
        self.document.accounts.push(account);
        Ok(())
    }

    fn resolve_dates(&mut self) {
        for account in &mut self.document.accounts {
            let format = account.date_format();
            account.reparse_dates(format);
        }
    }

    /// Handles an `!Account` section. On each record terminator the next
    /// line is peeked to decide what follows: more account headers (an
    /// account list), transactions for the account just read, or the end of
    /// the list. Exporters often emit the same account twice (once empty in
    /// a list, later with its transactions), so before parsing transactions
    /// a duplicate declaration is searched for and reused.
    fn parse_account<R: BufRead>(&mut self, reader: &mut QifReader<R>) -> Result<(), ParseError> {
        let mut account = QifAccount::default();

        while let Some(line) = reader.read_line()? {
            if let Some(rest) = line.strip_prefix('N') {
                account.name = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('T') {
                account.kind = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('D') {
                account.description = rest.to_string();
            } else if line.starts_with('L') {
                debug!("ignoring credit limit");
            } else if line.starts_with('/') {
                debug!("ignoring statement balance date");
            } else if line.starts_with('$') {
                debug!("ignoring statement balance");
            } else if line.starts_with('X') {
                warn!("ignoring 'X' attribute");
            } else if line.starts_with('^') {
                let Some(peek) = reader.peek_line()? else {
                    // end of the file inside an account list
                    self.document.accounts.push(account);
                    return Ok(());
                };
                if starts_with_ignore_case(peek, "!Account") {
                    // an account list, no transaction data here
                    self.document.accounts.push(account);
                    account = QifAccount::default();
                    reader.read_line()?; // eat the peeked header
                } else if starts_with_ignore_case(peek, "!Type:Memor") {
                    self.document.accounts.push(account);
                    return Ok(());
                } else if starts_with_ignore_case(peek, "!Type:Invst") {
                    debug!("found investment transactions");
                    match self.find_duplicate(&account) {
                        Some(index) => {
                            let target = &mut self.document.accounts[index];
                            parse_investment_account_transactions(reader, target)?;
                        }
                        None => {
                            parse_investment_account_transactions(reader, &mut account)?;
                            self.document.accounts.push(account);
                        }
                    }
                    return Ok(());
                } else if starts_with_ignore_case(peek, "!Type:Prices") {
                    // security prices follow, let the caller handle them
                    return Ok(());
                } else if starts_with_ignore_case(peek, "!Type:") {
                    debug!("found bank transactions");
                    match self.find_duplicate(&account) {
                        Some(index) => {
                            let target = &mut self.document.accounts[index];
                            parse_account_transactions(reader, target)?;
                        }
                        None => {
                            parse_account_transactions(reader, &mut account)?;
                            self.document.accounts.push(account);
                        }
                    }
                    return Ok(());
                } else if starts_with_ignore_case(peek, "!Clear:Auto") {
                    reader.read_line()?; // eat the AutoSwitch line
                    self.document.accounts.push(account);
                    return Ok(());
                } else if peek.starts_with('!') {
                    // something unexpected, assume an empty account list
                    self.document.accounts.push(account);
                    return Ok(());
                } else {
                    // an account list emitted under AutoSwitch
                    self.document.accounts.push(account);
                    account = QifAccount::default();
                }
            } else {
                warn!(line = %line, "unexpected line in account header");
                return Ok(());
            }
        }
        Ok(())
    }

    /// Looks for a prior declaration of the same logical account so the
    /// transactions that follow land on the already collected one.
    fn find_duplicate(&self, account: &QifAccount) -> Option<usize> {
        if account.name.is_empty() || account.kind.is_empty() {
            error!(name = %account.name, kind = %account.kind, "invalid account declaration");
            return None;
        }
        self.document
            .accounts
            .iter()
            .position(|a| a.is_duplicate_of(account))
    }

    fn parse_category_list<R: BufRead>(
        &mut self,
        reader: &mut QifReader<R>,
    ) -> Result<(), ParseError> {
        let mut category = QifCategory::default();

        while let Some(line) = reader.read_line()? {
            if let Some(rest) = line.strip_prefix('N') {
                category.name = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('D') {
                category.description = rest.to_string();
            } else if line.starts_with('T') {
                debug!("ignoring tax related flag");
            } else if line.starts_with('I') {
                category.kind = CategoryKind::Income;
            } else if line.starts_with('E') {
                category.kind = CategoryKind::Expense;
            } else if line.starts_with('B') {
                debug!("ignoring budget amount");
            } else if line.starts_with('R') {
                debug!("ignoring tax schedule");
            } else if line.starts_with('^') {
                self.document.categories.push(mem::take(&mut category));
            } else if line.starts_with('!') {
                // done with the category list, give the header back
                reader.push_back(line);
                return Ok(());
            } else {
                error!(line = %line, "unexpected line in category list");
            }
        }
        Ok(())
    }

    fn parse_class_list<R: BufRead>(
        &mut self,
        reader: &mut QifReader<R>,
    ) -> Result<(), ParseError> {
        let mut class_item = QifClassItem::default();

        while let Some(line) = reader.read_line()? {
            if let Some(rest) = line.strip_prefix('N') {
                class_item.name = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('D') {
                class_item.description = rest.to_string();
            } else if line.starts_with('^') {
                self.document.classes.push(mem::take(&mut class_item));
            } else if line.starts_with('!') {
                reader.push_back(line);
                return Ok(());
            } else {
                return Err(ParseError::UnexpectedLine(line));
            }
        }
        Ok(())
    }

    fn parse_security_list<R: BufRead>(
        &mut self,
        reader: &mut QifReader<R>,
    ) -> Result<(), ParseError> {
        let mut security = QifSecurity::default();

        while let Some(line) = reader.read_line()? {
            if let Some(rest) = line.strip_prefix('N') {
                security.name = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('D') {
                security.description = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('T') {
                security.kind = rest.to_string();
            } else if let Some(rest) = line.strip_prefix('S') {
                security.symbol = rest.to_string();
            } else if line.starts_with('^') {
                self.document.securities.push(mem::take(&mut security));
            } else if line.starts_with('!') {
                reader.push_back(line);
                return Ok(());
            } else {
                error!(line = %line, "unexpected line in security list");
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Reads bank-style transaction records into the given account.
fn parse_account_transactions<R: BufRead>(
    reader: &mut QifReader<R>,
    account: &mut QifAccount,
) -> Result<(), ParseError> {
    let mut transaction = QifTransaction::default();

    while let Some(line) = reader.read_line()? {
        if starts_with_ignore_case(&line, "!Type:") {
            if starts_with_ignore_case(&line, "!Type:Memor")
                || starts_with_ignore_case(&line, "!Type:Prices")
            {
                reader.push_back(line);
                return Ok(());
            }
            debug!(line = %line, "consuming transaction type header");
        } else if starts_with_ignore_case(&line, "!Account") {
            reader.push_back(line);
            return Ok(());
        } else if let Some(rest) = line.strip_prefix('D') {
            // keep the raw date, it is resolved once the account-wide
            // format is known
            transaction.odate = rest.to_string();
        } else if line.starts_with('U') {
            debug!("ignoring U");
        } else if let Some(rest) = line.strip_prefix('T') {
            transaction.amount = parse_money(rest);
        } else if let Some(rest) = line.strip_prefix('C') {
            transaction.status = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('P') {
            transaction.payee = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('L') {
            transaction.category = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('N') {
            transaction.check_number = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('M') {
            transaction.memo = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('A') {
            info!(address = %rest, "ignored address line");
        } else if let Some(rest) = line.strip_prefix('I') {
            transaction.price = Some(rest.to_string());
        } else if line.starts_with('^') {
            account.transactions.push(mem::take(&mut transaction));
        } else if line.starts_with(['S', 'E', '$', '%']) {
            reader.push_back(line);
            if let Some(split) = parse_split_transaction(reader)? {
                transaction.splits.push(split);
            }
        } else {
            error!(line = %line, "unknown field");
        }
    }
    Ok(())
}

/// Reads investment transaction records. They are collected so statistics
/// and duplicate detection work, but the importer does not convert them.
fn parse_investment_account_transactions<R: BufRead>(
    reader: &mut QifReader<R>,
    account: &mut QifAccount,
) -> Result<(), ParseError> {
    let mut transaction = QifTransaction::default();

    while let Some(line) = reader.read_line()? {
        if starts_with_ignore_case(&line, "!Type:Memor")
            || starts_with_ignore_case(&line, "!Type:Prices")
            || starts_with_ignore_case(&line, "!Account")
        {
            reader.push_back(line);
            return Ok(());
        } else if starts_with_ignore_case(&line, "!Type:") {
            debug!(line = %line, "consuming transaction type header");
        } else if let Some(rest) = line.strip_prefix('D') {
            transaction.odate = rest.to_string();
        } else if line.starts_with('U') {
            debug!("ignoring U");
        } else if let Some(rest) = line.strip_prefix('T') {
            transaction.amount = parse_money(rest);
        } else if let Some(rest) = line.strip_prefix('C') {
            transaction.status = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('P') {
            transaction.payee = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('L') {
            transaction.category = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('N') {
            // the transaction type for investment accounts
            transaction.check_number = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('M') {
            transaction.memo = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('A') {
            info!(address = %rest, "ignored address line");
        } else if let Some(rest) = line.strip_prefix('Y') {
            transaction.security = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('I') {
            transaction.price = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('Q') {
            transaction.quantity = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('$') {
            transaction.amount_trans = Some(rest.to_string());
        } else if line.starts_with('^') {
            account.transactions.push(mem::take(&mut transaction));
        } else if line.starts_with(['S', 'E', '%']) {
            reader.push_back(line);
            if let Some(split) = parse_split_transaction(reader)? {
                transaction.splits.push(split);
            }
        } else {
            error!(line = %line, "unknown field");
        }
    }
    Ok(())
}

/// Reads one split record. Splits carry no terminator of their own: a
/// repeated field prefix means the next split has begun, so the line is
/// given back and the current split returned. A `^` ends the parent
/// transaction and is given back as well. Anything else means this was not
/// a split after all.
fn parse_split_transaction<R: BufRead>(
    reader: &mut QifReader<R>,
) -> Result<Option<QifSplitTransaction>, ParseError> {
    let mut split = QifSplitTransaction::default();
    let (mut category, mut memo, mut amount, mut percentage) = (false, false, false, false);

    while let Some(line) = reader.read_line()? {
        match line.chars().next() {
            Some('S') => {
                if category {
                    reader.push_back(line);
                    return Ok(Some(split));
                }
                category = true;
                split.category = line[1..].to_string();
            }
            Some('E') => {
                if memo {
                    reader.push_back(line);
                    return Ok(Some(split));
                }
                memo = true;
                split.memo = line[1..].to_string();
            }
            Some('$') => {
                if amount {
                    reader.push_back(line);
                    return Ok(Some(split));
                }
                amount = true;
                split.amount = parse_money(&line[1..]);
            }
            Some('%') => {
                if percentage {
                    reader.push_back(line);
                    return Ok(Some(split));
                }
                percentage = true;
                debug!("ignoring split percentage");
            }
            Some('^') => {
                reader.push_back(line);
                return Ok(Some(split));
            }
            _ => {
                reader.push_back(line);
                return Ok(None);
            }
        }
    }
    Ok(None)
}

/// Eats the memorized transaction section without converting anything.
fn parse_memorized_transactions<R: BufRead>(reader: &mut QifReader<R>) -> Result<(), ParseError> {
    while let Some(line) = reader.read_line()? {
        if line.starts_with('!') {
            reader.push_back(line);
            return Ok(());
        }
    }
    Ok(())
}

/// Price data in QIF files is too thin to be useful; the section is skipped.
fn parse_price_records<R: BufRead>(reader: &mut QifReader<R>) -> Result<(), ParseError> {
    while let Some(line) = reader.read_line()? {
        if line.starts_with('^') {
            return Ok(());
        }
    }
    Ok(())
}
