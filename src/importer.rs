//! Converts a parsed QIF document into ledger accounts and transactions.
//! Duplicate accounts are prevented, duplicate transactions are not: this is
//! meant for importing an existing data set, not for re-importing monthly
//! statements. Transfers appear once in each QIF account, so after posting
//! one side the mirror record is removed from the document.

use std::collections::HashMap;
use std::mem;

use tracing::{debug, error, info, warn};

use crate::document::{CategoryKind, QifCategory, QifDocument, QifSplitTransaction, QifTransaction};
use crate::fields::strip_category_tags;
use crate::ledger::{
    Account, AccountId, AccountType, Ledger, ReconciledState, Transaction, TransactionEntry,
};

/// Stamped on transactions imported from a bank statement.
const FITID: &str = "qif";

const UNASSIGNED_EXPENSE_NAME: &str = "** QIF Import - Unassigned Expense Account";
const UNASSIGNED_INCOME_NAME: &str = "** QIF Import - Unassigned Income Account";
const UNASSIGNED_DESCRIPTION: &str = "Fix transactions and delete this account";

pub struct QifImport<'a> {
    ledger: &'a mut Ledger,
    document: QifDocument,
    expense_map: HashMap<String, AccountId>,
    income_map: HashMap<String, AccountId>,
    account_map: HashMap<String, AccountId>,
    unassigned_expense: Option<AccountId>,
    unassigned_income: Option<AccountId>,
    partial: bool,
}

impl<'a> QifImport<'a> {
    pub fn new(ledger: &'a mut Ledger) -> Self {
        QifImport {
            ledger,
            document: QifDocument::default(),
            expense_map: HashMap::new(),
            income_map: HashMap::new(),
            account_map: HashMap::new(),
            unassigned_expense: None,
            unassigned_income: None,
            partial: false,
        }
    }

    /// Imports a full QIF export: categories first, then accounts, then
    /// transactions. Problems with individual records are logged and
    /// skipped; the import itself always runs to completion.
    pub fn import(&mut self, document: QifDocument) {
        self.document = document;
        self.import_categories();
        self.import_accounts();
        info!("importing complete");
    }

    /// Imports a partial file (a bank statement) against a preselected
    /// account. Transactions are stamped with a fitid so a surrounding
    /// application can tell them apart from hand-entered ones.
    pub fn import_statement(&mut self, document: QifDocument, account: AccountId) {
        self.partial = true;
        self.document = document;
        self.load_category_maps();
        self.load_account_maps();
        for index in 0..self.document.accounts.len() {
            self.add_transactions(index, account);
        }
        info!("statement import complete");
    }

    fn import_categories(&mut self) {
        info!("importing categories");
        self.load_category_maps();
        self.reduce_categories();
        self.add_categories();
    }

    fn import_accounts(&mut self) {
        self.load_account_maps();
        self.add_accounts();
    }

    /// Keys existing income and expense accounts by their path below the
    /// base Income/Expense account, matching how QIF category names look.
    fn load_category_maps(&mut self) {
        for id in self.ledger.expense_accounts() {
            if let Some((_, path)) = self.ledger.path_name(id).split_once(':') {
                self.expense_map.insert(path.to_string(), id);
            }
        }
        for id in self.ledger.income_accounts() {
            if let Some((_, path)) = self.ledger.path_name(id).split_once(':') {
                self.income_map.insert(path.to_string(), id);
            }
        }
    }

    fn load_account_maps(&mut self) {
        for id in self.ledger.bank_and_cash_accounts() {
            let path = self.ledger.path_name(id);
            self.account_map.insert(path, id);
        }
    }

    /// Drops parsed categories that already exist in the ledger.
    fn reduce_categories(&mut self) {
        let expense_map = &self.expense_map;
        let income_map = &self.income_map;
        self.document.categories.retain(|category| match category.kind {
            CategoryKind::Expense => !expense_map.contains_key(&category.name),
            CategoryKind::Income => !income_map.contains_key(&category.name),
        });
    }

    fn add_categories(&mut self) {
        let categories = mem::take(&mut self.document.categories);
        for category in categories {
            // the account carries only the last path segment; the hierarchy
            // comes from the parent
            let name = category.name.rsplit(':').next().unwrap_or(&category.name);
            let account_type = match category.kind {
                CategoryKind::Expense => AccountType::Expense,
                CategoryKind::Income => AccountType::Income,
            };
            let currency = self.ledger.default_currency().to_string();
            let mut account = Account::new(account_type, name, &currency);
            account.description = category.description.clone();

            let parent = self.find_best_parent(&category);
            let id = self.ledger.add_account(parent, account);

            // register under the full QIF name so transactions referencing
            // the category resolve, even when an ancestor was missing
            let map = match category.kind {
                CategoryKind::Expense => &mut self.expense_map,
                CategoryKind::Income => &mut self.income_map,
            };
            map.insert(category.name.clone(), id);
        }
    }

    /// The longest matching ancestor of the category path, found by
    /// repeatedly stripping the last segment. Falls back to the base
    /// Income/Expense account.
    fn find_best_parent(&self, category: &QifCategory) -> AccountId {
        let map = match category.kind {
            CategoryKind::Expense => &self.expense_map,
            CategoryKind::Income => &self.income_map,
        };
        if let Some(index) = category.name.rfind(':') {
            let mut path = &category.name[..index];
            loop {
                if let Some(&id) = map.get(path) {
                    return id;
                }
                match path.rfind(':') {
                    Some(j) => path = &path[..j],
                    None => break,
                }
            }
        }
        match category.kind {
            CategoryKind::Expense => self.ledger.base_expense(),
            CategoryKind::Income => self.ledger.base_income(),
        }
    }

    /// All accounts must exist before any transaction is posted, because
    /// transfers reference accounts by name.
    fn add_accounts(&mut self) {
        info!("importing accounts");

        for index in 0..self.document.accounts.len() {
            let qacc = &self.document.accounts[index];
            if self.account_map.contains_key(&qacc.name) {
                continue;
            }
            if let Some(account) = self.generate_bank_account(index) {
                let root = self.ledger.root();
                let name = self.document.accounts[index].name.clone();
                let id = self.ledger.add_account(root, account);
                self.account_map.insert(name, id);
            }
        }

        info!("importing transactions");

        for index in 0..self.document.accounts.len() {
            let name = self.document.accounts[index].name.clone();
            let account = self
                .account_map
                .get(&name)
                .copied()
                .or_else(|| self.ledger.account_by_name(&name));
            match account {
                Some(account)
                    if self.ledger.account(account).account_type != AccountType::Invest =>
                {
                    self.add_transactions(index, account);
                }
                Some(_) => error!(account = %name, "investment transactions are not supported"),
                None => error!(account = %name, "lost the account"),
            }
        }
    }

    fn generate_bank_account(&self, index: usize) -> Option<Account> {
        let qacc = &self.document.accounts[index];
        let account_type = match qacc.kind.as_str() {
            "Bank" => AccountType::Bank,
            "CCard" => AccountType::Credit,
            "Cash" => AccountType::Cash,
            "Invst" | "Port" => AccountType::Invest,
            "Oth A" | "OthA" => AccountType::Asset,
            "Oth L" | "OthL" => AccountType::Liability,
            kind => {
                error!(account = %qacc.name, kind = %kind, "could not map the account type");
                return None;
            }
        };
        let mut account = Account::new(account_type, &qacc.name, self.ledger.default_currency());
        account.description = qacc.description.clone();
        Some(account)
    }

    /// Posts all transactions of one parsed account against the given
    /// ledger account. Mirror removal mutates other parsed accounts'
    /// transaction lists, so iteration is by position on a fresh clone.
    fn add_transactions(&mut self, index: usize, account: AccountId) {
        let mut position = 0;
        while position < self.document.accounts[index].transactions.len() {
            let qtran = self.document.accounts[index].transactions[position].clone();
            position += 1;
            match self.generate_transaction(&qtran, account) {
                Some(mut transaction) => {
                    if self.partial {
                        transaction.fitid = Some(FITID.to_string());
                    }
                    self.ledger.add_transaction(transaction);
                }
                None => warn!(payee = ?qtran.payee, "skipping transaction"),
            }
        }
    }

    /// Converts one parsed transaction. A transaction with no resolvable
    /// target account and no splits becomes a single-entry transaction on
    /// the base account; it most likely came from an online banking source.
    fn generate_transaction(
        &mut self,
        qtran: &QifTransaction,
        account: AccountId,
    ) -> Option<Transaction> {
        let state = reconciled_state(qtran.status.as_deref());

        let target = match qtran.transfer_account.as_deref() {
            Some(path) => self.ledger.account_by_path(path),
            None => self.find_best_account(qtran.category.as_deref()),
        };

        let mut transaction = Transaction::new(qtran.date);

        if qtran.has_splits() {
            for split in &qtran.splits {
                let entry = self.generate_split_entry(split, account);
                transaction.entries.push(entry);
            }
            transaction.set_reconciled(account, state);
        } else if target.is_none() || target == Some(account) {
            transaction.entries.push(TransactionEntry {
                debit: account,
                credit: account,
                amount: qtran.amount,
                memo: None,
            });
            transaction.memo = qtran.memo.clone();
            transaction.set_reconciled(account, state);
        } else if let Some(target) = target {
            // negative amount: money flows out of the base account
            let (debit, credit) = if qtran.amount.is_sign_negative() {
                (target, account)
            } else {
                (account, target)
            };
            transaction.entries.push(TransactionEntry {
                debit,
                credit,
                amount: qtran.amount.abs(),
                memo: None,
            });
            transaction.memo = qtran.memo.clone();
            transaction.set_reconciled(target, state);
            transaction.set_reconciled(account, state);

            // the transfer shows up in the other account's list too
            if qtran.category.as_deref().is_some_and(is_account_reference) {
                self.remove_mirror_transaction(qtran, account);
            }
        } else {
            warn!(payee = ?qtran.payee, "could not resolve an account for the transaction");
            return None;
        }

        transaction.payee = qtran.payee.clone();
        transaction.number = qtran.check_number.clone();
        Some(transaction)
    }

    /// Converts one split into a transaction entry. Quicken allows a split
    /// to point back at the parent account, which violates double entry;
    /// such splits are redirected to an unassigned sentinel account.
    fn generate_split_entry(
        &mut self,
        split: &QifSplitTransaction,
        account: AccountId,
    ) -> TransactionEntry {
        let mut target = self.find_best_account(Some(&split.category));

        if target == Some(account) {
            warn!("detected an invalid split entry, correcting");
            target = None;
        }

        // a valid transfer split has a duplicate record in the other
        // account that needs to be removed
        if target.is_some() && is_account_reference(&split.category) {
            self.remove_mirror_split_transaction(split);
        }

        let target = match target {
            Some(target) => target,
            None => self.unassigned_account(split.amount.is_sign_negative()),
        };

        let (debit, credit) = if split.amount.is_sign_negative() {
            (target, account)
        } else {
            (account, target)
        };
        TransactionEntry {
            debit,
            credit,
            amount: split.amount.abs(),
            memo: (!split.memo.is_empty()).then(|| split.memo.clone()),
        }
    }

    /// The lazily created sentinel for splits whose category cannot be
    /// resolved. At most one expense and one income sentinel per import.
    fn unassigned_account(&mut self, expense: bool) -> AccountId {
        let slot = if expense {
            self.unassigned_expense
        } else {
            self.unassigned_income
        };
        if let Some(id) = slot {
            return id;
        }

        let (account_type, name) = if expense {
            (AccountType::Expense, UNASSIGNED_EXPENSE_NAME)
        } else {
            (AccountType::Income, UNASSIGNED_INCOME_NAME)
        };
        let currency = self.ledger.default_currency().to_string();
        let mut account = Account::new(account_type, name, &currency);
        account.description = UNASSIGNED_DESCRIPTION.to_string();
        let root = self.ledger.root();
        let id = self.ledger.add_account(root, account);
        info!(account = %name, "created an account for unassigned splits");

        if expense {
            self.unassigned_expense = Some(id);
        } else {
            self.unassigned_income = Some(id);
        }
        id
    }

    /// Resolves a QIF category string to a ledger account: a bracketed
    /// `[Name]` references a bank-style account, a bare string an
    /// income/expense category path.
    fn find_best_account(&self, category: Option<&str>) -> Option<AccountId> {
        let category = category?;
        if category.is_empty() {
            return None;
        }

        let mut name = category;
        let mut account = None;

        if is_account_reference(category) {
            name = &category[1..category.len() - 1];
            debug!(account = %name, "looking for a bank account");
            account = self.account_map.get(name).copied();
        }

        if account.is_none() {
            let stripped = strip_category_tags(name);
            account = self
                .expense_map
                .get(stripped)
                .copied()
                .or_else(|| self.income_map.get(stripped).copied());
        }

        if account.is_none() {
            warn!(category = %name, "no account match");
        }
        account
    }

    /// Drops the other side of a transfer from the parsed document. Check
    /// number and payee cannot be used for matching since Quicken allows
    /// them to differ between the two sides; date, negated amount and the
    /// back-reference to the base account identify the mirror.
    fn remove_mirror_transaction(&mut self, qtran: &QifTransaction, account: AccountId) {
        let Some(category) = qtran.category.as_deref() else {
            return;
        };
        let name = &category[1..category.len() - 1];
        let account_name = self.ledger.account(account).name.clone();

        for qacc in &mut self.document.accounts {
            if qacc.name != name {
                continue;
            }
            let position = qacc.transactions.iter().position(|t| {
                t.amount == -qtran.amount
                    && t.date == qtran.date
                    && t.category.as_deref().is_some_and(|c| c.contains(&account_name))
            });
            if let Some(position) = position {
                qacc.transactions.remove(position);
                debug!("removed mirror transaction");
                return;
            }
        }
    }

    /// Drops the other side of a transfer split. First pass matches on
    /// negated amount and memo; if the mirror is a plain transaction into a
    /// bank account the memos may differ, so a second pass accepts any
    /// splitless transaction with a negated amount and an account
    /// reference as its category.
    fn remove_mirror_split_transaction(&mut self, split: &QifSplitTransaction) {
        let name = &split.category[1..split.category.len() - 1];
        debug!(account = %name, "looking for the mirror of a split");

        for qacc in &mut self.document.accounts {
            if qacc.name != name {
                continue;
            }
            let position = qacc.transactions.iter().position(|t| {
                t.amount == -split.amount && t.memo.as_deref().unwrap_or("") == split.memo
            });
            if let Some(position) = position {
                qacc.transactions.remove(position);
                debug!("removed mirror split transaction");
                return;
            }
        }

        for qacc in &mut self.document.accounts {
            if qacc.name != name {
                continue;
            }
            let position = qacc.transactions.iter().position(|t| {
                t.amount == -split.amount
                    && t.category.as_deref().is_some_and(is_account_reference)
                    && !t.has_splits()
            });
            if let Some(position) = position {
                qacc.transactions.remove(position);
                debug!("removed mirror split transaction on the second pass");
                return;
            }
        }

        warn!(category = %split.category, "did not find a matching mirror");
    }
}

/// A category wrapped in `[...]` references another account by name.
fn is_account_reference(category: &str) -> bool {
    category.starts_with('[') && category.ends_with(']') && category.len() >= 2
}

fn reconciled_state(status: Option<&str>) -> ReconciledState {
    match status.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("x") => ReconciledState::Reconciled,
        Some(s) if s == "*" || s.eq_ignore_ascii_case("c") => ReconciledState::Cleared,
        _ => ReconciledState::NotReconciled,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use super::*;
    use crate::parser::QifParser;
    use crate::reader::QifReader;

    fn parse(s: &str) -> QifDocument {
        let mut parser = QifParser::new();
        parser
            .parse_full(&mut QifReader::new(Cursor::new(s.as_bytes())))
            .unwrap();
        parser.into_document()
    }

    fn import(s: &str) -> Ledger {
        let mut ledger = Ledger::new("USD");
        QifImport::new(&mut ledger).import(parse(s));
        ledger
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_auto_gas_end_to_end() {
        let ledger = import(
            "!Type:Cat\n\
             NAuto:Gas\n\
             E\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-25.00\n\
             PShell\n\
             LAuto:Gas\n\
             ^\n",
        );
        // no ancestor "Auto" exists, so "Gas" lands under the base
        // Expense account
        let gas = ledger.account_by_path("Expense:Gas").unwrap();
        assert_eq!(ledger.account(gas).name, "Gas");
        let checking = ledger.account_by_path("Checking").unwrap();
        assert_eq!(ledger.account(checking).account_type, AccountType::Bank);

        assert_eq!(ledger.transactions().len(), 1);
        let transaction = &ledger.transactions()[0];
        assert_eq!(transaction.payee.as_deref(), Some("Shell"));
        assert_eq!(
            transaction.entries,
            vec![TransactionEntry {
                debit: gas,
                credit: checking,
                amount: dec("25.00"),
                memo: None,
            }]
        );
    }

    #[test]
    fn test_best_parent_walk_uses_declared_ancestor() {
        let ledger = import(
            "!Type:Cat\n\
             NAuto\n\
             E\n\
             ^\n\
             NAuto:Gas\n\
             E\n\
             ^\n",
        );
        let auto = ledger.account_by_path("Expense:Auto").unwrap();
        let gas = ledger.account_by_path("Expense:Auto:Gas").unwrap();
        assert_eq!(ledger.account(gas).parent, Some(auto));
    }

    #[test]
    fn test_existing_categories_reused() {
        let mut ledger = Ledger::new("USD");
        let auto = ledger.add_account(
            ledger.base_expense(),
            Account::new(AccountType::Expense, "Auto", "USD"),
        );
        let gas = ledger.add_account(auto, Account::new(AccountType::Expense, "Gas", "USD"));

        QifImport::new(&mut ledger).import(parse(
            "!Type:Cat\n\
             NAuto:Gas\n\
             E\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-25.00\n\
             LAuto:Gas\n\
             ^\n",
        ));

        // the parsed category was a duplicate and must not be recreated
        assert_eq!(ledger.expense_accounts().len(), 3);
        assert_eq!(ledger.transactions()[0].entries[0].debit, gas);
    }

    #[test]
    fn test_single_entry_without_category() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-10.00\n\
             PGrocer\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let entry = &ledger.transactions()[0].entries[0];
        assert_eq!(entry.debit, checking);
        assert_eq!(entry.credit, checking);
        assert_eq!(entry.amount, dec("-10.00"));
    }

    #[test]
    fn test_mirror_transaction_removed() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-100.00\n\
             L[Savings]\n\
             ^\n\
             !Account\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T100.00\n\
             L[Checking]\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let savings = ledger.account_by_path("Savings").unwrap();

        // the transfer must be posted exactly once
        assert_eq!(ledger.transactions().len(), 1);
        let entry = &ledger.transactions()[0].entries[0];
        assert_eq!(entry.debit, savings);
        assert_eq!(entry.credit, checking);
        assert_eq!(entry.amount, dec("100.00"));
    }

    #[test]
    fn test_split_transaction_entries() {
        let ledger = import(
            "!Type:Cat\n\
             NFood\n\
             E\n\
             ^\n\
             NHousehold\n\
             E\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-100.00\n\
             PStore\n\
             SFood\n\
             EGroceries\n\
             $-60.00\n\
             SHousehold\n\
             $-40.00\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let food = ledger.account_by_path("Expense:Food").unwrap();
        let household = ledger.account_by_path("Expense:Household").unwrap();

        let transaction = &ledger.transactions()[0];
        assert_eq!(
            transaction.entries,
            vec![
                TransactionEntry {
                    debit: food,
                    credit: checking,
                    amount: dec("60.00"),
                    memo: Some("Groceries".to_string()),
                },
                TransactionEntry {
                    debit: household,
                    credit: checking,
                    amount: dec("40.00"),
                    memo: None,
                },
            ]
        );
    }

    #[test]
    fn test_unassigned_sentinel_created_once() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-100.00\n\
             SNowhere\n\
             $-60.00\n\
             SAlsoNowhere\n\
             $-40.00\n\
             ^\n",
        );
        let sentinels: Vec<_> = ledger
            .accounts()
            .filter(|(_, account)| account.name == UNASSIGNED_EXPENSE_NAME)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(sentinels.len(), 1);
        let sentinel = sentinels[0];
        assert_eq!(ledger.account(sentinel).description, UNASSIGNED_DESCRIPTION);

        let transaction = &ledger.transactions()[0];
        assert!(transaction.entries.iter().all(|e| e.debit == sentinel));
    }

    #[test]
    fn test_split_pointing_at_parent_account_redirected() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-50.00\n\
             S[Checking]\n\
             $-50.00\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let sentinel = ledger.account_by_name(UNASSIGNED_EXPENSE_NAME).unwrap();
        let entry = &ledger.transactions()[0].entries[0];
        assert_eq!(entry.debit, sentinel);
        assert_eq!(entry.credit, checking);
    }

    #[test]
    fn test_mirror_split_removed() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-100.00\n\
             S[Savings]\n\
             EMonthly saving\n\
             $-100.00\n\
             ^\n\
             !Account\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T100.00\n\
             L[Checking]\n\
             MMonthly saving\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let savings = ledger.account_by_path("Savings").unwrap();

        assert_eq!(ledger.transactions().len(), 1);
        let entry = &ledger.transactions()[0].entries[0];
        assert_eq!(entry.debit, savings);
        assert_eq!(entry.credit, checking);
        assert_eq!(entry.amount, dec("100.00"));
    }

    #[test]
    fn test_account_type_mapping() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             NCard\n\
             TCCard\n\
             ^\n\
             NWallet\n\
             TCash\n\
             ^\n\
             NBrokerage\n\
             TInvst\n\
             ^\n\
             NHouse\n\
             TOth A\n\
             ^\n\
             NMortgage\n\
             TOth L\n\
             ^\n",
        );
        let tests = [
            ("Checking", AccountType::Bank),
            ("Card", AccountType::Credit),
            ("Wallet", AccountType::Cash),
            ("Brokerage", AccountType::Invest),
            ("House", AccountType::Asset),
            ("Mortgage", AccountType::Liability),
        ];
        for (name, expected) in tests {
            let id = ledger.account_by_name(name).unwrap();
            assert_eq!(ledger.account(id).account_type, expected, "account: {}", name);
        }
    }

    #[test]
    fn test_unmapped_account_type_skipped() {
        let ledger = import(
            "!Account\n\
             NMystery\n\
             TWacky\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-10.00\n\
             ^\n",
        );
        assert_eq!(ledger.account_by_name("Mystery"), None);
        assert_eq!(ledger.transactions().len(), 0);
    }

    #[test]
    fn test_investment_transactions_not_posted() {
        let ledger = import(
            "!Account\n\
             NBrokerage\n\
             TInvst\n\
             ^\n\
             !Type:Invst\n\
             D1/2/03\n\
             NBuy\n\
             YAcme Corp\n\
             T500.00\n\
             ^\n",
        );
        assert!(ledger.account_by_name("Brokerage").is_some());
        assert_eq!(ledger.transactions().len(), 0);
    }

    #[test]
    fn test_reconciled_states() {
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-10.00\n\
             Cx\n\
             ^\n\
             D1/3/03\n\
             T-20.00\n\
             C*\n\
             ^\n\
             D1/4/03\n\
             T-30.00\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let states: Vec<_> = ledger
            .transactions()
            .iter()
            .map(|t| t.reconciled(checking))
            .collect();
        assert_eq!(
            states,
            vec![
                ReconciledState::Reconciled,
                ReconciledState::Cleared,
                ReconciledState::NotReconciled,
            ]
        );
    }

    #[test]
    fn test_partial_import_stamps_fitid() {
        let mut parser = QifParser::new();
        parser
            .parse_partial(&mut QifReader::new(Cursor::new(
                "!Type:Bank\nD1/2/03\nT-10.00\nPGrocer\n^\n".as_bytes(),
            )))
            .unwrap();
        let document = parser.into_document();

        let mut ledger = Ledger::new("USD");
        let root = ledger.root();
        let checking = ledger.add_account(root, Account::new(AccountType::Bank, "Checking", "USD"));
        QifImport::new(&mut ledger).import_statement(document, checking);

        assert_eq!(ledger.transactions().len(), 1);
        let transaction = &ledger.transactions()[0];
        assert_eq!(transaction.fitid.as_deref(), Some("qif"));
        assert_eq!(transaction.entries[0].debit, checking);
        assert_eq!(transaction.entries[0].amount, dec("-10.00"));
    }

    #[test]
    fn test_statement_transfer_account_resolved() {
        let mut parser = QifParser::new();
        parser
            .parse_partial(&mut QifReader::new(Cursor::new(
                "!Type:Bank\nD1/2/03\nT-50.00\n^\n".as_bytes(),
            )))
            .unwrap();
        let mut document = parser.into_document();
        // the surrounding context knows the transfer target of a
        // statement transaction; the file itself does not
        document.accounts[0].transactions[0].transfer_account = Some("Savings".to_string());

        let mut ledger = Ledger::new("USD");
        let root = ledger.root();
        let checking = ledger.add_account(root, Account::new(AccountType::Bank, "Checking", "USD"));
        let savings = ledger.add_account(root, Account::new(AccountType::Bank, "Savings", "USD"));
        QifImport::new(&mut ledger).import_statement(document, checking);

        assert_eq!(ledger.transactions().len(), 1);
        let transaction = &ledger.transactions()[0];
        assert_eq!(transaction.fitid.as_deref(), Some("qif"));
        assert_eq!(
            transaction.entries,
            vec![TransactionEntry {
                debit: savings,
                credit: checking,
                amount: dec("50.00"),
                memo: None,
            }]
        );
    }

    #[test]
    fn test_mirror_split_with_differing_memo_removed() {
        // the mirror of a split into a bank account may carry a different
        // memo; it is still matched on the negated amount and its own
        // account reference
        let ledger = import(
            "!Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Account\n\
             NChecking\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T-100.00\n\
             S[Savings]\n\
             ETo savings\n\
             $-100.00\n\
             ^\n\
             !Account\n\
             NSavings\n\
             TBank\n\
             ^\n\
             !Type:Bank\n\
             D1/2/03\n\
             T100.00\n\
             L[Checking]\n\
             MFrom checking\n\
             ^\n",
        );
        let checking = ledger.account_by_path("Checking").unwrap();
        let savings = ledger.account_by_path("Savings").unwrap();

        assert_eq!(ledger.transactions().len(), 1);
        let entry = &ledger.transactions()[0].entries[0];
        assert_eq!(entry.debit, savings);
        assert_eq!(entry.credit, checking);
        assert_eq!(entry.amount, dec("100.00"));
    }

    #[test]
    fn test_is_account_reference() {
        let tests = [
            ("[Checking]", true),
            ("[]", true),
            ("Checking", false),
            ("[Checking", false),
            ("", false),
        ];
        for (test, expected) in tests {
            assert_eq!(is_account_reference(test), expected, "input: {:?}", test);
        }
    }

    #[test]
    fn test_reconciled_state_mapping() {
        let tests = [
            (Some("x"), ReconciledState::Reconciled),
            (Some("X"), ReconciledState::Reconciled),
            (Some("*"), ReconciledState::Cleared),
            (Some("c"), ReconciledState::Cleared),
            (Some("C"), ReconciledState::Cleared),
            (Some(""), ReconciledState::NotReconciled),
            (None, ReconciledState::NotReconciled),
        ];
        for (test, expected) in tests {
            assert_eq!(reconciled_state(test), expected, "input: {:?}", test);
        }
    }
}
