//! A minimal in-memory double-entry ledger, the target the importer posts
//! into. Accounts live in an arena indexed by `AccountId`; the tree is
//! encoded through parent links. A fresh ledger always carries a root plus
//! base `Income` and `Expense` accounts, since category import needs
//! somewhere to fall back to.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Display;

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AccountId(usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccountType {
    Root,
    Bank,
    Credit,
    Cash,
    Invest,
    Asset,
    Liability,
    Income,
    Expense,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::Root => "Root",
            AccountType::Bank => "Bank",
            AccountType::Credit => "Credit",
            AccountType::Cash => "Cash",
            AccountType::Invest => "Invest",
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Income => "Income",
            AccountType::Expense => "Expense",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReconciledState {
    #[default]
    NotReconciled,
    Cleared,
    Reconciled,
}

#[derive(Debug)]
pub struct Account {
    pub account_type: AccountType,
    pub name: String,
    pub description: String,
    pub currency: String,
    pub parent: Option<AccountId>,
}

impl Account {
    pub fn new(account_type: AccountType, name: &str, currency: &str) -> Self {
        Account {
            account_type,
            name: name.to_string(),
            description: String::new(),
            currency: currency.to_string(),
            parent: None,
        }
    }
}

/// One leg of a posted transaction. For a two-account entry the amount is
/// non-negative and flows from credit to debit; a single-account entry
/// (debit == credit) keeps the signed amount as read from the source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionEntry {
    pub debit: AccountId,
    pub credit: AccountId,
    pub amount: Decimal,
    pub memo: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub payee: Option<String>,
    pub memo: Option<String>,
    pub number: Option<String>,
    pub fitid: Option<String>,
    pub entries: Vec<TransactionEntry>,
    reconciled: HashMap<AccountId, ReconciledState>,
}

impl Transaction {
    pub fn new(date: NaiveDate) -> Self {
        Transaction {
            date,
            payee: None,
            memo: None,
            number: None,
            fitid: None,
            entries: Vec::new(),
            reconciled: HashMap::new(),
        }
    }

    pub fn set_reconciled(&mut self, account: AccountId, state: ReconciledState) {
        self.reconciled.insert(account, state);
    }

    pub fn reconciled(&self, account: AccountId) -> ReconciledState {
        self.reconciled.get(&account).copied().unwrap_or_default()
    }

    /// True if any entry touches the given account.
    pub fn involves(&self, account: AccountId) -> bool {
        self.entries
            .iter()
            .any(|e| e.debit == account || e.credit == account)
    }

    /// The signed total from the perspective of the given account: debits
    /// increase it, credits decrease it.
    pub fn amount_for(&self, account: AccountId) -> Decimal {
        let mut total = Decimal::ZERO;
        for entry in &self.entries {
            if entry.debit == entry.credit {
                if entry.debit == account {
                    total += entry.amount;
                }
                continue;
            }
            if entry.debit == account {
                total += entry.amount;
            }
            if entry.credit == account {
                total -= entry.amount;
            }
        }
        total
    }
}

#[derive(Debug)]
pub struct Ledger {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    root: AccountId,
    base_income: AccountId,
    base_expense: AccountId,
    default_currency: String,
}

impl Ledger {
    pub fn new(currency: &str) -> Self {
        let mut ledger = Ledger {
            accounts: vec![Account::new(AccountType::Root, "", currency)],
            transactions: Vec::new(),
            root: AccountId(0),
            base_income: AccountId(0),
            base_expense: AccountId(0),
            default_currency: currency.to_string(),
        };
        let root = ledger.root;
        ledger.base_income =
            ledger.add_account(root, Account::new(AccountType::Income, "Income", currency));
        ledger.base_expense =
            ledger.add_account(root, Account::new(AccountType::Expense, "Expense", currency));
        ledger
    }

    pub fn root(&self) -> AccountId {
        self.root
    }

    pub fn base_income(&self) -> AccountId {
        self.base_income
    }

    pub fn base_expense(&self) -> AccountId {
        self.base_expense
    }

    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    pub fn add_account(&mut self, parent: AccountId, mut account: Account) -> AccountId {
        account.parent = Some(parent);
        self.accounts.push(account);
        AccountId(self.accounts.len() - 1)
    }

    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.0]
    }

    pub fn accounts(&self) -> impl Iterator<Item = (AccountId, &Account)> {
        self.accounts
            .iter()
            .enumerate()
            .map(|(index, account)| (AccountId(index), account))
    }

    /// The colon-joined path of the account below the root, e.g.
    /// "Expense:Auto:Gas". The root itself has an empty path.
    pub fn path_name(&self, id: AccountId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if id == self.root {
                break;
            }
            let account = &self.accounts[id.0];
            segments.push(account.name.as_str());
            current = account.parent;
        }
        segments.reverse();
        segments.join(":")
    }

    pub fn account_by_path(&self, path: &str) -> Option<AccountId> {
        self.accounts()
            .map(|(id, _)| id)
            .find(|&id| self.path_name(id) == path)
    }

    pub fn account_by_name(&self, name: &str) -> Option<AccountId> {
        self.accounts()
            .find(|(id, account)| account.name == name && *id != self.root)
            .map(|(id, _)| id)
    }

    pub fn expense_accounts(&self) -> Vec<AccountId> {
        self.accounts_of_type(AccountType::Expense)
    }

    pub fn income_accounts(&self) -> Vec<AccountId> {
        self.accounts_of_type(AccountType::Income)
    }

    /// Accounts that QIF bank-style transactions can post against.
    pub fn bank_and_cash_accounts(&self) -> Vec<AccountId> {
        self.accounts()
            .filter(|(_, account)| {
                matches!(
                    account.account_type,
                    AccountType::Bank
                        | AccountType::Credit
                        | AccountType::Cash
                        | AccountType::Invest
                        | AccountType::Asset
                        | AccountType::Liability
                )
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn accounts_of_type(&self, account_type: AccountType) -> Vec<AccountId> {
        self.accounts()
            .filter(|(_, account)| account.account_type == account_type)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}
