use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Args;

use crate::importer::QifImport;
use crate::ledger::{Account, AccountType, Ledger};
use crate::parser::QifParser;
use crate::reader::QifReader;

/// Import a QIF file into a fresh in-memory ledger and print the result.
#[derive(Args)]
pub struct Command {
    file: PathBuf,

    /// Target account for a partial file (a bank statement).
    #[arg(short, long, value_name = "NAME")]
    account: Option<String>,

    /// Currency of the created accounts.
    #[arg(short, long, value_name = "CURRENCY", default_value = "USD")]
    currency: String,
}

impl Command {
    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let mut reader = QifReader::new(BufReader::new(File::open(&self.file)?));
        let mut parser = QifParser::new();
        let mut ledger = Ledger::new(&self.currency);

        match &self.account {
            Some(name) => {
                parser.parse_partial(&mut reader)?;
                let root = ledger.root();
                let account = ledger.account_by_name(name).unwrap_or_else(|| {
                    ledger.add_account(root, Account::new(AccountType::Bank, name, &self.currency))
                });
                QifImport::new(&mut ledger).import_statement(parser.into_document(), account);
            }
            None => {
                parser.parse_full(&mut reader)?;
                QifImport::new(&mut ledger).import(parser.into_document());
            }
        }

        for (id, account) in ledger.accounts() {
            if id == ledger.root() {
                continue;
            }
            let posted = ledger
                .transactions()
                .iter()
                .filter(|t| t.involves(id))
                .count();
            println!(
                "{:<10} {:<40} {:>6} transactions",
                account.account_type.to_string(),
                ledger.path_name(id),
                posted
            );
        }
        println!("{} transactions posted", ledger.transactions().len());
        Ok(())
    }
}
