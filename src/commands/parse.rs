use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Args;

use crate::document::QifDocument;
use crate::parser::{is_full_file, QifParser};
use crate::reader::QifReader;

/// Parse a QIF file and dump document statistics.
#[derive(Args)]
pub struct Command {
    file: PathBuf,
}

impl Command {
    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let full = {
            let mut reader = QifReader::new(BufReader::new(File::open(&self.file)?));
            is_full_file(&mut reader)?
        };

        let mut reader = QifReader::new(BufReader::new(File::open(&self.file)?));
        let mut parser = QifParser::new();
        if full {
            parser.parse_full(&mut reader)?;
        } else {
            parser.parse_partial(&mut reader)?;
        }
        dump_stats(parser.document());
        Ok(())
    }
}

fn dump_stats(document: &QifDocument) {
    println!("Num Classes    : {}", document.classes.len());
    println!("Num Categories : {}", document.categories.len());
    println!("Num Securities : {}", document.securities.len());
    println!("Num Accounts   : {}", document.accounts.len());

    for (i, account) in document.accounts.iter().enumerate() {
        println!("Account {} {}", i + 1, account.name);
        println!("    Num Transactions : {}", account.transactions.len());
        for (j, transaction) in account.transactions.iter().enumerate() {
            println!(
                "        Transaction {} {}",
                j + 1,
                transaction.payee.as_deref().unwrap_or("")
            );
            println!("            Num Splits : {}", transaction.splits.len());
        }
    }
}
