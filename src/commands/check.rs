use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Args;

use crate::parser::is_full_file;
use crate::reader::QifReader;

/// Report whether a QIF file is a full export or a partial bank statement.
#[derive(Args)]
pub struct Command {
    file: PathBuf,
}

impl Command {
    pub fn run(&self) -> Result<(), Box<dyn Error>> {
        let mut reader = QifReader::new(BufReader::new(File::open(&self.file)?));
        if is_full_file(&mut reader)? {
            println!("{}: full QIF file", self.file.display());
        } else {
            println!(
                "{}: partial QIF file, import it against a preselected account",
                self.file.display()
            );
        }
        Ok(())
    }
}
