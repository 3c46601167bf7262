pub mod commands;
pub mod document;
pub mod fields;
pub mod importer;
pub mod ledger;
pub mod parser;
pub mod reader;
