pub mod config;
pub mod logging;
pub mod parser;
pub mod release;
pub mod report;
pub mod scanner;
