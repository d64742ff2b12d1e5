pub mod attempts;
pub mod init;
pub mod ledger;
pub mod report;
pub mod run;
