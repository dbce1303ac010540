pub mod analytics;
pub mod catalog;
pub mod coin;
pub mod holding;
pub mod ledger;
pub mod market;
pub mod portfolio;
pub mod settings;
pub mod transaction;
