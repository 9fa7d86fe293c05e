pub mod ledger;
pub mod validate;
