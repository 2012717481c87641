pub mod admin_auth;
pub mod ledger;
pub mod report;
