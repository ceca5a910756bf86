pub mod account;
pub mod encrypt;
pub mod files;
pub mod vaults;
