pub mod account;
pub mod deploy;
pub mod status;
