pub mod account;
pub mod health;
pub mod password;
pub mod session;
pub mod token;
pub mod two_factor;
