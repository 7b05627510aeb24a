pub mod account;
pub mod credential;
pub mod login;
pub mod password;
pub mod register;
pub mod token;
pub mod two_factor;
