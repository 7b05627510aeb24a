pub mod bans;
pub mod outbox_events;
pub mod recovery_codes;
pub mod reset_passwords;
pub mod sessions;
pub mod users;
