pub mod health;
pub mod history;
pub mod reply;
pub mod usage;
