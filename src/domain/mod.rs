pub mod auth;
pub mod history;
pub mod quota;
pub mod reply;
pub mod usage;
pub mod user;
