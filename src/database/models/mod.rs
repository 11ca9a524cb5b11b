pub mod message;
pub mod profile;
pub mod theme;
pub mod user;
