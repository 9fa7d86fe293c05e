pub mod holiday;
pub mod leave;
pub mod user;
pub mod ws;
