pub mod event;
pub mod hub;
pub mod route;
