pub mod config;
pub mod entities;
pub mod replay;
pub mod store;
