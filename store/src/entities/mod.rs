pub mod actions;
pub mod channels;
pub mod models;
pub mod state;
