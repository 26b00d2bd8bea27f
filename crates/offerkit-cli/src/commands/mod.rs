pub mod admin;
pub mod comment;
pub mod config;
pub mod countdown;
pub mod lead;
pub mod stock;
