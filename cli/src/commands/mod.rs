pub mod check;
pub mod config;
pub mod daemon;
pub mod logs;
pub mod status;
pub mod toggle;
