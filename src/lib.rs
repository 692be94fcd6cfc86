pub mod config;
pub mod constants;
pub mod detection;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod replay;
