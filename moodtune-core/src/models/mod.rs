pub mod config;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod recommendation;
pub mod report;
pub mod state;
pub mod token;
