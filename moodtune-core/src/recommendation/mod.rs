pub mod client;
pub mod handoff;
