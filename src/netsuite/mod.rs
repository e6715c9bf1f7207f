pub mod client;
pub mod oauth;
pub mod types;

pub use client::*;
pub use types::*;
