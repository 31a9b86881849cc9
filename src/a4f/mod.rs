pub mod client;

pub use client::A4fClient;
