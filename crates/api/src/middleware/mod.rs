//! Request extractors shared by handlers.

pub mod client_ip;

pub use client_ip::ClientIdentity;
