//! # Bitis
//!
//! An in-memory key/value store speaking RESP2, specialized around bitmap
//! values: single-bit access, population counting, bit search, bitwise
//! combination across keys, and fixed-width typed-integer bitfields with
//! explicit overflow policies.
//!
//! The value engine lives in [`bitmap`]; [`store`] provides the per-key
//! latched byte-array store the engine reads and writes through; [`command`]
//! maps wire commands onto the engine; [`resp`] and [`server`] carry the
//! protocol over TCP.

pub mod bitmap;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod resp;
pub mod server;
pub mod store;
