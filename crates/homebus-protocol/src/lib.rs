//! Home-automation RS-485 bus decoder
//!
//! This crate decodes the status traffic exchanged between a home-automation
//! controller (the wallpad) and the lights, outlets, heating and air
//! conditioning it manages. It is a passive tap: frames are only decoded,
//! never sent or acknowledged.
//!
//! # Protocol Overview
//!
//! The bus carries a raw byte stream with no length prefix:
//!
//! - **Frames** start with `AA 55` and end with `0D 0D`, at least 21 bytes long
//! - **Checksum**: the 8-bit sum of bytes 2–17, stored in byte 18
//! - **Addresses**: 16-bit, family code in the high byte and room id in the
//!   low byte; one end of every frame is the controller (`0x0100`)
//! - **Payloads** are family specific: 8 on/off slots for lights and outlets,
//!   fixed layouts for heating and air conditioning
//!
//! Lights and outlets never announce how many devices a room has, so the
//! decoder keeps a [`DiscoveryRegistry`] of slots it has seen switched on.
//!
//! # Example
//!
//! ```rust,ignore
//! use homebus_protocol::{BusDecoder, BusEvent};
//!
//! let mut decoder = BusDecoder::new();
//! for byte in serial_bytes {
//!     if let Some(event) = decoder.push_byte(byte) {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

mod assembler;
pub mod checksum;
mod constants;
mod decoder;
mod devices;
mod dispatch;
mod error;
mod events;
mod header;
mod registry;
mod types;

pub use assembler::*;
pub use constants::*;
pub use decoder::*;
pub use devices::*;
pub use dispatch::*;
pub use error::*;
pub use events::*;
pub use header::*;
pub use registry::*;
pub use types::*;
