//! Binary container codec for the coinset dataset builder.
//!
//! This crate provides:
//! - XDR-style encode/decode of a `CryptocoinExperiment`
//! - Atomic container file writes and read-back

pub mod xdr;
pub mod file;

pub use xdr::{decode, encode, encoded_len, XdrReader, XdrWriter};
pub use file::{load_from_file, save_to_file};
