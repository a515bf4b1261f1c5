//! # OxiBrotli Core
//!
//! Core primitives for the OxiBrotli encoder.
//!
//! This crate provides the layer-1 building blocks the codec layer is built
//! on:
//!
//! - [`bitstream`]: LSB-first bit sink and reader for variable-length codes
//! - [`ringbuffer`]: position-addressed ring buffer for the LZ window
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! The workspace is a two-layer stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L2: Codec (oxibrotli-enc)                               │
//! │     meta-block builder, entropy codes, bit emission     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     BitSink/BitReader, RingBuffer, errors               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxibrotli_core::bitstream::BitSink;
//!
//! let mut sink = BitSink::new();
//! sink.write_bits(3, 0);
//! sink.write_bit(true);
//! assert_eq!(sink.bit_position(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod ringbuffer;

// Re-exports for convenience
pub use bitstream::{BitReader, BitSink};
pub use error::{OxibrotliError, Result};
pub use ringbuffer::RingBuffer;
