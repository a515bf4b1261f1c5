//! # OxiBrotli Encoder
//!
//! Pure Rust implementation of a Brotli-style lossless encoder core.
//!
//! Input is scanned for backward references, fractured into insert-and-copy
//! commands, and laid out as a sequence of meta-blocks: block splits,
//! context maps, per-context Huffman codes, and the interleaved command,
//! literal and distance streams.
//!
//! ## Features
//!
//! - **One-shot compression**: [`compress_buffer`]
//! - **Streaming**: [`StreamEncoder`] emits one meta-block per call while
//!   the LZ window, match finder and distance history persist
//! - **Context modeling**: per-context literal and distance Huffman codes
//!   selected through clustered context maps
//! - **Block splitting**: independent typed splits of the literal, command
//!   and distance streams
//!
//! ## Example
//!
//! ```rust
//! use oxibrotli_enc::compress_buffer;
//!
//! let compressed = compress_buffer(b"to be or not to be, to be or not").unwrap();
//! assert!(!compressed.is_empty());
//!
//! // The empty stream is two fixed bytes.
//! assert_eq!(compress_buffer(b"").unwrap(), vec![0x01, 0x00]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backward_references;
pub mod bit_cost;
pub mod block_splitter;
pub mod cluster;
pub mod command;
pub mod context;
pub mod context_map;
pub mod encoder;
pub mod entropy;
pub mod hash;
pub mod histogram;
pub mod literal_cost;
pub mod metablock;
pub mod prefix;
pub mod store;

// Re-exports
pub use command::{Command, DistancePayload};
pub use context::ContextMode;
pub use encoder::{compress_buffer, StreamEncoder, DEFAULT_WINDOW_BITS, MAX_META_BLOCK_SIZE};
pub use entropy::EntropyCode;
pub use histogram::Histogram;
pub use metablock::{build_meta_block, EncodingParams, MetaBlock};
