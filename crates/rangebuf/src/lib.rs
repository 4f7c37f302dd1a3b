//! Incremental byte buffer and zero-copy range index for non-blocking
//! protocol parsers.
//!
//! Bytes arrive in arbitrary chunks and are appended to a [`Buffer`]. A parser
//! marks the tokens it recognizes as [`Range`]s (offset + length) in a
//! fixed-capacity [`RangeSet`] instead of copying them out; consumers read
//! them back through [`Range::str`], [`PrefixScanner`] and
//! [`RangeSet::to_map`]. Once a message is done the buffer is compacted and
//! the set renormalized, so memory stays bounded and reused across every
//! message on a connection.
//!
//! ```rust
//! use rangebuf::{ByteView, ParseContext, PrefixScanner};
//!
//! let mut context = ParseContext::default();
//! context.feed(b"GET /a").unwrap();
//! context.feed(b" HTTP/1.1\r\nHost: example.org\r\n\r\n").unwrap();
//!
//! let (buffer, ranges) = context.parts();
//! ranges.append(0, 3).unwrap();
//! ranges.append(4, 2).unwrap();
//! let host = buffer.find_from(0, b"Host").unwrap();
//! let eol = buffer.find_from(host, b"\r\n").unwrap();
//! ranges.append(host, eol - host).unwrap();
//!
//! assert_eq!(ranges[1].str(buffer).unwrap(), "/a");
//! let value = PrefixScanner::new(b"host:", false).value_of(buffer, ranges).unwrap();
//! assert_eq!(value.str(buffer).unwrap(), "example.org");
//!
//! let end = buffer.len();
//! context.finish_message(end).unwrap();
//! assert!(context.buffer().is_empty());
//! ```
//!
//! A single context is owned by one connection and is never shared between
//! threads; nothing in here blocks or locks.

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod buffer;
mod chunk_utils;
mod context;
mod error;
mod options;
mod range;
mod range_set;
mod scanner;
mod view;


pub use buffer::{Buffer, Compaction};
pub use chunk_utils::{produce_chunks, split_at_offsets};
pub use context::ParseContext;
pub use error::{BufError, OutOfRange};
pub use options::BufferOptions;
pub use range::Range;
pub use range_set::{Associations, RangeSet};
pub use scanner::PrefixScanner;
pub use view::{ByteView, Bytes, Generation};
