//! # Record model
//!
//! A small, descriptor-driven representation of protocol-buffer style messages.
//! It provides everything the traversal engine needs to walk a record tree
//! without generated code:
//!
//! - **[descriptor]** - message, field and enum descriptors
//! - **[message]** - immutable messages and their builder
//! - **[collections]** - repeated fields (lists), map fields and value identity
//!
//! Records are immutable once built and shared through `Arc`, so one subtree may
//! be reachable from several parents. Every message, list and map receives a
//! [`ValueId`] at construction; the engine uses it to recognise a node it has
//! already visited.
//!
//! ## Example
//!
//! ```
//! use protoquery::record::{FieldKind, Message, MessageDescriptor};
//!
//! let book = MessageDescriptor::builder("Book")
//!     .field("title", FieldKind::String)
//!     .field("price", FieldKind::Float)
//!     .build()
//!     .unwrap();
//!
//! let dune = Message::builder(&book)
//!     .set("title", "Dune")
//!     .set("price", 9.99)
//!     .build()
//!     .unwrap();
//!
//! let title = dune.descriptor().field("title").unwrap();
//! assert!(dune.has(title));
//! ```
pub mod collections;
pub mod descriptor;
pub mod message;

pub use collections::{List, Map, MapKey, ValueId};
pub use descriptor::{
    Cardinality, EnumDescriptor, FieldDescriptor, FieldKind, MapKeyKind, MessageDescriptor,
    MessageDescriptorBuilder,
};
pub use message::{Message, MessageBuilder};

use thiserror::Error;

/// Errors raised while declaring descriptors or building records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("message `{message}` has no field `{field}`")]
    UnknownField { message: String, field: String },

    #[error("field `{field}` expects {expected}, got {found}")]
    KindMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("field `{field}` is declared twice in message `{message}`")]
    DuplicateField { message: String, field: String },
}
