// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client wrapper for the Movicon IOServer's OPC UA interface.
//!
//! Movicon's IOServer publishes its tag database over OPC UA (default port
//! 62841). This crate wraps an OPC UA client with the three things that
//! matter day to day: connect, walk the tag tree into a display-name-keyed
//! mapping, and write tags with their declared variant type. The OPC UA
//! client library underneath is treated as a black box; secure channels,
//! subscriptions and binary encoding are its business.
//!
//! # Error Handling
//!
//! Failures surface as typed errors through the [`error`] module:
//!
//! ```text
//! IoServerError
//! ├── Connection    - Endpoint and session establishment issues
//! ├── Browse        - Node tree enumeration failures
//! ├── Operation     - Read/write failures on individual nodes
//! ├── Conversion    - Value-to-declared-type coercion failures
//! └── Configuration - Invalid settings
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use movicon_opcua::{IoServer, TagValue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = IoServer::from_hostname("plc01")?;
//!     server.connect().await?;
//!
//!     for (path, tag) in server.tags()?.leaves() {
//!         println!("{} -> {}", path, tag.node_id);
//!     }
//!
//!     server.set_tag_path("Motors/Motor1", TagValue::Boolean(true)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod server;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use error::{
    BrowseError, ConfigurationError, ConnectionError, ConversionError, IoServerError,
    IoServerResult, OperationError,
};

pub use types::{
    IoServerConfig, IoServerConfigBuilder, NodeClass, NodeId, NodeIdentifier, TagValue,
    VariantType, DEFAULT_PORT, OBJECTS_FOLDER_NAME,
};

pub use client::{BrowseResult, OpcUaTransport, ReadResult, TransportState, WriteResult};

pub use server::IoServer;
pub use tree::{NodeTree, NodeTreeWalker, TagNode};

// Re-export real transport when feature is enabled
#[cfg(feature = "real-transport")]
pub use client::RealTransport;
