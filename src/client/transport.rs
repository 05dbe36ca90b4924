// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport abstraction over the external OPC UA client.
//!
//! The trait covers exactly the operations the wrapper needs: connection
//! lifecycle, browsing children, reading values and declared types, and
//! writing values. Everything else the protocol offers stays inside the
//! client library.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IoServerResult;
use crate::types::{IoServerConfig, NodeClass, NodeId, TagValue, VariantType};

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Transport is not connected.
    #[default]
    Disconnected,

    /// Transport is establishing connection.
    Connecting,

    /// Transport is connected and ready.
    Connected,

    /// Transport connection has failed.
    Failed,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the transport has failed.
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// BrowseResult
// =============================================================================

/// One child node returned from a browse operation.
#[derive(Debug, Clone)]
pub struct BrowseResult {
    /// The node ID of the child.
    pub node_id: NodeId,

    /// Browse name (machine-oriented, namespace-qualified).
    pub browse_name: String,

    /// Display name (human-oriented; the tree is keyed by this).
    pub display_name: String,

    /// Node class of the child.
    pub node_class: NodeClass,
}

impl BrowseResult {
    /// Creates a browse result entry.
    pub fn new(node_id: NodeId, display_name: impl Into<String>, node_class: NodeClass) -> Self {
        let display_name = display_name.into();
        Self {
            node_id,
            browse_name: display_name.clone(),
            display_name,
            node_class,
        }
    }
}

// =============================================================================
// ReadResult
// =============================================================================

/// Result of a node read operation.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// The node ID that was read.
    pub node_id: NodeId,

    /// The value read (if successful).
    pub value: Option<TagValue>,

    /// Status code of the read operation.
    pub status_code: u32,

    /// Server timestamp.
    pub server_timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// Source timestamp.
    pub source_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ReadResult {
    /// Creates a successful read result.
    pub fn success(node_id: NodeId, value: TagValue) -> Self {
        Self {
            node_id,
            value: Some(value),
            status_code: 0, // Good
            server_timestamp: Some(chrono::Utc::now()),
            source_timestamp: None,
        }
    }

    /// Creates a failed read result.
    pub fn failure(node_id: NodeId, status_code: u32) -> Self {
        Self {
            node_id,
            value: None,
            status_code,
            server_timestamp: Some(chrono::Utc::now()),
            source_timestamp: None,
        }
    }

    /// Returns `true` if the read was successful.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code == 0
    }

    /// Returns `true` if the status is bad.
    #[inline]
    pub fn is_bad(&self) -> bool {
        self.status_code & 0x8000_0000 != 0
    }
}

// =============================================================================
// WriteResult
// =============================================================================

/// Result of a node write operation.
#[derive(Debug, Clone)]
pub struct WriteResult {
    /// The node ID that was written.
    pub node_id: NodeId,

    /// Status code of the write operation.
    pub status_code: u32,
}

impl WriteResult {
    /// Creates a successful write result.
    pub fn success(node_id: NodeId) -> Self {
        Self {
            node_id,
            status_code: 0,
        }
    }

    /// Creates a failed write result.
    pub fn failure(node_id: NodeId, status_code: u32) -> Self {
        Self {
            node_id,
            status_code,
        }
    }

    /// Returns `true` if the write was successful.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status_code == 0
    }
}

// =============================================================================
// OpcUaTransport Trait
// =============================================================================

/// Abstract transport trait over the OPC UA client library.
///
/// Implementations handle the actual network communication and protocol
/// details; the wrapper only issues these calls, one at a time.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`.
#[async_trait]
pub trait OpcUaTransport: Send + Sync {
    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Establishes a connection to the server.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the endpoint is unreachable or the
    /// session cannot be established.
    async fn connect(&mut self) -> IoServerResult<()>;

    /// Closes the connection to the server.
    async fn disconnect(&mut self) -> IoServerResult<()>;

    /// Returns `true` if the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Returns the current transport state.
    fn state(&self) -> TransportState;

    // =========================================================================
    // Browse Operations
    // =========================================================================

    /// Returns the root node of the server's address space.
    async fn root_node(&self) -> IoServerResult<NodeId>;

    /// Browses the direct children of a node.
    async fn browse(&self, node_id: &NodeId) -> IoServerResult<Vec<BrowseResult>>;

    // =========================================================================
    // Read / Write Operations
    // =========================================================================

    /// Reads a single node value.
    async fn read_value(&self, node_id: &NodeId) -> IoServerResult<ReadResult>;

    /// Reads the declared variant type of a node's value attribute.
    async fn read_data_type(&self, node_id: &NodeId) -> IoServerResult<VariantType>;

    /// Writes a single node value.
    ///
    /// The value must already carry the node's declared variant type; the
    /// caller performs coercion before issuing the write.
    async fn write_value(&self, node_id: &NodeId, value: TagValue) -> IoServerResult<WriteResult>;

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Returns the server endpoint URL.
    fn endpoint(&self) -> &str;

    /// Returns the configuration.
    fn config(&self) -> &IoServerConfig;
}

// =============================================================================
// Tests
// =============================================================================
