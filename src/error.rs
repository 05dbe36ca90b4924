// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for IOServer operations.
//!
//! Failures are reported as explicit, typed errors rather than printed
//! diagnostics, so callers decide whether to log, propagate or ignore them.
//!
//! # Error Categories
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
//! # Examples
//!
//! ```
//! use movicon_opcua::error::{ConnectionError, IoServerError};
//!
//! let error = IoServerError::connection(ConnectionError::refused(
//!     "opc.tcp://localhost:62841",
//! ));
//! assert!(error.is_connection());
//! ```

use std::time::Duration;

use thiserror::Error;

/// Convenience alias for results of IOServer operations.
pub type IoServerResult<T> = Result<T, IoServerError>;

// =============================================================================
// IoServerError - Main Error Type
// =============================================================================

/// The main error type for IOServer operations.
///
/// Categorizes errors by domain so callers can handle connection failures
/// differently from write or conversion failures.
#[derive(Debug, Error)]
pub enum IoServerError {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Node tree browsing errors.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Read/write operation errors.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Value conversion errors.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl IoServerError {
    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a browse error.
    #[inline]
    pub fn browse(error: BrowseError) -> Self {
        Self::Browse(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a conversion error.
    #[inline]
    pub fn conversion(error: ConversionError) -> Self {
        Self::Conversion(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Shorthand for the common "not connected" error.
    #[inline]
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if this is a browse error.
    #[inline]
    pub fn is_browse(&self) -> bool {
        matches!(self, Self::Browse(_))
    }

    /// Returns `true` if this is an operation error.
    #[inline]
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation(_))
    }

    /// Returns `true` if this is a conversion error.
    #[inline]
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion(_))
    }

    /// Returns `true` if this is a configuration error.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns the error category name for logging.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Browse(_) => "browse",
            Self::Operation(_) => "operation",
            Self::Conversion(_) => "conversion",
            Self::Configuration(_) => "configuration",
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Errors establishing or using the connection to the IOServer.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The server actively refused the connection.
    #[error("Connection refused to '{endpoint}'")]
    Refused {
        /// The endpoint that refused the connection.
        endpoint: String,
    },

    /// The connection attempt timed out.
    #[error("Connection timed out to '{endpoint}' after {duration:?}")]
    Timeout {
        /// The endpoint that timed out.
        endpoint: String,
        /// How long the attempt waited.
        duration: Duration,
    },

    /// No endpoint could be discovered at the given URL.
    #[error("Endpoint not found: '{endpoint}'")]
    EndpointNotFound {
        /// The endpoint URL.
        endpoint: String,
    },

    /// The endpoint URL is malformed.
    #[error("Invalid endpoint URL: '{url}' - {reason}")]
    InvalidEndpoint {
        /// The offending URL.
        url: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The connection was closed by the peer.
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// An operation was attempted without an established connection.
    #[error("Not connected to the IOServer")]
    NotConnected,

    /// An underlying I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failure.
        message: String,
    },
}

impl ConnectionError {
    /// Creates a connection-refused error.
    pub fn refused(endpoint: impl Into<String>) -> Self {
        Self::Refused {
            endpoint: endpoint.into(),
        }
    }

    /// Creates a connection-timeout error.
    pub fn timeout(endpoint: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
            duration,
        }
    }

    /// Creates an endpoint-not-found error.
    pub fn endpoint_not_found(endpoint: impl Into<String>) -> Self {
        Self::EndpointNotFound {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Errors enumerating the server's node tree.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// The requested node does not exist.
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// The missing node id.
        node_id: String,
    },

    /// A browse call against a node failed.
    #[error("Browse failed for node '{node_id}': {message}")]
    BrowseFailed {
        /// The node being browsed.
        node_id: String,
        /// The underlying failure.
        message: String,
    },

    /// The walker descended past its configured depth bound.
    #[error("Maximum browse depth exceeded: {depth} (max: {max})")]
    DepthExceeded {
        /// The depth reached.
        depth: usize,
        /// The configured maximum.
        max: usize,
    },

    /// A tag path did not resolve to a node.
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The unresolved path.
        path: String,
    },
}

impl BrowseError {
    /// Creates a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Creates a browse-failed error.
    pub fn browse_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrowseFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a depth-exceeded error.
    pub fn depth_exceeded(depth: usize, max: usize) -> Self {
        Self::DepthExceeded { depth, max }
    }

    /// Creates a path-not-found error.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Errors reading or writing individual nodes.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A read against a node failed.
    #[error("Read failed for node '{node_id}': {message}")]
    ReadFailed {
        /// The node being read.
        node_id: String,
        /// The underlying failure.
        message: String,
    },

    /// A write against a node failed.
    #[error("Write failed for node '{node_id}': {message}")]
    WriteFailed {
        /// The node being written.
        node_id: String,
        /// The underlying failure.
        message: String,
    },

    /// The server reported a bad status code for the operation.
    #[error("Bad status code {status_code:#010x} for node '{node_id}'")]
    BadStatus {
        /// The node the operation targeted.
        node_id: String,
        /// The OPC UA status code.
        status_code: u32,
    },

    /// The target entry in the tag tree is a folder, not a tag.
    #[error("'{name}' is a folder, not a writable tag")]
    NotATag {
        /// Display name of the entry.
        name: String,
    },
}

impl OperationError {
    /// Creates a read-failed error.
    pub fn read_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a write-failed error.
    pub fn write_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a bad-status error.
    pub fn bad_status(node_id: impl Into<String>, status_code: u32) -> Self {
        Self::BadStatus {
            node_id: node_id.into(),
            status_code,
        }
    }

    /// Creates a not-a-tag error.
    pub fn not_a_tag(name: impl Into<String>) -> Self {
        Self::NotATag { name: name.into() }
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Errors coercing a value to a node's declared variant type.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The value cannot be represented as the declared type.
    #[error("Type mismatch: cannot convert {from} to {to}")]
    TypeMismatch {
        /// Source value type name.
        from: String,
        /// Declared target type name.
        to: String,
    },

    /// The value is representable but out of range for the declared type.
    #[error("Value {value} out of range for {target}")]
    OutOfRange {
        /// The offending value, rendered for diagnostics.
        value: String,
        /// Declared target type name.
        target: String,
    },

    /// The declared type is not supported for writes.
    #[error("Unsupported variant type for writes: {type_name}")]
    Unsupported {
        /// Declared type name.
        type_name: String,
    },
}

impl ConversionError {
    /// Creates a type-mismatch error.
    pub fn type_mismatch(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::TypeMismatch {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(value: impl Into<String>, target: impl Into<String>) -> Self {
        Self::OutOfRange {
            value: value.into(),
            target: target.into(),
        }
    }

    /// Creates an unsupported-type error.
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: type_name.into(),
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Errors in client configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required field is missing.
    #[error("Missing required configuration field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// A node id string could not be parsed.
    #[error("Invalid node ID: '{node_id}' - {reason}")]
    InvalidNodeId {
        /// The offending node id string.
        node_id: String,
        /// Why it is invalid.
        reason: String,
    },

    /// The hostname is empty or malformed.
    #[error("Invalid hostname: '{hostname}' - {reason}")]
    InvalidHostname {
        /// The offending hostname.
        hostname: String,
        /// Why it is invalid.
        reason: String,
    },

    /// A timeout value is unusable.
    #[error("Invalid timeout {value:?}: {reason}")]
    InvalidTimeout {
        /// The offending duration.
        value: Duration,
        /// Why it is invalid.
        reason: String,
    },

    /// The walk depth bound is unusable.
    #[error("Invalid walk depth {value}: {reason}")]
    InvalidWalkDepth {
        /// The offending depth.
        value: usize,
        /// Why it is invalid.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid-node-id error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-hostname error.
    pub fn invalid_hostname(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHostname {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-timeout error.
    pub fn invalid_timeout(value: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            value,
            reason: reason.into(),
        }
    }

    /// Creates an invalid-walk-depth error.
    pub fn invalid_walk_depth(value: usize, reason: impl Into<String>) -> Self {
        Self::InvalidWalkDepth {
            value,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
