// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core types for the IOServer wrapper.
//!
//! - **NodeId**: all four OPC UA node identifier kinds with parsing
//! - **NodeClass**: address-space classification (Variable, Object, ...)
//! - **VariantType**: the type tag attached to a value for wire encoding
//! - **TagValue**: tagged union of the value types a tag can carry
//! - **IoServerConfig**: connection configuration with builder and defaults
//!
//! # Examples
//!
//! ```
//! use movicon_opcua::types::{IoServerConfig, NodeId};
//!
//! let node_id: NodeId = "ns=2;s=Line1.Temperature".parse().unwrap();
//! assert_eq!(node_id.namespace_index, 2);
//!
//! let config = IoServerConfig::new("plc01");
//! assert_eq!(config.endpoint(), "opc.tcp://plc01:62841");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, IoServerError};

/// Default OPC UA transport port of the Movicon IOServer.
pub const DEFAULT_PORT: u16 = 62841;

/// Display name of the folder the IOServer exposes its tags under.
pub const OBJECTS_FOLDER_NAME: &str = "Objects";

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier: a namespace index plus an identifier that can be
/// numeric, string, GUID or opaque (byte string).
///
/// # Examples
///
/// ```
/// use movicon_opcua::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// let string = NodeId::string(2, "Line1.Temperature");
/// let parsed: NodeId = "ns=2;s=Line1.Temperature".parse().unwrap();
/// assert_eq!(string, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Root folder node (ns=0, i=84).
    pub const ROOT_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(84),
    };

    /// Objects folder node (ns=0, i=85).
    pub const OBJECTS_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(85),
    };

    /// Returns `true` if this is in the standard namespace (ns=0).
    #[inline]
    pub const fn is_standard(&self) -> bool {
        self.namespace_index == 0
    }

    /// Returns the null node ID (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self {
            namespace_index: 0,
            identifier: NodeIdentifier::Numeric(0),
        }
    }

    /// Returns `true` if this is the null node ID.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Converts to the OPC UA string format `ns=<ns>;{i|s|g|b}=<id>`.
    ///
    /// The `ns=` prefix is omitted for the standard namespace.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = IoServerError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported forms: `ns=2;i=1001`, `ns=2;s=MyTag`, `ns=2;g=<uuid>`,
    /// `ns=2;b=<base64>`, and the same without `ns=` for namespace 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace_index, identifier_part) = if let Some(rest) = s.strip_prefix("ns=") {
            let (ns_str, id_part) = rest.split_once(';').ok_or_else(|| {
                IoServerError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    "Missing identifier after namespace",
                ))
            })?;
            let ns: u16 = ns_str.parse().map_err(|_| {
                IoServerError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    "Invalid namespace index",
                ))
            })?;
            (ns, id_part)
        } else {
            (0, s)
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id.parse().map_err(|_| {
                IoServerError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    "Invalid numeric identifier",
                ))
            })?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| {
                IoServerError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    format!("Invalid GUID: {}", e),
                ))
            })?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64.decode(id).map_err(|e| {
                IoServerError::configuration(ConfigurationError::invalid_node_id(
                    s,
                    format!("Invalid base64: {}", e),
                ))
            })?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(IoServerError::configuration(
                ConfigurationError::invalid_node_id(
                    s,
                    "Unknown identifier type. Expected i=, s=, g=, or b=",
                ),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four node identifier kinds defined by the OPC UA specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier (standard nodes, most efficient).
    Numeric(u32),

    /// String identifier (custom nodes, human-readable).
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque identifier (application-specific byte array).
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// The OPC UA classification of an address-space entry.
///
/// The walker treats `Variable` nodes as tags (leaves) and `Object`/`View`
/// nodes as folders (branches); everything else is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// An object or folder node.
    Object,

    /// A variable node carrying a value (a tag).
    Variable,

    /// A callable method node.
    Method,

    /// An object type definition.
    ObjectType,

    /// A variable type definition.
    VariableType,

    /// A reference type definition.
    ReferenceType,

    /// A data type definition.
    DataType,

    /// A view node.
    View,
}

impl NodeClass {
    /// Returns the OPC UA node class bit value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from the OPC UA node class value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Object),
            2 => Some(Self::Variable),
            4 => Some(Self::Method),
            8 => Some(Self::ObjectType),
            16 => Some(Self::VariableType),
            32 => Some(Self::ReferenceType),
            64 => Some(Self::DataType),
            128 => Some(Self::View),
            _ => None,
        }
    }

    /// Returns `true` if nodes of this class carry a value.
    #[inline]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Variable)
    }

    /// Returns `true` if nodes of this class can contain children the
    /// walker should descend into.
    #[inline]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::Object | Self::View)
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// VariantType
// =============================================================================

/// The type tag OPC UA attaches to a value so it can be encoded correctly.
///
/// A tag's declared variant type drives the coercion applied before a write
/// (see [`crate::client::coerce_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    /// Boolean value.
    Boolean,

    /// Signed 8-bit integer.
    SByte,

    /// Unsigned 8-bit integer.
    Byte,

    /// Signed 16-bit integer.
    Int16,

    /// Unsigned 16-bit integer.
    UInt16,

    /// Signed 32-bit integer.
    Int32,

    /// Unsigned 32-bit integer.
    UInt32,

    /// Signed 64-bit integer.
    Int64,

    /// Unsigned 64-bit integer.
    UInt64,

    /// 32-bit IEEE 754 float.
    Float,

    /// 64-bit IEEE 754 double.
    Double,

    /// UTF-8 string.
    String,

    /// Date and time.
    DateTime,

    /// GUID.
    Guid,

    /// Raw byte string.
    ByteString,
}

impl VariantType {
    /// Returns the OPC UA built-in type ID.
    pub const fn type_id(&self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::SByte => 2,
            Self::Byte => 3,
            Self::Int16 => 4,
            Self::UInt16 => 5,
            Self::Int32 => 6,
            Self::UInt32 => 7,
            Self::Int64 => 8,
            Self::UInt64 => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::String => 12,
            Self::DateTime => 13,
            Self::Guid => 14,
            Self::ByteString => 15,
        }
    }

    /// Creates from the OPC UA built-in type ID.
    pub fn from_type_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Boolean),
            2 => Some(Self::SByte),
            3 => Some(Self::Byte),
            4 => Some(Self::Int16),
            5 => Some(Self::UInt16),
            6 => Some(Self::Int32),
            7 => Some(Self::UInt32),
            8 => Some(Self::Int64),
            9 => Some(Self::UInt64),
            10 => Some(Self::Float),
            11 => Some(Self::Double),
            12 => Some(Self::String),
            13 => Some(Self::DateTime),
            14 => Some(Self::Guid),
            15 => Some(Self::ByteString),
            _ => None,
        }
    }

    /// Returns `true` if this is an integer type.
    #[inline]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::SByte
                | Self::Byte
                | Self::Int16
                | Self::UInt16
                | Self::Int32
                | Self::UInt32
                | Self::Int64
                | Self::UInt64
        )
    }

    /// Returns `true` if this is a floating point type.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Returns `true` if this is a numeric type.
    #[inline]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// TagValue
// =============================================================================

/// A value read from or written to a tag.
///
/// Writes carry the node's declared [`VariantType`]; the caller supplies any
/// `TagValue` and [`crate::client::coerce_to`] resolves the conversion from
/// the declared type tag, so mismatches surface as typed errors instead of
/// server-side rejections.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// Boolean value.
    Boolean(bool),

    /// Signed byte.
    SByte(i8),

    /// Unsigned byte.
    Byte(u8),

    /// 16-bit signed integer.
    Int16(i16),

    /// 16-bit unsigned integer.
    UInt16(u16),

    /// 32-bit signed integer.
    Int32(i32),

    /// 32-bit unsigned integer.
    UInt32(u32),

    /// 64-bit signed integer.
    Int64(i64),

    /// 64-bit unsigned integer.
    UInt64(u64),

    /// 32-bit float.
    Float(f32),

    /// 64-bit double.
    Double(f64),

    /// String value.
    String(String),

    /// Date/time value.
    DateTime(chrono::DateTime<chrono::Utc>),

    /// GUID value.
    Guid(Uuid),

    /// Byte string.
    ByteString(Vec<u8>),

    /// Null value.
    Null,
}

impl TagValue {
    /// Returns the variant type of this value, or `None` for null.
    pub fn variant_type(&self) -> Option<VariantType> {
        match self {
            Self::Boolean(_) => Some(VariantType::Boolean),
            Self::SByte(_) => Some(VariantType::SByte),
            Self::Byte(_) => Some(VariantType::Byte),
            Self::Int16(_) => Some(VariantType::Int16),
            Self::UInt16(_) => Some(VariantType::UInt16),
            Self::Int32(_) => Some(VariantType::Int32),
            Self::UInt32(_) => Some(VariantType::UInt32),
            Self::Int64(_) => Some(VariantType::Int64),
            Self::UInt64(_) => Some(VariantType::UInt64),
            Self::Float(_) => Some(VariantType::Float),
            Self::Double(_) => Some(VariantType::Double),
            Self::String(_) => Some(VariantType::String),
            Self::DateTime(_) => Some(VariantType::DateTime),
            Self::Guid(_) => Some(VariantType::Guid),
            Self::ByteString(_) => Some(VariantType::ByteString),
            Self::Null => None,
        }
    }

    /// Returns the type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self.variant_type() {
            Some(vt) => vt.name(),
            None => "Null",
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get the value as an i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as an f64, widening numeric types.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for TagValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

// =============================================================================
// IoServerConfig
// =============================================================================

/// Connection configuration for the Movicon IOServer.
///
/// The endpoint URL is always derived as `opc.tcp://<hostname>:<port>`.
///
/// # Examples
///
/// ```
/// use movicon_opcua::types::IoServerConfig;
/// use std::time::Duration;
///
/// let config = IoServerConfig::builder()
///     .hostname("plc01.factory.local")
///     .connect_timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint(), "opc.tcp://plc01.factory.local:62841");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoServerConfig {
    /// Hostname or IP of the machine running the IOServer.
    pub hostname: String,

    /// OPC UA transport port of the IOServer.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Connection timeout.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Request timeout for individual operations.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum depth for the node tree walk.
    #[serde(default = "default_max_walk_depth")]
    pub max_walk_depth: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_application_name() -> String {
    "Movicon OPC UA Client".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_walk_depth() -> usize {
    32
}

impl IoServerConfig {
    /// Creates a configuration with the default port.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: default_port(),
            application_name: default_application_name(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_walk_depth: default_max_walk_depth(),
        }
    }

    /// Creates a configuration with an explicit port.
    pub fn with_port(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            port,
            ..Self::new(hostname)
        }
    }

    /// Creates a new configuration builder.
    pub fn builder() -> IoServerConfigBuilder {
        IoServerConfigBuilder::default()
    }

    /// Returns the derived endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("opc.tcp://{}:{}", self.hostname, self.port)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), IoServerError> {
        if self.hostname.is_empty() {
            return Err(IoServerError::configuration(
                ConfigurationError::missing_field("hostname"),
            ));
        }

        if self.hostname.contains(['/', ':', ' ']) {
            return Err(IoServerError::configuration(
                ConfigurationError::invalid_hostname(
                    &self.hostname,
                    "Hostname must not contain '/', ':' or whitespace",
                ),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(IoServerError::configuration(
                ConfigurationError::invalid_timeout(
                    self.connect_timeout,
                    "Connect timeout must be greater than 0",
                ),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(IoServerError::configuration(
                ConfigurationError::invalid_timeout(
                    self.request_timeout,
                    "Request timeout must be greater than 0",
                ),
            ));
        }

        if self.max_walk_depth == 0 {
            return Err(IoServerError::configuration(
                ConfigurationError::invalid_walk_depth(
                    self.max_walk_depth,
                    "Walk depth must be greater than 0",
                ),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// IoServerConfigBuilder
// =============================================================================

/// Builder for [`IoServerConfig`].
#[derive(Debug, Default)]
pub struct IoServerConfigBuilder {
    hostname: Option<String>,
    port: Option<u16>,
    application_name: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_walk_depth: Option<usize>,
}

impl IoServerConfigBuilder {
    /// Sets the hostname.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the maximum walk depth.
    pub fn max_walk_depth(mut self, depth: usize) -> Self {
        self.max_walk_depth = Some(depth);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<IoServerConfig, IoServerError> {
        let hostname = self.hostname.ok_or_else(|| {
            IoServerError::configuration(ConfigurationError::missing_field("hostname"))
        })?;

        let config = IoServerConfig {
            hostname,
            port: self.port.unwrap_or_else(default_port),
            application_name: self
                .application_name
                .unwrap_or_else(default_application_name),
            connect_timeout: self.connect_timeout.unwrap_or_else(default_connect_timeout),
            request_timeout: self.request_timeout.unwrap_or_else(default_request_timeout),
            max_walk_depth: self.max_walk_depth.unwrap_or_else(default_max_walk_depth),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_constructors() {
        let numeric = NodeId::numeric(2, 1001);
        assert_eq!(numeric.namespace_index, 2);
        assert_eq!(numeric.to_opc_string(), "ns=2;i=1001");

        let string = NodeId::string(2, "Line1.Temperature");
        assert_eq!(string.to_opc_string(), "ns=2;s=Line1.Temperature");

        let standard = NodeId::numeric(0, 85);
        assert_eq!(standard.to_opc_string(), "i=85");
        assert!(standard.is_standard());
    }

    #[test]
    fn test_node_id_parse_roundtrip() {
        for s in [
            "ns=2;i=1001",
            "ns=2;s=Line1.Temperature",
            "i=85",
            "s=MyTag",
            "ns=4;g=550e8400-e29b-41d4-a716-446655440000",
            "ns=3;b=SGVsbG8=",
        ] {
            let parsed: NodeId = s.parse().unwrap();
            assert_eq!(parsed.to_opc_string(), s, "round-trip failed for {}", s);
        }
    }

    #[test]
    fn test_node_id_parse_errors() {
        assert!("".parse::<NodeId>().is_err());
        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=2;q=1".parse::<NodeId>().is_err());
        assert!("ns=2;i=notanumber".parse::<NodeId>().is_err());
        assert!("ns=2;g=not-a-guid".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_standard_folders() {
        assert_eq!(NodeId::ROOT_FOLDER.to_opc_string(), "i=84");
        assert_eq!(NodeId::OBJECTS_FOLDER.to_opc_string(), "i=85");
        assert!(NodeId::null().is_null());
        assert!(!NodeId::ROOT_FOLDER.is_null());
    }

    #[test]
    fn test_node_class_values() {
        assert_eq!(NodeClass::Object.value(), 1);
        assert_eq!(NodeClass::Variable.value(), 2);
        assert_eq!(NodeClass::from_value(2), Some(NodeClass::Variable));
        assert_eq!(NodeClass::from_value(4), Some(NodeClass::Method));
        assert_eq!(NodeClass::from_value(3), None);

        assert!(NodeClass::Variable.is_variable());
        assert!(NodeClass::Object.is_container());
        assert!(NodeClass::View.is_container());
        assert!(!NodeClass::Method.is_variable());
        assert!(!NodeClass::Method.is_container());
    }

    #[test]
    fn test_variant_type_ids() {
        assert_eq!(VariantType::Boolean.type_id(), 1);
        assert_eq!(VariantType::Double.type_id(), 11);
        assert_eq!(VariantType::from_type_id(11), Some(VariantType::Double));
        assert_eq!(VariantType::from_type_id(99), None);

        assert!(VariantType::Int32.is_integer());
        assert!(VariantType::Float.is_float());
        assert!(VariantType::UInt64.is_numeric());
        assert!(!VariantType::String.is_numeric());
    }

    #[test]
    fn test_tag_value_accessors() {
        assert_eq!(TagValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(TagValue::Int32(42).as_i64(), Some(42));
        assert_eq!(TagValue::Int32(42).as_f64(), Some(42.0));
        assert_eq!(TagValue::from("hello").as_str(), Some("hello"));
        assert!(TagValue::Null.is_null());
        assert_eq!(TagValue::UInt64(u64::MAX).as_i64(), None);
    }

    #[test]
    fn test_tag_value_variant_type() {
        assert_eq!(
            TagValue::Double(1.5).variant_type(),
            Some(VariantType::Double)
        );
        assert_eq!(TagValue::Null.variant_type(), None);
        assert_eq!(TagValue::Null.type_name(), "Null");
        assert_eq!(TagValue::Int16(7).type_name(), "Int16");
    }

    #[test]
    fn test_config_defaults() {
        let config = IoServerConfig::new("plc01");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.endpoint(), "opc.tcp://plc01:62841");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_custom_port() {
        let config = IoServerConfig::with_port("10.0.0.5", 4840);
        assert_eq!(config.endpoint(), "opc.tcp://10.0.0.5:4840");
    }

    #[test]
    fn test_config_builder() {
        let config = IoServerConfig::builder()
            .hostname("plc01")
            .port(4840)
            .connect_timeout(Duration::from_secs(5))
            .max_walk_depth(8)
            .build()
            .unwrap();

        assert_eq!(config.port, 4840);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_walk_depth, 8);
    }

    #[test]
    fn test_config_validation() {
        assert!(IoServerConfig::builder().build().is_err());

        let config = IoServerConfig::new("");
        assert!(config.validate().is_err());

        let config = IoServerConfig::new("bad host");
        assert!(config.validate().is_err());

        let mut config = IoServerConfig::new("plc01");
        config.max_walk_depth = 0;
        assert!(config.validate().is_err());

        let mut config = IoServerConfig::new("plc01");
        config.connect_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let json = r#"{"hostname": "plc01"}"#;
        let config: IoServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));

        let json = r#"{"hostname": "plc01", "port": 4840, "connect_timeout": "3s"}"#;
        let config: IoServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port, 4840);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }
}
