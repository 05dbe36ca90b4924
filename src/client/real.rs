// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Real transport implementation using the `opcua` crate.
//!
//! Connects with an anonymous session and no message security, matching the
//! IOServer's default endpoint configuration. Security negotiation beyond
//! that is the client library's business, not the wrapper's.
//!
//! # Example
//!
//! ```rust,ignore
//! use movicon_opcua::client::{OpcUaTransport, RealTransport};
//! use movicon_opcua::types::IoServerConfig;
//!
//! let config = IoServerConfig::new("plc01");
//! let mut transport = RealTransport::new(config);
//! transport.connect().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, trace};

use opcua::client::prelude::*;
use opcua::sync::RwLock as OpcUaRwLock;

use crate::client::transport::{
    BrowseResult, OpcUaTransport, ReadResult, TransportState, WriteResult,
};
use crate::error::{
    BrowseError, ConnectionError, IoServerError, IoServerResult, OperationError,
};
use crate::types::{
    IoServerConfig, NodeClass, NodeId, NodeIdentifier, TagValue, VariantType,
};

/// OPC UA attribute id of the Value attribute.
const ATTRIBUTE_VALUE: u32 = 13;

/// OPC UA attribute id of the DataType attribute.
const ATTRIBUTE_DATA_TYPE: u32 = 14;

// =============================================================================
// RealTransport
// =============================================================================

/// Transport backed by the `opcua` crate.
pub struct RealTransport {
    /// Configuration for the transport.
    config: IoServerConfig,

    /// Derived endpoint URL, kept so `endpoint()` can hand out a borrow.
    endpoint_url: String,

    /// Current connection state.
    state: RwLock<TransportState>,

    /// The underlying OPC UA session.
    session: RwLock<Option<Arc<OpcUaRwLock<Session>>>>,
}

impl RealTransport {
    /// Creates a new transport with the given configuration.
    pub fn new(config: IoServerConfig) -> Self {
        let endpoint_url = config.endpoint();
        Self {
            config,
            endpoint_url,
            state: RwLock::new(TransportState::Disconnected),
            session: RwLock::new(None),
        }
    }

    /// Builds the OPC UA client from configuration.
    fn build_client(&self) -> IoServerResult<Client> {
        let builder = ClientBuilder::new()
            .application_name(&self.config.application_name)
            .application_uri("urn:movicon-opcua")
            .session_retry_limit(0)
            .session_timeout(self.config.request_timeout.as_millis() as u32)
            .trust_server_certs(true);

        builder.client().ok_or_else(|| {
            IoServerError::connection(ConnectionError::invalid_endpoint(
                &self.endpoint_url,
                "Failed to build OPC UA client",
            ))
        })
    }

    /// Converts our NodeId to an opcua NodeId.
    fn to_opcua_node_id(node_id: &NodeId) -> opcua::types::NodeId {
        match &node_id.identifier {
            NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(node_id.namespace_index, *v),
            NodeIdentifier::String(v) => {
                opcua::types::NodeId::new(node_id.namespace_index, v.clone())
            }
            NodeIdentifier::Guid(v) => {
                opcua::types::NodeId::new(node_id.namespace_index, opcua::types::Guid::from(*v))
            }
            NodeIdentifier::Opaque(v) => opcua::types::NodeId::new(
                node_id.namespace_index,
                opcua::types::ByteString::from(v.as_slice()),
            ),
        }
    }

    /// Converts an opcua NodeId to our NodeId.
    fn from_opcua_node_id(node_id: &opcua::types::NodeId) -> NodeId {
        let namespace_index = node_id.namespace;
        match &node_id.identifier {
            opcua::types::Identifier::Numeric(v) => NodeId::numeric(namespace_index, *v),
            opcua::types::Identifier::String(v) => NodeId::string(namespace_index, v.as_ref()),
            opcua::types::Identifier::Guid(v) => {
                NodeId::guid(namespace_index, uuid::Uuid::from_bytes(*v.as_bytes()))
            }
            opcua::types::Identifier::ByteString(v) => {
                NodeId::opaque(namespace_index, v.value.clone().unwrap_or_default())
            }
        }
    }

    /// Converts an opcua Variant to a TagValue.
    fn from_opcua_variant(variant: &opcua::types::Variant) -> TagValue {
        use opcua::types::Variant;

        match variant {
            Variant::Empty => TagValue::Null,
            Variant::Boolean(v) => TagValue::Boolean(*v),
            Variant::SByte(v) => TagValue::SByte(*v),
            Variant::Byte(v) => TagValue::Byte(*v),
            Variant::Int16(v) => TagValue::Int16(*v),
            Variant::UInt16(v) => TagValue::UInt16(*v),
            Variant::Int32(v) => TagValue::Int32(*v),
            Variant::UInt32(v) => TagValue::UInt32(*v),
            Variant::Int64(v) => TagValue::Int64(*v),
            Variant::UInt64(v) => TagValue::UInt64(*v),
            Variant::Float(v) => TagValue::Float(*v),
            Variant::Double(v) => TagValue::Double(*v),
            Variant::String(v) => TagValue::String(v.as_ref().to_string()),
            Variant::DateTime(v) => {
                let dt = chrono::DateTime::from_timestamp(
                    v.as_chrono().timestamp(),
                    v.as_chrono().timestamp_subsec_nanos(),
                )
                .unwrap_or_else(chrono::Utc::now);
                TagValue::DateTime(dt)
            }
            Variant::Guid(v) => TagValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
            Variant::ByteString(v) => TagValue::ByteString(v.value.clone().unwrap_or_default()),
            other => TagValue::String(format!("{:?}", other)),
        }
    }

    /// Converts a TagValue to an opcua Variant.
    fn to_opcua_variant(value: &TagValue) -> opcua::types::Variant {
        use opcua::types::Variant;

        match value {
            TagValue::Null => Variant::Empty,
            TagValue::Boolean(v) => Variant::Boolean(*v),
            TagValue::SByte(v) => Variant::SByte(*v),
            TagValue::Byte(v) => Variant::Byte(*v),
            TagValue::Int16(v) => Variant::Int16(*v),
            TagValue::UInt16(v) => Variant::UInt16(*v),
            TagValue::Int32(v) => Variant::Int32(*v),
            TagValue::UInt32(v) => Variant::UInt32(*v),
            TagValue::Int64(v) => Variant::Int64(*v),
            TagValue::UInt64(v) => Variant::UInt64(*v),
            TagValue::Float(v) => Variant::Float(*v),
            TagValue::Double(v) => Variant::Double(*v),
            TagValue::String(v) => Variant::String(opcua::types::UAString::from(v.as_str())),
            TagValue::DateTime(v) => {
                Variant::DateTime(Box::new(opcua::types::DateTime::from(*v)))
            }
            TagValue::Guid(v) => Variant::Guid(Box::new(opcua::types::Guid::from(*v))),
            TagValue::ByteString(v) => {
                Variant::ByteString(opcua::types::ByteString::from(v.as_slice()))
            }
        }
    }

    /// Gets the session, returning an error if not connected.
    async fn get_session(&self) -> IoServerResult<Arc<OpcUaRwLock<Session>>> {
        let session_guard = self.session.read().await;
        session_guard
            .clone()
            .ok_or_else(|| IoServerError::connection(ConnectionError::NotConnected))
    }

    /// Reads one attribute of a node and returns its data value.
    async fn read_attribute(
        &self,
        node_id: &NodeId,
        attribute_id: u32,
    ) -> IoServerResult<opcua::types::DataValue> {
        let session = self.get_session().await?;
        let opcua_node_id = Self::to_opcua_node_id(node_id);

        let read_value_id = ReadValueId {
            node_id: opcua_node_id,
            attribute_id,
            index_range: opcua::types::UAString::null(),
            data_encoding: opcua::types::QualifiedName::null(),
        };

        let session_locked = session.read();
        let mut result = session_locked
            .read(&[read_value_id], TimestampsToReturn::Both, 0.0)
            .map_err(|e| {
                IoServerError::operation(OperationError::read_failed(
                    node_id.to_string(),
                    format!("Read failed: {:?}", e),
                ))
            })?;

        if result.is_empty() {
            return Err(IoServerError::operation(OperationError::read_failed(
                node_id.to_string(),
                "Empty read response",
            )));
        }

        Ok(result.remove(0))
    }
}

#[async_trait]
impl OpcUaTransport for RealTransport {
    async fn connect(&mut self) -> IoServerResult<()> {
        {
            let mut state = self.state.write().await;
            *state = TransportState::Connecting;
        }

        info!(endpoint = %self.endpoint_url, "Connecting to IOServer");

        let result = self.establish_session().await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                *state = TransportState::Connected;
                info!(endpoint = %self.endpoint_url, "Connected to IOServer");
                Ok(())
            }
            Err(e) => {
                *state = TransportState::Failed;
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> IoServerResult<()> {
        info!("Disconnecting from IOServer");

        let session_opt = {
            let mut session_guard = self.session.write().await;
            session_guard.take()
        };

        if let Some(session) = session_opt {
            let session_locked = session.read();
            session_locked.disconnect();
        }

        {
            let mut state = self.state.write().await;
            *state = TransportState::Disconnected;
        }

        info!("Disconnected from IOServer");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if let Ok(state) = self.state.try_read() {
            state.is_connected()
        } else {
            false
        }
    }

    fn state(&self) -> TransportState {
        if let Ok(state) = self.state.try_read() {
            *state
        } else {
            TransportState::Disconnected
        }
    }

    async fn root_node(&self) -> IoServerResult<NodeId> {
        if !self.is_connected() {
            return Err(IoServerError::not_connected());
        }
        Ok(NodeId::ROOT_FOLDER)
    }

    async fn browse(&self, node_id: &NodeId) -> IoServerResult<Vec<BrowseResult>> {
        let session = self.get_session().await?;
        let opcua_node_id = Self::to_opcua_node_id(node_id);

        trace!(node_id = %node_id, "Browsing node");

        let browse_description = BrowseDescription {
            node_id: opcua_node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BrowseDescriptionResultMask::all().bits(),
        };

        let session_locked = session.read();
        let browse_results = session_locked.browse(&[browse_description]).map_err(|e| {
            IoServerError::browse(BrowseError::browse_failed(
                node_id.to_string(),
                format!("Browse failed: {}", e),
            ))
        })?;

        let browse_results = browse_results.ok_or_else(|| {
            IoServerError::browse(BrowseError::browse_failed(
                node_id.to_string(),
                "No browse results returned",
            ))
        })?;

        if browse_results.is_empty() {
            return Ok(Vec::new());
        }

        let result = &browse_results[0];
        let Some(ref refs) = result.references else {
            return Ok(Vec::new());
        };

        let children = refs
            .iter()
            .filter_map(|r| {
                let node_class = NodeClass::from_value(r.node_class as u32)?;
                Some(BrowseResult {
                    node_id: Self::from_opcua_node_id(&r.node_id.node_id),
                    browse_name: r.browse_name.name.as_ref().to_string(),
                    display_name: r.display_name.text.as_ref().to_string(),
                    node_class,
                })
            })
            .collect();

        Ok(children)
    }

    async fn read_value(&self, node_id: &NodeId) -> IoServerResult<ReadResult> {
        trace!(node_id = %node_id, "Reading node value");

        let data_value = self.read_attribute(node_id, ATTRIBUTE_VALUE).await?;
        let status_code = data_value.status.as_ref().map(|s| s.bits()).unwrap_or(0);

        if let Some(ref variant) = data_value.value {
            let value = Self::from_opcua_variant(variant);
            let mut result = ReadResult::success(node_id.clone(), value);
            result.status_code = status_code;
            result.server_timestamp = data_value.server_timestamp.map(|t| {
                chrono::DateTime::from_timestamp(
                    t.as_chrono().timestamp(),
                    t.as_chrono().timestamp_subsec_nanos(),
                )
                .unwrap_or_else(chrono::Utc::now)
            });
            result.source_timestamp = data_value.source_timestamp.map(|t| {
                chrono::DateTime::from_timestamp(
                    t.as_chrono().timestamp(),
                    t.as_chrono().timestamp_subsec_nanos(),
                )
                .unwrap_or_else(chrono::Utc::now)
            });
            Ok(result)
        } else {
            Ok(ReadResult::failure(node_id.clone(), status_code))
        }
    }

    async fn read_data_type(&self, node_id: &NodeId) -> IoServerResult<VariantType> {
        trace!(node_id = %node_id, "Reading node data type");

        let data_value = self.read_attribute(node_id, ATTRIBUTE_DATA_TYPE).await?;

        let Some(opcua::types::Variant::NodeId(ref type_node)) = data_value.value else {
            return Err(IoServerError::operation(OperationError::read_failed(
                node_id.to_string(),
                "DataType attribute did not return a node id",
            )));
        };

        let type_node = Self::from_opcua_node_id(type_node.as_ref());
        match &type_node.identifier {
            NodeIdentifier::Numeric(id) if type_node.namespace_index == 0 => {
                VariantType::from_type_id(*id).ok_or_else(|| {
                    IoServerError::operation(OperationError::read_failed(
                        node_id.to_string(),
                        format!("Unsupported data type node: {}", type_node),
                    ))
                })
            }
            _ => Err(IoServerError::operation(OperationError::read_failed(
                node_id.to_string(),
                format!("Unsupported data type node: {}", type_node),
            ))),
        }
    }

    async fn write_value(&self, node_id: &NodeId, value: TagValue) -> IoServerResult<WriteResult> {
        let session = self.get_session().await?;
        let opcua_node_id = Self::to_opcua_node_id(node_id);
        let variant = Self::to_opcua_variant(&value);

        trace!(node_id = %node_id, "Writing node value");

        let write_value = WriteValue {
            node_id: opcua_node_id,
            attribute_id: ATTRIBUTE_VALUE,
            index_range: opcua::types::UAString::null(),
            value: opcua::types::DataValue::new_now(variant),
        };

        let session_locked = session.read();
        let results = session_locked.write(&[write_value]).map_err(|e| {
            IoServerError::operation(OperationError::write_failed(
                node_id.to_string(),
                format!("Write failed: {}", e),
            ))
        })?;

        if results.is_empty() {
            return Ok(WriteResult::failure(node_id.clone(), 0x8000_0000));
        }

        let status_code = results[0].bits();
        if results[0].is_good() {
            Ok(WriteResult::success(node_id.clone()))
        } else {
            Ok(WriteResult::failure(node_id.clone(), status_code))
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint_url
    }

    fn config(&self) -> &IoServerConfig {
        &self.config
    }
}

impl RealTransport {
    /// Builds the client, discovers the endpoint and opens an anonymous
    /// session. Split out so `connect` can record the failure state once.
    async fn establish_session(&self) -> IoServerResult<()> {
        let client = self.build_client()?;

        let endpoints = client
            .get_server_endpoints_from_url(&self.endpoint_url)
            .map_err(|_| {
                IoServerError::connection(ConnectionError::endpoint_not_found(&self.endpoint_url))
            })?;

        // The IOServer's default endpoint runs without message security.
        let endpoint = endpoints
            .iter()
            .find(|e| {
                e.security_policy_uri.as_ref() == SecurityPolicy::None.to_uri()
                    && e.security_mode == opcua::types::MessageSecurityMode::None
            })
            .cloned()
            .ok_or_else(|| {
                IoServerError::connection(ConnectionError::endpoint_not_found(format!(
                    "{} (no security-less endpoint offered)",
                    self.endpoint_url
                )))
            })?;

        debug!(
            security_policy = %endpoint.security_policy_uri,
            security_mode = ?endpoint.security_mode,
            "Found matching endpoint"
        );

        let mut client = client;
        let session = client
            .connect_to_endpoint(endpoint, IdentityToken::Anonymous)
            .map_err(|_| {
                IoServerError::connection(ConnectionError::refused(&self.endpoint_url))
            })?;

        let mut session_guard = self.session.write().await;
        *session_guard = Some(session);
        Ok(())
    }
}
