// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! IOServer Integration Tests
//!
//! These tests run against a mock transport that models an IOServer address
//! space in memory, so no real server is needed. The mock exposes the same
//! shape the IOServer does: a root folder containing an `"Objects"` folder,
//! under which tags and tag folders live.
//!
//! ```bash
//! cargo test --test ioserver_integration
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use movicon_opcua::client::{
    BrowseResult, OpcUaTransport, ReadResult, TransportState, WriteResult,
};
use movicon_opcua::{
    IoServer, IoServerConfig, IoServerResult, NodeClass, NodeId, TagValue, VariantType,
};
use movicon_opcua::error::{ConnectionError, IoServerError};

// =============================================================================
// Mock Transport
// =============================================================================

/// Shared state of the mock server, kept behind an `Arc` so tests can
/// inspect it after handing the transport to an `IoServer`.
#[derive(Default)]
struct MockState {
    connected: AtomicBool,
    /// Children per node, in enumeration order.
    graph: RwLock<HashMap<NodeId, Vec<BrowseResult>>>,
    /// Current values per node.
    values: RwLock<HashMap<NodeId, TagValue>>,
    /// Declared variant type per variable node.
    data_types: RwLock<HashMap<NodeId, VariantType>>,
    /// When set, `connect` fails as if the endpoint were unreachable.
    unreachable: AtomicBool,
}

/// Mock transport modeling an IOServer address space in memory.
#[derive(Clone)]
struct MockTransport {
    state: Arc<MockState>,
    config: IoServerConfig,
    endpoint: String,
}

impl MockTransport {
    fn new() -> Self {
        Self::with_config(IoServerConfig::new("localhost"))
    }

    fn with_config(config: IoServerConfig) -> Self {
        let endpoint = config.endpoint();
        Self {
            state: Arc::new(MockState::default()),
            config,
            endpoint,
        }
    }

    fn unreachable() -> Self {
        let transport = Self::new();
        transport.state.unreachable.store(true, Ordering::SeqCst);
        transport
    }

    /// Adds a folder under `parent` and returns its node id.
    fn add_folder(&self, parent: &NodeId, id: u32, name: &str) -> NodeId {
        let node_id = NodeId::numeric(2, id);
        self.add_child(parent, BrowseResult::new(node_id.clone(), name, NodeClass::Object));
        node_id
    }

    /// Adds a variable under `parent` with a declared type and initial value.
    fn add_tag(
        &self,
        parent: &NodeId,
        id: u32,
        name: &str,
        data_type: VariantType,
        value: TagValue,
    ) -> NodeId {
        let node_id = NodeId::numeric(2, id);
        self.add_child(
            parent,
            BrowseResult::new(node_id.clone(), name, NodeClass::Variable),
        );
        self.state
            .data_types
            .write()
            .unwrap()
            .insert(node_id.clone(), data_type);
        self.state
            .values
            .write()
            .unwrap()
            .insert(node_id.clone(), value);
        node_id
    }

    /// Adds an arbitrary child entry under `parent`.
    fn add_child(&self, parent: &NodeId, entry: BrowseResult) {
        self.state
            .graph
            .write()
            .unwrap()
            .entry(parent.clone())
            .or_default()
            .push(entry);
    }

    fn stored_value(&self, node_id: &NodeId) -> Option<TagValue> {
        self.state.values.read().unwrap().get(node_id).cloned()
    }
}

#[async_trait]
impl OpcUaTransport for MockTransport {
    async fn connect(&mut self) -> IoServerResult<()> {
        if self.state.unreachable.load(Ordering::SeqCst) {
            return Err(IoServerError::connection(ConnectionError::refused(
                &self.endpoint,
            )));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> IoServerResult<()> {
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn state(&self) -> TransportState {
        if self.is_connected() {
            TransportState::Connected
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
        if !self.is_connected() {
            return Err(IoServerError::not_connected());
        }
        Ok(self
            .state
            .graph
            .read()
            .unwrap()
            .get(node_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn read_value(&self, node_id: &NodeId) -> IoServerResult<ReadResult> {
        let value = self
            .stored_value(node_id)
            .unwrap_or(TagValue::Null);
        Ok(ReadResult::success(node_id.clone(), value))
    }

    async fn read_data_type(&self, node_id: &NodeId) -> IoServerResult<VariantType> {
        self.state
            .data_types
            .read()
            .unwrap()
            .get(node_id)
            .copied()
            .ok_or_else(|| {
                IoServerError::operation(movicon_opcua::error::OperationError::read_failed(
                    node_id.to_string(),
                    "No declared data type",
                ))
            })
    }

    async fn write_value(&self, node_id: &NodeId, value: TagValue) -> IoServerResult<WriteResult> {
        self.state
            .values
            .write()
            .unwrap()
            .insert(node_id.clone(), value);
        Ok(WriteResult::success(node_id.clone()))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn config(&self) -> &IoServerConfig {
        &self.config
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Builds the canonical mock space:
///
/// ```text
/// Root
/// └── Objects
///     ├── Temperature  (Double = 21.5)
///     └── Motors
///         └── Motor1   (Boolean = false)
/// ```
fn sample_transport() -> MockTransport {
    let transport = MockTransport::new();
    let objects = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    transport.add_tag(
        &objects,
        101,
        "Temperature",
        VariantType::Double,
        TagValue::Double(21.5),
    );
    let motors = transport.add_folder(&objects, 102, "Motors");
    transport.add_tag(
        &motors,
        103,
        "Motor1",
        VariantType::Boolean,
        TagValue::Boolean(false),
    );
    transport
}

// =============================================================================
// Connection
// =============================================================================

#[tokio::test]
async fn test_connect_builds_tag_tree() {
    let mut server = IoServer::new(sample_transport());
    server.connect().await.unwrap();

    assert!(server.is_connected());

    let tags = server.tags().unwrap();
    assert!(tags.get("Temperature").unwrap().is_leaf());
    assert!(tags.get("Motors").unwrap().is_branch());
    assert!(tags.lookup("Motors/Motor1").unwrap().is_leaf());
    assert_eq!(tags.leaf_count(), 2);
}

#[tokio::test]
async fn test_connect_unreachable_returns_connection_error() {
    let mut server = IoServer::new(MockTransport::unreachable());

    let err = server.connect().await.unwrap_err();
    assert!(err.is_connection());
    assert!(!server.is_connected());
    assert!(server.tags().is_err());
}

#[tokio::test]
async fn test_try_connect_unreachable_returns_false() {
    let mut server = IoServer::new(MockTransport::unreachable());
    assert!(!server.try_connect().await);
    assert!(!server.is_connected());
}

#[tokio::test]
async fn test_try_connect_success_returns_true() {
    let mut server = IoServer::new(sample_transport());
    assert!(server.try_connect().await);
    assert!(server.is_connected());
}

#[tokio::test]
async fn test_disconnect_drops_tree() {
    let mut server = IoServer::new(sample_transport());
    server.connect().await.unwrap();
    server.disconnect().await.unwrap();

    assert!(!server.is_connected());
    let err = server.tags().unwrap_err();
    assert!(err.is_connection());
}

#[tokio::test]
async fn test_operations_before_connect_fail_typed() {
    let transport = sample_transport();
    let tag = movicon_opcua::TagNode::new(NodeId::numeric(2, 101), "Temperature");
    let server = IoServer::new(transport);

    assert!(server.tags().is_err());
    assert!(server.read_tag(&tag).await.unwrap_err().is_connection());
    assert!(server
        .set_tag(&tag, TagValue::Double(1.0))
        .await
        .unwrap_err()
        .is_connection());
}

// =============================================================================
// Tree walking
// =============================================================================

#[tokio::test]
async fn test_walk_counts_variables_and_containers() {
    // 3 variables + 2 containers directly under Objects -> 5 keys.
    let transport = MockTransport::new();
    let objects = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    for (i, name) in ["A", "B", "C"].iter().enumerate() {
        transport.add_tag(
            &objects,
            200 + i as u32,
            name,
            VariantType::Int32,
            TagValue::Int32(0),
        );
    }
    transport.add_folder(&objects, 300, "Folder1");
    transport.add_folder(&objects, 301, "Folder2");

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let tags = server.tags().unwrap();
    let children = tags.as_branch().unwrap();
    assert_eq!(children.len(), 5);
    assert_eq!(tags.leaf_count(), 3);
    assert!(tags.get("Folder1").unwrap().is_branch());
    assert!(tags.get("Folder1").unwrap().is_empty());
}

#[tokio::test]
async fn test_walk_empty_folder_yields_empty_mapping() {
    let transport = MockTransport::new();
    transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let tags = server.tags().unwrap();
    assert!(tags.is_empty());
}

#[tokio::test]
async fn test_duplicate_display_names_later_wins() {
    let transport = MockTransport::new();
    let objects = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    transport.add_tag(
        &objects,
        101,
        "Sensor",
        VariantType::Int32,
        TagValue::Int32(1),
    );
    transport.add_tag(
        &objects,
        102,
        "Sensor",
        VariantType::Int32,
        TagValue::Int32(2),
    );

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let tags = server.tags().unwrap();
    assert_eq!(tags.as_branch().unwrap().len(), 1);
    let tag = tags.lookup_tag("Sensor").unwrap();
    assert_eq!(tag.node_id, NodeId::numeric(2, 102));
}

#[tokio::test]
async fn test_walk_skips_method_nodes() {
    let transport = MockTransport::new();
    let objects = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    transport.add_child(
        &objects,
        BrowseResult::new(NodeId::numeric(2, 999), "Reset", NodeClass::Method),
    );
    transport.add_tag(
        &objects,
        101,
        "Temperature",
        VariantType::Double,
        TagValue::Double(0.0),
    );

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let tags = server.tags().unwrap();
    assert_eq!(tags.as_branch().unwrap().len(), 1);
    assert!(tags.get("Reset").is_none());
}

#[tokio::test]
async fn test_walk_terminates_on_cycles() {
    let transport = MockTransport::new();
    let objects = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    let loop_a = transport.add_folder(&objects, 200, "LoopA");
    let loop_b = transport.add_folder(&loop_a, 201, "LoopB");
    // LoopB references LoopA again, closing the cycle.
    transport.add_child(
        &loop_b,
        BrowseResult::new(loop_a.clone(), "LoopA", NodeClass::Object),
    );

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let tags = server.tags().unwrap();
    let loop_b_tree = tags.lookup("LoopA/LoopB").unwrap();
    // The back-reference is skipped, not descended into.
    assert!(loop_b_tree.is_empty());
}

#[tokio::test]
async fn test_walk_depth_bound_yields_typed_error() {
    let config = IoServerConfig::builder()
        .hostname("localhost")
        .max_walk_depth(3)
        .build()
        .unwrap();
    let transport = MockTransport::with_config(config);

    let mut parent = transport.add_folder(&NodeId::ROOT_FOLDER, 100, "Objects");
    for i in 0..5 {
        parent = transport.add_folder(&parent, 200 + i, &format!("Level{}", i));
    }

    let mut server = IoServer::new(transport);
    let err = server.connect().await.unwrap_err();
    assert!(err.is_browse());
    assert!(err.to_string().contains("depth"));
    assert!(!server.is_connected());
}

#[tokio::test]
async fn test_missing_objects_folder_is_browse_error() {
    let transport = MockTransport::new();
    transport.add_folder(&NodeId::ROOT_FOLDER, 100, "SomethingElse");

    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    let err = server.tags().unwrap_err();
    assert!(err.is_browse());
}

// =============================================================================
// Alarms
// =============================================================================

#[tokio::test]
async fn test_alarms_always_empty() {
    let mut server = IoServer::new(sample_transport());
    assert!(server.alarms().is_empty());

    server.connect().await.unwrap();
    assert!(server.alarms().is_empty());
}

// =============================================================================
// Reads and writes
// =============================================================================

#[tokio::test]
async fn test_read_tag() {
    let mut server = IoServer::new(sample_transport());
    server.connect().await.unwrap();

    let value = server.read_tag_path("Temperature").await.unwrap();
    assert_eq!(value, TagValue::Double(21.5));
}

#[tokio::test]
async fn test_set_tag_coerces_to_declared_type() {
    let transport = sample_transport();
    let mock = transport.clone();
    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    // Temperature is declared Double; an Int32 write arrives as Double.
    server
        .set_tag_path("Temperature", TagValue::Int32(25))
        .await
        .unwrap();
    assert_eq!(
        mock.stored_value(&NodeId::numeric(2, 101)),
        Some(TagValue::Double(25.0))
    );

    server
        .set_tag_path("Motors/Motor1", TagValue::Boolean(true))
        .await
        .unwrap();
    assert_eq!(
        mock.stored_value(&NodeId::numeric(2, 103)),
        Some(TagValue::Boolean(true))
    );
}

#[tokio::test]
async fn test_set_tag_wrong_type_is_conversion_error() {
    let transport = sample_transport();
    let mock = transport.clone();
    let mut server = IoServer::new(transport);
    server.connect().await.unwrap();

    // Motor1 is declared Boolean; a string cannot be coerced.
    let err = server
        .set_tag_path("Motors/Motor1", TagValue::from("on"))
        .await
        .unwrap_err();
    assert!(err.is_conversion());

    // The stored value is untouched.
    assert_eq!(
        mock.stored_value(&NodeId::numeric(2, 103)),
        Some(TagValue::Boolean(false))
    );
}

#[tokio::test]
async fn test_set_tag_on_folder_is_operation_error() {
    let mut server = IoServer::new(sample_transport());
    server.connect().await.unwrap();

    let err = server
        .set_tag_path("Motors", TagValue::Boolean(true))
        .await
        .unwrap_err();
    assert!(err.is_operation());
}

#[tokio::test]
async fn test_set_tag_unknown_path() {
    let mut server = IoServer::new(sample_transport());
    server.connect().await.unwrap();

    let err = server
        .set_tag_path("Missing/Tag", TagValue::Int32(1))
        .await
        .unwrap_err();
    assert!(err.is_browse());
}
