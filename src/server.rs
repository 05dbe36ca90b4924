// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! IOServer connection manager.
//!
//! [`IoServer`] owns one transport and one node tree. `connect()` opens the
//! session and walks the address space; after that, tags are addressed
//! through the tree and written with their declared variant type.
//!
//! # Example
//!
//! ```rust,ignore
//! use movicon_opcua::{IoServer, types::TagValue};
//!
//! let mut server = IoServer::from_hostname("plc01")?;
//! server.connect().await?;
//!
//! let tags = server.tags()?;
//! let motor = tags.lookup_tag("Motors/Motor1")?.clone();
//! server.set_tag(&motor, TagValue::Boolean(true)).await?;
//! ```

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::client::{coerce_to, OpcUaTransport};
use crate::error::{BrowseError, IoServerError, IoServerResult, OperationError};
use crate::tree::{NodeTree, NodeTreeWalker, TagNode};
use crate::types::{IoServerConfig, TagValue, OBJECTS_FOLDER_NAME};

// =============================================================================
// IoServer
// =============================================================================

/// Connection to a Movicon IOServer over a transport.
///
/// Sequential and single-owner: one server, one transport, one tree. The
/// tree is built once per `connect()` and is not refreshed if the server's
/// address space changes afterwards.
pub struct IoServer<T> {
    transport: T,

    /// Node tree walked from the server root; present only while connected.
    tree: Option<NodeTree>,

    /// Alarm mapping. Declared for parity with the tag tree but never
    /// populated; the IOServer exposes alarms through other channels.
    alarms: HashMap<String, NodeTree>,
}

impl<T: OpcUaTransport> IoServer<T> {
    /// Creates a server over an existing transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tree: None,
            alarms: HashMap::new(),
        }
    }

    /// Connects and walks the server's node tree.
    ///
    /// On any failure the server stays disconnected and exposes no partial
    /// state. There is no retry and no reconnect.
    ///
    /// # Errors
    ///
    /// Connection errors if the endpoint is unreachable, browse errors if
    /// the walk fails (including the depth bound).
    pub async fn connect(&mut self) -> IoServerResult<()> {
        self.transport.connect().await?;

        match self.walk_tree().await {
            Ok(tree) => {
                info!(
                    endpoint = %self.transport.endpoint(),
                    tags = tree.leaf_count(),
                    "Connected and walked node tree"
                );
                self.tree = Some(tree);
                Ok(())
            }
            Err(e) => {
                // Tear the session down so a failed walk leaves nothing behind.
                if let Err(disconnect_err) = self.transport.disconnect().await {
                    debug!(error = %disconnect_err, "Disconnect after failed walk also failed");
                }
                self.tree = None;
                Err(e)
            }
        }
    }

    /// Boolean convenience over [`connect`](Self::connect): logs the failure
    /// and returns `false` instead of propagating it.
    pub async fn try_connect(&mut self) -> bool {
        match self.connect().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    endpoint = %self.transport.endpoint(),
                    error = %e,
                    "Connection attempt failed"
                );
                false
            }
        }
    }

    /// Disconnects and drops the node tree.
    pub async fn disconnect(&mut self) -> IoServerResult<()> {
        self.tree = None;
        self.transport.disconnect().await
    }

    /// Returns `true` if connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected() && self.tree.is_some()
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &IoServerConfig {
        self.transport.config()
    }

    /// Returns the full node tree walked from the server root.
    pub fn node_tree(&self) -> IoServerResult<&NodeTree> {
        self.tree.as_ref().ok_or_else(IoServerError::not_connected)
    }

    /// Returns the tag tree: the subtree under the top-level `"Objects"`
    /// folder, where the IOServer publishes its tags.
    pub fn tags(&self) -> IoServerResult<&NodeTree> {
        let tree = self.node_tree()?;
        tree.get(OBJECTS_FOLDER_NAME).ok_or_else(|| {
            IoServerError::browse(BrowseError::node_not_found(OBJECTS_FOLDER_NAME))
        })
    }

    /// Returns the alarm mapping.
    ///
    /// Always empty: the accessor exists for surface parity, no code path
    /// populates it.
    pub fn alarms(&self) -> &HashMap<String, NodeTree> {
        &self.alarms
    }

    /// Reads a tag's current value.
    pub async fn read_tag(&self, tag: &TagNode) -> IoServerResult<TagValue> {
        if self.tree.is_none() {
            return Err(IoServerError::not_connected());
        }

        let result = self.transport.read_value(&tag.node_id).await?;
        if !result.is_good() {
            return Err(IoServerError::operation(OperationError::bad_status(
                tag.node_id.to_string(),
                result.status_code,
            )));
        }

        result.value.ok_or_else(|| {
            IoServerError::operation(OperationError::read_failed(
                tag.node_id.to_string(),
                "Read returned no value",
            ))
        })
    }

    /// Writes a tag, coercing the value to the node's declared variant type.
    ///
    /// # Errors
    ///
    /// Conversion errors when the value cannot represent the declared type;
    /// operation errors when the server rejects the write.
    pub async fn set_tag(&self, tag: &TagNode, value: TagValue) -> IoServerResult<()> {
        if self.tree.is_none() {
            return Err(IoServerError::not_connected());
        }

        let declared = self.transport.read_data_type(&tag.node_id).await?;
        let coerced = coerce_to(value, declared)?;

        debug!(
            node_id = %tag.node_id,
            name = %tag.display_name,
            declared_type = %declared,
            "Writing tag"
        );

        let result = self.transport.write_value(&tag.node_id, coerced).await?;
        if !result.is_good() {
            return Err(IoServerError::operation(OperationError::bad_status(
                tag.node_id.to_string(),
                result.status_code,
            )));
        }

        Ok(())
    }

    /// Path-addressed variant of [`read_tag`](Self::read_tag), resolved
    /// against the tag tree (e.g. `"Motors/Motor1"`).
    pub async fn read_tag_path(&self, path: &str) -> IoServerResult<TagValue> {
        let tag = self.tags()?.lookup_tag(path)?.clone();
        self.read_tag(&tag).await
    }

    /// Path-addressed variant of [`set_tag`](Self::set_tag).
    pub async fn set_tag_path(&self, path: &str, value: TagValue) -> IoServerResult<()> {
        let tag = self.tags()?.lookup_tag(path)?.clone();
        self.set_tag(&tag, value).await
    }

    async fn walk_tree(&self) -> IoServerResult<NodeTree> {
        let root = self.transport.root_node().await?;
        let walker = NodeTreeWalker::new(self.transport.config().max_walk_depth);
        walker.walk(&self.transport, &root).await
    }
}

#[cfg(feature = "real-transport")]
impl IoServer<crate::client::RealTransport> {
    /// Creates a server for the given hostname on the default port.
    pub fn from_hostname(hostname: impl Into<String>) -> IoServerResult<Self> {
        Self::from_config(IoServerConfig::new(hostname))
    }

    /// Creates a server from a full configuration.
    pub fn from_config(config: IoServerConfig) -> IoServerResult<Self> {
        config.validate()?;
        Ok(Self::new(crate::client::RealTransport::new(config)))
    }
}
