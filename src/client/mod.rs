// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport layer over the external OPC UA client.
//!
//! The [`OpcUaTransport`] trait abstracts the handful of operations the
//! wrapper needs from an OPC UA client; [`RealTransport`] implements it over
//! the `opcua` crate (feature `real-transport`), and the test suite supplies
//! a mock.

mod conversion;
mod transport;

#[cfg(feature = "real-transport")]
mod real;

pub use conversion::coerce_to;
pub use transport::{BrowseResult, OpcUaTransport, ReadResult, TransportState, WriteResult};

#[cfg(feature = "real-transport")]
pub use real::RealTransport;
