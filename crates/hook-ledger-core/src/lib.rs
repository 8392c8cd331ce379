//! # Hook-Ledger Core
//!
//! Core business logic for the Hook-Ledger GitLab webhook intake service.
//!
//! This crate contains the domain logic for classifying GitLab webhook
//! deliveries, parsing the two historical payload dialects (per-project
//! "Hook" events and instance-wide "System Hook" events), and normalizing
//! each event into a flat record handed to a persistence collaborator.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Infrastructure implementations are injected at runtime
//! - HTTP routing, storage, and authentication are external collaborators
//!
//! ## Usage
//!
//! ```rust
//! use hook_ledger_core::webhook::{Delivery, DeliveryHeaders};
//! use bytes::Bytes;
//! use std::collections::HashMap;
//!
//! let mut headers = HashMap::new();
//! headers.insert("X-Gitlab-Event".to_string(), "Merge Request Hook".to_string());
//!
//! let headers = DeliveryHeaders::from_http_headers(&headers).unwrap();
//! let delivery = Delivery::new(headers, Bytes::from_static(b"{}"));
//! assert_eq!(delivery.event_type(), "Merge Request Hook");
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Multi-layout timestamp parsing for GitLab payloads
pub mod timestamp;

/// Webhook processing module for GitLab deliveries
pub mod webhook;

// Re-export key types for convenience
pub use timestamp::{FlexibleTimestamp, TimeFormatError};
pub use webhook::{
    Acknowledgement, AckStatus, Delivery, DeliveryHeaders, DeliveryPipeline, DeliveryProcessor,
    Dialect, EventCategory, EventClassification, EventStore, NormalizedRecord, PayloadError,
    StoreError, TypedEvent, WebhookError,
};
