//! Capture-side metrics SDK for the ReadMe collector. Takes the request,
//! response, and identity data a host framework has already captured,
//! redacts it by allow/deny policy, packs it into the collector's HAR-style
//! wire envelope, ships batches off the host request path, and verifies
//! signed callbacks coming back from the collector.

pub mod base_url;
pub mod config;
pub mod constructor;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod har;
pub mod masker;
pub mod payload;
pub mod transport;
pub mod webhook;

pub use base_url::BaseUrlResolver;
pub use config::{Config, LogOptions};
pub use constructor::construct;
pub use dispatcher::PayloadDataDispatcher;
pub use error::Error;
pub use filter::{filter_data, REDACTED};
pub use har::{Group, Har, HarLog, OutgoingLogBody};
pub use masker::mask;
pub use payload::{Filterable, PayloadData, RequestData, ResponseData, UserData};
pub use transport::{encode_api_key, HttpDataSender, DOCUMENTATION_HEADER};
pub use webhook::{verify_webhook, WebhookError, SIGNATURE_HEADER};
