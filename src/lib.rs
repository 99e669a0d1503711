//! # json-body - JSON request bodies with field whitelists
//!
//! Helpers for decoding JSON request bodies into typed records and encoding
//! records into JSON responses:
//! - Plain decode of a whole body ([`read`])
//! - Whitelist-filtered decode that only touches the named fields ([`read_filtered`])
//! - JSON response encoding with the proper content type ([`write`])
//! - Optional axum integration (feature `axum`)
//!
//! ## Filtered reads
//!
//! ```text
//!   body {"name":"x","role":"admin"}     whitelist ["name"]
//!            │                                  │
//!            ▼                                  ▼
//!   fragments: name → "x"          fields of dst: name → &mut dst.name
//!              role → "admin"                     role → &mut dst.role
//!            └──────────── only "name" is decoded and assigned ──┘
//! ```
//!
//! ```
//! use json_body::{extract_fields, read_filtered};
//!
//! #[derive(Debug, Default)]
//! struct User { name: String, role: String }
//!
//! extract_fields!(User { name, role });
//!
//! let mut user = User { name: "old".into(), role: "member".into() };
//! let body = r#"{"name":"new","role":"admin"}"#;
//! read_filtered(body.as_bytes(), &mut user, &["name"]).unwrap();
//!
//! assert_eq!(user.name, "new");
//! assert_eq!(user.role, "member");
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod fields;
#[cfg(feature = "axum")]
pub mod http;
pub mod reader;
pub mod types;
pub mod writer;

// Internal utilities
pub mod observability;

pub use fields::{extract, extract_wanted, Extract, FieldMap, FieldSlot};
pub use reader::{read, read_filtered, BodyReader};
pub use types::{Config, Error, ObservabilityConfig, ReadConfig, Result};
pub use writer::{write, ResponseRecorder, ResponseSink, CONTENT_TYPE_JSON};
