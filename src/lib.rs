//! GraphQL multipart request support for Actix Web.
//!
//! Implements the server side of the [GraphQL multipart request spec], which sends a GraphQL
//! operation together with file uploads as one `multipart/form-data` body:
//!
//! ```text
//! operations: {"query":"mutation ($file: Upload!) { upload(file: $file) }","variables":{"file":null}}
//! map:        {"0":["variables.file"]}
//! 0:          <file content>
//! ```
//!
//! Each file section is stored as an [`Upload`] at every variable path `map` lists for it, and the
//! resulting [`RawParams`] are handed to a [`GraphExecutor`].
//!
//! # Usage
//! Register the executor as app data and mount the transport, either through
//! [`MultipartTransport::resource`] or by combining [`MultipartGuard`] and [`graphql_upload`]
//! yourself. Configure the body size limit with [`UploadConfig`].
//!
//! All protocol errors are answered with `422 Unprocessable Entity` and a GraphQL error body,
//! see [`UploadError`].
//!
//! [GraphQL multipart request spec]: https://github.com/jaydenseric/graphql-multipart-request-spec

#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible)]

mod binder;
mod config;
mod decoder;
mod error;
mod executor;
mod guard;
mod handler;
mod limit;
mod map;
mod operation;
mod response;
mod upload;
mod variables;

pub use self::binder::{bind_upload, BindError, UploadPath};
pub use self::config::{UploadConfig, DEFAULT_MAX_UPLOAD_SIZE};
pub use self::decoder::{Decoder, State};
pub use self::error::UploadError;
pub use self::executor::GraphExecutor;
pub use self::guard::{supports, MultipartGuard};
pub use self::handler::{decode_request, graphql_upload, MultipartTransport};
pub use self::limit::{check_content_length, content_length, LimitedPayload};
pub use self::map::PathMap;
pub use self::operation::{RawParams, TraceTiming};
pub use self::response::{GraphError, GraphResponse, PROTOCOL_ERROR_CODES};
pub use self::upload::Upload;
pub use self::variables::{Variable, Variables};
