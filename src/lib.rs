//! MCP gateway that fronts a design-platform REST API with an OAuth 2.0 + PKCE session broker.
//!
//! Every tool call passes through the [`flows::Gate`], which either yields a bearer token for the
//! calling MCP session (refreshing it when it is about to lapse) or hands back an authorization
//! URL the end user must visit before retrying.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod authorize;
pub mod cli;
pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod mcp;
pub mod oauth;
pub mod obs;
pub mod pending;
pub mod pkce;
pub mod provider;
pub mod server;
pub mod store;
pub mod tools;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// Only the binary reports through color-eyre.
use color_eyre as _;
#[cfg(test)] use httpmock as _;
