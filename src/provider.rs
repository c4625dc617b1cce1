//! Provider-facing descriptors for the design platform's OAuth and REST endpoints.
//!
//! `descriptor` exposes validated metadata ([`ProviderDescriptor`]) covering the authorization,
//! token, and API endpoints plus the client authentication method used at the token endpoint.

pub mod descriptor;

pub use descriptor::*;
