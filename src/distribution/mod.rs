//! Pull and push images to an OCI registry based on [OCI distribution specification](https://github.com/opencontainers/distribution-spec)
//!
//! Every public operation of [Client] goes through one dispatch path that
//! attaches authorization, follows temporary redirects, and classifies
//! failures into [crate::error::Error]. The individual API calls are
//! [RegistryEndpoint] values constructed per call site.

mod auth;
mod blob;
mod client;
mod endpoint;
mod manifest;
mod name;
mod reference;
mod tags;

pub use auth::Authorization;
pub use blob::{BlobPuller, BlobPusher, BlobRef, BlobSource};
pub use client::Client;
pub use endpoint::RegistryEndpoint;
pub use manifest::{ManifestPuller, ManifestPusher};
pub use name::Name;
pub use reference::Reference;
pub use tags::TagLister;
