//! ocireg
//! ======
//!
//! Blocking client for the container image registry HTTP API (v2):
//! pulling and pushing image manifests, pulling blobs into local storage,
//! and pushing blobs through the registry's chunked-upload protocol.
//!
//! ```no_run
//! use ocireg::{
//!     distribution::{Client, Reference},
//!     ImageName,
//! };
//!
//! # fn main() -> ocireg::Result<()> {
//! let image = ImageName::parse("registry.example.com/library/app:latest")?;
//! let client = Client::from_image_name(&image)?;
//! let manifest = client.pull_manifest(&Reference::new(&image.reference)?)?;
//! # Ok(())
//! # }
//! ```

pub mod distribution;
pub mod error;
pub mod transport;

mod digest;
mod image_name;

pub use digest::Digest;
pub use error::{Error, Result};
pub use image_name::ImageName;
