//! Asset bundle container for TemplateForge.
//!
//! A *bundle* is the serialized-object archive the target engine loads at
//! runtime: a magic header, a per-object directory (id, class, type name,
//! container path, offset, size, checksum), an optional embedded
//! type-metadata block, and a content block of raw object bytes.
//!
//! This crate provides everything that touches bundle bytes:
//!
//! - [`Bundle`] — mount an existing bundle fully into memory
//! - [`BundleBuilder`] — write a new bundle from an object set
//! - [`aligned`] — the length-prefixed, 4-byte-aligned string codec and the
//!   pure byte-patching functions used to rewrite identity fields inside
//!   opaque object blobs
//! - [`locate`] — per-template-type `instance name -> object` lookup, using
//!   embedded type metadata when the bundle carries it and a bounded
//!   heuristic byte scan when it does not
//! - [`EngineProfile`] — externalized per-engine-version constants (identity
//!   header length, scan caps, manifest class id)
//! - [`manifest`] — codec for the in-bundle asset registry object

pub mod aligned;
pub mod error;
pub mod format;
pub mod locate;
pub mod manifest;
pub mod profile;
pub mod read;
pub mod writer;

pub use error::{BundleError, Result};
pub use format::{class_id, ObjectEntry, BUNDLE_MAGIC, FORMAT_VERSION};
pub use locate::{build_lookup, lookup_fingerprint, AssetLookup, LocatedObject};
pub use manifest::{Manifest, ManifestEntry};
pub use profile::EngineProfile;
pub use read::Bundle;
pub use writer::{BundleBuilder, ObjectRecord};
