//! Fatal compile errors.
//!
//! Only unrecoverable conditions appear here. Everything per-item (missing
//! clone sources, malformed media files, unknown patch targets) is a
//! [`Diagnostic`](crate::plan::Diagnostic), not an error — see the failure
//! policy in the crate docs.

use camino::Utf8PathBuf;
use forge_bundle::BundleError;
use thiserror::Error;

/// Conditions that abort the whole compile with no output file.
#[derive(Error, Debug)]
pub enum FatalError {
    /// The base bundle could not be read or parsed.
    #[error("cannot read base bundle '{path}': {source}")]
    BaseBundle {
        path: Utf8PathBuf,
        #[source]
        source: BundleError,
    },

    /// No engine profile matches the requested engine version.
    #[error("unknown engine version: {0}")]
    UnknownEngineVersion(String),

    /// The base bundle's asset registry object is malformed.
    #[error("asset registry object {path_id} is malformed: {source}")]
    MalformedRegistry {
        path_id: i64,
        #[source]
        source: BundleError,
    },

    /// The output bundle or patch document could not be written.
    #[error("cannot write output '{path}': {message}")]
    OutputWrite { path: Utf8PathBuf, message: String },

    /// The compile was cancelled; no output was produced.
    #[error("compile cancelled")]
    Cancelled,
}
