//! Error Types
//!
//! This module defines the recoverable error types of the RHI.
//!
//! # Overview
//!
//! The main error type [`RhiError`] covers the failure modes a caller can
//! reasonably react to:
//! - Invalid arguments that are reported rather than asserted
//! - Descriptor heap exhaustion
//! - Resource creation failures (rejected descriptions, unreadable files)
//! - Device loss during presentation
//!
//! Caller logic bugs (zero-count draws, binding in the wrong pipeline mode,
//! unknown preset keys, stale handles) are *not* represented here. They are
//! precondition violations and panic at the call site.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_rhi::errors::{RhiError, Result};
//!
//! fn create_targets(device: &mut Device) -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::descriptors::DescriptorHeapType;

/// The main error type for the RHI.
#[derive(Error, Debug)]
pub enum RhiError {
    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// An argument was rejected before any state was touched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Descriptor Errors
    // ========================================================================
    /// A descriptor heap cannot satisfy an allocation.
    ///
    /// Nothing was allocated; the heap is left exactly as it was.
    #[error("Descriptor heap {heap:?} exhausted: requested {requested}, available {available}")]
    CapacityExceeded {
        /// Heap the allocation was requested from
        heap: DescriptorHeapType,
        /// Number of descriptors requested
        requested: u32,
        /// Number of descriptors still free
        available: u32,
    },

    // ========================================================================
    // Resource Creation Errors
    // ========================================================================
    /// The backend rejected a resource creation request.
    #[error("Failed to create {context}: {reason}")]
    ResourceCreation {
        /// Which resource (label or file path)
        context: String,
        /// Why it was rejected
        reason: String,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The device was removed or reset. The session cannot continue without a
    /// full re-initialization driven by the caller.
    #[error("Device lost: {reason}")]
    DeviceLost {
        /// Reason reported by the backend
        reason: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// A resource file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        /// The file that was requested
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecode(String),
}

impl RhiError {
    /// Wraps a failed read of `path`.
    pub(crate) fn file_read(path: &Path, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Shorthand for a [`RhiError::ResourceCreation`].
    pub(crate) fn creation(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for RhiError {
    fn from(err: image::ImageError) -> Self {
        RhiError::ImageDecode(err.to_string())
    }
}

/// Alias for `Result<T, RhiError>`.
pub type Result<T> = std::result::Result<T, RhiError>;
