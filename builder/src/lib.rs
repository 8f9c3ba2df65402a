// Licensed under the Apache-2.0 license

//! Packaging pipeline for external applications and the flat flash image.
//!
//! The pipeline is a chain of single-shot transforms: a named section is
//! pulled out of the linked application image, pointer constants in the
//! compile-time placeholder window are rewritten to the runtime address,
//! an optional co-processor companion module is attached, and the result
//! gets a word-sum checksum trailer. Independently, the assembler lays
//! out the core firmware regions into one flash image with the same
//! trailer. Nothing here is stateful; every step takes a buffer and
//! returns a new one.

mod compose;
mod extract;
mod flash;
mod relocate;
mod scan;

pub use compose::{compose, lookup_companion};
pub use extract::extract_section;
pub use flash::{assemble, FlashAssembly, FlashRegion};
pub use relocate::relocate;
pub use scan::{report_leaks, scan_for_leaks, LeakFinding};

use thiserror::Error;

/// Fatal pipeline failures. Layout and leak findings are deliberately not
/// errors; they come back as structured reports so the caller can decide
/// whether to fail the build.
#[derive(Error, Debug)]
pub enum PackError {
    /// The buffer being transformed is not a well-formed artifact.
    #[error("bad image format: {0}")]
    Format(String),

    /// A size budget was exceeded; continuing would build an image the
    /// device cannot load.
    #[error("{what} is {actual} bytes, limit is {limit}")]
    Budget {
        what: String,
        actual: usize,
        limit: usize,
    },

    /// The external object-copy tool failed or produced nothing.
    #[error("tool invocation failed: {0}")]
    ToolInvocation(String),
}
