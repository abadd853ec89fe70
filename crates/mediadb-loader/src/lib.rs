//! mediadb loader - Incremental pagination for catalog lists.
//!
//! An [`IncrementalLoader`] owns one list's paging state: it fetches the first
//! page on mount, appends pages on [`IncrementalLoader::show_more`], detects
//! the end of data, and discards results that arrive after a reset or unmount.
//! Views observe it through [`LoaderSnapshot`]s.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod loader;
mod page;

pub use loader::{IncrementalLoader, LoaderOptions, LoaderPhase, LoaderSnapshot};
pub use page::{PageFetch, PageRequest, PageResult};
