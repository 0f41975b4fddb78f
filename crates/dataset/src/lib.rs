#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `dataset` maps an absolute path to the ZFS dataset that contains it and
//! the path within that dataset. Mounted datasets are resolved from the
//! kernel mount table. An unmounted dataset leaves an immutable directory at
//! its mountpoint; such placeholders are resolved through a caller-supplied
//! [`DatasetLocator`] because the mount table knows nothing about them.
//!
//! When neither source can answer authoritatively (locked encryption keys,
//! a faulted pool, a racing mount) the result is [`Resolution::Deferred`].
//! That is an outcome, not an error: the caller should retry later.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use dataset::{Resolution, StaticLocator, resolve_dataset_path};
//!
//! let locator = StaticLocator::new().with("/mnt/tank/archive", "tank/archive");
//! match resolve_dataset_path(Path::new("/mnt/tank/data/docs"), &locator) {
//!     Resolution::Resolved(reference) => {
//!         println!("{} in {}", reference.relative_path.display(), reference.dataset_name);
//!     }
//!     Resolution::Deferred => println!("try again later"),
//! }
//! ```

mod locator;
mod resolve;

pub use locator::{DatasetLocator, StaticLocator};
pub use resolve::{DatasetReference, Resolution, resolve_dataset_path};
