//! crates/metadata/src/xattr.rs
//!
//! `user.*` extended-attribute copying through the `xattr` crate.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use ::xattr::FileExt;
use logging::trace_meta;
use platform::{FsResult, IoResultExt};

const USER_PREFIX: &[u8] = b"user.";

fn is_user_attribute(name: &OsStr) -> bool {
    name.as_bytes().starts_with(USER_PREFIX)
}

fn user_names(names: impl Iterator<Item = OsString>) -> BTreeSet<OsString> {
    names.filter(|name| is_user_attribute(name)).collect()
}

/// Makes the `user.*` attributes of `destination` equal those of the open
/// `source`.
///
/// Values are copied byte for byte. `user.*` attributes present only on the
/// destination are removed; other namespaces are left alone. Returns the
/// number of attributes written.
pub fn copy_user_xattrs(source: &File, destination: &File) -> FsResult<usize> {
    let names = user_names(
        source
            .list_xattr()
            .fs_action("list extended attributes")?,
    );
    let mut copied = 0;
    for name in &names {
        let Some(value) = source
            .get_xattr(name)
            .fs_action("read extended attribute")?
        else {
            // removed since listing
            continue;
        };
        destination
            .set_xattr(name, &value)
            .fs_action("write extended attribute")?;
        copied += 1;
    }
    let stale = user_names(
        destination
            .list_xattr()
            .fs_action("list extended attributes")?,
    );
    for name in stale.difference(&names) {
        destination
            .remove_xattr(name)
            .fs_action("remove extended attribute")?;
    }
    Ok(copied)
}

/// Path form of [`copy_user_xattrs`]. Symlinks are followed.
pub fn copy_user_xattrs_at(source: &Path, destination: &Path) -> FsResult<usize> {
    let names = user_names(
        ::xattr::list_deref(source).fs_context("list extended attributes", source)?,
    );
    let mut copied = 0;
    for name in &names {
        let Some(value) =
            ::xattr::get_deref(source, name).fs_context("read extended attribute", source)?
        else {
            continue;
        };
        ::xattr::set_deref(destination, name, &value)
            .fs_context("write extended attribute", destination)?;
        copied += 1;
    }
    let stale = user_names(
        ::xattr::list_deref(destination).fs_context("list extended attributes", destination)?,
    );
    let mut removed = 0;
    for name in stale.difference(&names) {
        ::xattr::remove_deref(destination, name)
            .fs_context("remove extended attribute", destination)?;
        removed += 1;
    }
    trace_meta!(
        "copied {} and removed {} extended attributes on {}",
        copied,
        removed,
        destination.display()
    );
    Ok(copied)
}
