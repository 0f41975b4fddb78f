#![allow(unsafe_code)]

use rustix::fs::{Gid, Uid};
use rustix::process::{RawGid, RawUid};

#[allow(unused_unsafe)]
pub(crate) fn uid_from_raw(raw: RawUid) -> Uid {
    // SAFETY: every raw uid value is a valid `Uid`.
    unsafe { Uid::from_raw(raw) }
}

#[allow(unused_unsafe)]
pub(crate) fn gid_from_raw(raw: RawGid) -> Gid {
    // SAFETY: every raw gid value is a valid `Gid`.
    unsafe { Gid::from_raw(raw) }
}
