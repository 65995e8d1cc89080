//! File-backed memory mappings for [`crate::Data`].
//!
//! The backing file holds exactly the flat element sequence: no header,
//! no metadata. Shape and kind travel separately.
//!
//! Mappings are `MAP_SHARED`, so writes reach the file through the page
//! cache. Nothing here coordinates between processes mapping the same
//! file; a single writer is assumed.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;
#[cfg(unix)]
use std::ptr::NonNull;

/// A read/write shared mapping of a whole file.
#[cfg(unix)]
pub(crate) struct MappedRegion {
    ptr: NonNull<u8>,
    bytes: usize,
    path: PathBuf,
    // keeps the descriptor alive for the lifetime of the mapping
    _file: File,
}

#[cfg(unix)]
impl MappedRegion {
    /// Maps the first `bytes` bytes of `file`. `bytes` must be non-zero and
    /// the file at least that long.
    pub(crate) fn map(file: File, path: &Path, bytes: usize) -> io::Result<Self> {
        let raw = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                bytes,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let ptr = match NonNull::new(raw as *mut u8) {
            Some(ptr) => ptr,
            None => {
                unsafe {
                    libc::munmap(raw, bytes);
                }
                return Err(io::Error::other("mmap returned a null mapping"));
            }
        };
        Ok(Self {
            ptr,
            bytes,
            path: path.to_path_buf(),
            _file: file,
        })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.bytes) }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.bytes) }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Synchronously writes dirty pages back to the file.
    pub(crate) fn flush(&self) -> io::Result<()> {
        let rc = unsafe {
            libc::msync(
                self.ptr.as_ptr() as *mut libc::c_void,
                self.bytes,
                libc::MS_SYNC,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for MappedRegion {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.bytes);
        }
    }
}

// SAFETY: the region is uniquely owned; shared access goes through `&self`
// (read-only slices) and mutation requires `&mut self`.
#[cfg(unix)]
unsafe impl Send for MappedRegion {}
#[cfg(unix)]
unsafe impl Sync for MappedRegion {}

/// Placeholder on targets without `mmap`; never constructed.
#[cfg(not(unix))]
pub(crate) struct MappedRegion {
    never: std::convert::Infallible,
}

#[cfg(not(unix))]
impl MappedRegion {
    pub(crate) fn map(_file: File, _path: &Path, _bytes: usize) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "memory-mapped buffers require a unix target",
        ))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self.never {}
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self.never {}
    }

    pub(crate) fn path(&self) -> &Path {
        match self.never {}
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        match self.never {}
    }
}
