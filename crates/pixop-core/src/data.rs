//! Typed one-dimensional sample buffers.
//!
//! [`Data`] is a fixed-length buffer of one [`Kind`]. It is the storage
//! under every [`crate::Image`] and the only place iteration primitives
//! live: [`map_inplace`](Data::map_inplace), [`map2_inplace`](Data::map2_inplace),
//! [`fold`](Data::fold) and [`fold2`](Data::fold2). Pixel and image level
//! iteration is built on top of them.
//!
//! # Ownership
//!
//! A `Data` owns its elements. Sub-ranges are exposed as borrowed views,
//! [`DataView`] and [`DataViewMut`], which alias the parent and cannot
//! outlive it: a write through a `DataViewMut` is the parent's write.
//!
//! ```rust
//! use pixop_core::Data;
//!
//! let mut data: Data<u8> = Data::new(6);
//! data.slice_mut(2, 3).fill(9);
//! assert_eq!(data.as_slice(), &[0, 0, 9, 9, 9, 0]);
//! assert_eq!(data.slice(1, 2).as_slice(), &[0, 9]);
//! ```
//!
//! # File backing
//!
//! [`Data::create_mapped`] places the elements in a shared memory mapping
//! of a file holding exactly the flat element sequence. The buffer behaves
//! like a heap buffer; the length is fixed and the file never grows.

use crate::mapped::MappedRegion;
use crate::{Error, Kind, KindId, Result};
use std::cmp::Ordering;
use std::fmt;
use std::fs::OpenOptions;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::debug;

enum Storage<K: Kind> {
    Heap(Vec<K>),
    Mapped(MappedRegion),
}

/// A fixed-length buffer of `K` elements.
pub struct Data<K: Kind> {
    storage: Storage<K>,
}

impl<K: Kind> Data<K> {
    /// Allocates `len` zero-initialized elements.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![<K as bytemuck::Zeroable>::zeroed(); len])
    }

    /// Allocates `len` elements set to `value`.
    pub fn filled(len: usize, value: K) -> Self {
        Self::from_vec(vec![value; len])
    }

    /// Takes ownership of an existing vector.
    pub fn from_vec(values: Vec<K>) -> Self {
        Self {
            storage: Storage::Heap(values),
        }
    }

    /// Builds a buffer by quantizing normalized floats.
    pub fn of_floats(values: &[f64]) -> Self {
        Self::from_vec(values.iter().map(|&f| K::of_float(f)).collect())
    }

    /// Creates (or truncates) `path` and maps `len` zeroed elements from it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be created or mapped,
    /// [`Error::Unsupported`] on targets without memory mapping.
    pub fn create_mapped(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = Self::byte_len(len)?;
        debug!(path = %path.display(), kind = K::name(), len, "creating mapped buffer");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(bytes as u64)?;
        Self::map_file(file, path, len, bytes)
    }

    /// Maps an existing file holding exactly `len` elements.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if the file size is not `len` elements.
    pub fn open_mapped(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = Self::byte_len(len)?;
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let actual = file.metadata()?.len();
        if actual != bytes as u64 {
            return Err(Error::invalid_shape(format!(
                "{} holds {actual} bytes, expected {bytes} for {len} {} elements",
                path.display(),
                K::name()
            )));
        }
        debug!(path = %path.display(), kind = K::name(), len, "opening mapped buffer");
        Self::map_file(file, path, len, bytes)
    }

    fn byte_len(len: usize) -> Result<usize> {
        len.checked_mul(std::mem::size_of::<K>())
            .ok_or_else(|| Error::invalid_shape(format!("{len} elements overflow the address space")))
    }

    fn map_file(file: std::fs::File, path: &Path, len: usize, bytes: usize) -> Result<Self> {
        if !cfg!(unix) {
            return Err(Error::unsupported(K::name(), "memory-mapped storage"));
        }
        if len == 0 {
            // zero-length mappings are rejected by the OS
            return Ok(Self::from_vec(Vec::new()));
        }
        let region = MappedRegion::map(file, path, bytes)?;
        Ok(Self {
            storage: Storage::Mapped(region),
        })
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` when the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runtime kind of the elements.
    #[inline]
    pub fn kind(&self) -> KindId {
        K::ID
    }

    /// Returns `true` if the buffer lives in a file mapping.
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, Storage::Mapped(_))
    }

    /// Path of the backing file, if any.
    pub fn mapped_path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Heap(_) => None,
            Storage::Mapped(region) => Some(region.path()),
        }
    }

    /// Flushes a file-backed buffer to disk; a no-op for heap buffers.
    pub fn flush(&self) -> Result<()> {
        match &self.storage {
            Storage::Heap(_) => Ok(()),
            Storage::Mapped(region) => Ok(region.flush()?),
        }
    }

    /// Elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[K] {
        match &self.storage {
            Storage::Heap(v) => v.as_slice(),
            Storage::Mapped(region) => bytemuck::cast_slice(region.as_bytes()),
        }
    }

    /// Elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [K] {
        match &mut self.storage {
            Storage::Heap(v) => v.as_mut_slice(),
            Storage::Mapped(region) => bytemuck::cast_slice_mut(region.as_bytes_mut()),
        }
    }

    /// Element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> K {
        self.as_slice()[index]
    }

    /// Stores `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[inline]
    pub fn set(&mut self, index: usize, value: K) {
        self.as_mut_slice()[index] = value;
    }

    /// Element at `index` through the float bridge.
    #[inline]
    pub fn get_float(&self, index: usize) -> f64 {
        self.get(index).to_float()
    }

    /// Quantizes `value` into `index`.
    #[inline]
    pub fn set_float(&mut self, index: usize, value: f64) {
        self.set(index, K::of_float(value));
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: K) {
        self.as_mut_slice().fill(value);
    }

    /// Copies every element into `dest`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if the lengths differ.
    pub fn blit(&self, dest: &mut Data<K>) -> Result<()> {
        if self.len() != dest.len() {
            return Err(Error::invalid_shape(format!(
                "blit of {} elements into {}",
                self.len(),
                dest.len()
            )));
        }
        dest.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(())
    }

    /// Borrowed view of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range leaves the buffer; slicing never clips.
    pub fn slice(&self, offset: usize, len: usize) -> DataView<'_, K> {
        let end = Self::checked_end(offset, len, self.len());
        DataView {
            elems: &self.as_slice()[offset..end],
            offset,
        }
    }

    /// Mutable borrowed view of `len` elements starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range leaves the buffer.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> DataViewMut<'_, K> {
        let end = Self::checked_end(offset, len, self.len());
        DataViewMut {
            elems: &mut self.as_mut_slice()[offset..end],
            offset,
        }
    }

    fn checked_end(offset: usize, len: usize, total: usize) -> usize {
        match offset.checked_add(len) {
            Some(end) if end <= total => end,
            _ => panic!("slice {offset}+{len} out of bounds for buffer of {total} elements"),
        }
    }

    /// Replaces every element with `f(element)`.
    pub fn map_inplace(&mut self, mut f: impl FnMut(K) -> K) {
        for v in self.as_mut_slice() {
            *v = f(*v);
        }
    }

    /// Replaces every element with `f(element, other[i])`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if the lengths differ.
    pub fn map2_inplace<K2: Kind>(
        &mut self,
        other: &Data<K2>,
        mut f: impl FnMut(K, K2) -> K,
    ) -> Result<()> {
        self.ensure_same_len(other.len(), "map2_inplace")?;
        for (v, &o) in self.as_mut_slice().iter_mut().zip(other.as_slice()) {
            *v = f(*v, o);
        }
        Ok(())
    }

    /// Left fold over the elements.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, K) -> A) -> A {
        self.as_slice().iter().fold(init, |acc, &v| f(acc, v))
    }

    /// Left fold over pairs of elements from two equal-length buffers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidShape`] if the lengths differ.
    pub fn fold2<K2: Kind, A>(
        &self,
        other: &Data<K2>,
        init: A,
        mut f: impl FnMut(A, K, K2) -> A,
    ) -> Result<A> {
        self.ensure_same_len(other.len(), "fold2")?;
        Ok(self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .fold(init, |acc, (&a, &b)| f(acc, a, b)))
    }

    fn ensure_same_len(&self, other: usize, op: &str) -> Result<()> {
        if self.len() != other {
            return Err(Error::invalid_shape(format!(
                "{op} over buffers of {} and {other} elements",
                self.len()
            )));
        }
        Ok(())
    }

    /// Builds a buffer of another kind by applying `f` to the typed values.
    pub fn convert<K2: Kind>(&self, mut f: impl FnMut(K) -> K2) -> Data<K2> {
        Data::from_vec(self.as_slice().iter().map(|&v| f(v)).collect())
    }

    /// All elements through the float bridge.
    pub fn to_floats(&self) -> Vec<f64> {
        self.as_slice().iter().map(|&v| v.to_float()).collect()
    }

    /// Raw bytes of the element sequence (the on-disk layout of a mapped buffer).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<K: Kind> Clone for Data<K> {
    /// Deep copy; the clone of a mapped buffer lives on the heap.
    fn clone(&self) -> Self {
        Self::from_vec(self.as_slice().to_vec())
    }
}

impl<K: Kind> fmt::Debug for Data<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("kind", &K::name())
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

impl<K: Kind> PartialEq for Data<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Kind> Eq for Data<K> {}

impl<K: Kind> PartialOrd for Data<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Kind> Ord for Data<K> {
    /// Lexicographic by [`Kind::total_cmp`], shorter prefix first.
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.as_slice(), other.as_slice());
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    }
}

impl<K: Kind> Hash for Data<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        state.write(self.as_bytes());
    }
}

/// Borrowed, read-only window into a [`Data`] buffer.
#[derive(Debug, Clone, Copy)]
pub struct DataView<'a, K: Kind> {
    elems: &'a [K],
    offset: usize,
}

impl<'a, K: Kind> DataView<'a, K> {
    /// Offset of the first element in the parent buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Elements of the window.
    pub fn as_slice(&self) -> &'a [K] {
        self.elems
    }

    /// Left fold over the window.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, K) -> A) -> A {
        self.elems.iter().fold(init, |acc, &v| f(acc, v))
    }

    /// Copies the window into an owning buffer.
    pub fn to_data(&self) -> Data<K> {
        Data::from_vec(self.elems.to_vec())
    }
}

impl<K: Kind> Deref for DataView<'_, K> {
    type Target = [K];

    fn deref(&self) -> &[K] {
        self.elems
    }
}

/// Borrowed, writable window into a [`Data`] buffer.
#[derive(Debug)]
pub struct DataViewMut<'a, K: Kind> {
    elems: &'a mut [K],
    offset: usize,
}

impl<K: Kind> DataViewMut<'_, K> {
    /// Offset of the first element in the parent buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Sets every element of the window.
    pub fn fill(&mut self, value: K) {
        self.elems.fill(value);
    }

    /// Replaces every element of the window with `f(element)`.
    pub fn map_inplace(&mut self, mut f: impl FnMut(K) -> K) {
        for v in self.elems.iter_mut() {
            *v = f(*v);
        }
    }
}

impl<K: Kind> Deref for DataViewMut<'_, K> {
    type Target = [K];

    fn deref(&self) -> &[K] {
        &*self.elems
    }
}

impl<K: Kind> DerefMut for DataViewMut<'_, K> {
    fn deref_mut(&mut self) -> &mut [K] {
        &mut *self.elems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<K: Kind>(d: &Data<K>) -> u64 {
        let mut h = DefaultHasher::new();
        d.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_new_is_zeroed() {
        let d: Data<i32> = Data::new(5);
        assert_eq!(d.len(), 5);
        assert!(d.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_slice_aliases_parent() {
        let mut d: Data<u16> = Data::from_vec((0..8).collect());
        {
            let mut view = d.slice_mut(4, 2);
            assert_eq!(view.offset(), 4);
            view.map_inplace(|v| v * 10);
            view[0] += 1;
        }
        assert_eq!(d.as_slice(), &[0, 1, 2, 3, 41, 50, 6, 7]);
        assert_eq!(d.slice(4, 2).fold(0u32, |a, v| a + v as u32), 91);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_slice_out_of_bounds_panics() {
        let d: Data<u8> = Data::new(4);
        let _ = d.slice(3, 2);
    }

    #[test]
    fn test_map_and_fold() {
        let mut d: Data<u8> = Data::from_vec(vec![1, 2, 3]);
        d.map_inplace(|v| v * 2);
        assert_eq!(d.fold(0u32, |a, v| a + v as u32), 12);

        let other: Data<f32> = Data::from_vec(vec![0.5, 0.5, 0.5]);
        d.map2_inplace(&other, |a, b| a + (b * 2.0) as u8).unwrap();
        assert_eq!(d.as_slice(), &[3, 5, 7]);

        let dot = d.fold2(&other, 0.0, |acc, a, b| acc + a as f32 * b).unwrap();
        assert_eq!(dot, 7.5);
    }

    #[test]
    fn test_length_mismatch_is_shape_error() {
        let mut a: Data<u8> = Data::new(3);
        let b: Data<u8> = Data::new(4);
        assert!(a.map2_inplace(&b, |x, _| x).unwrap_err().is_shape_error());
        assert!(a.fold2(&b, 0, |acc, _, _| acc).is_err());
        assert!(b.blit(&mut a).is_err());
    }

    #[test]
    fn test_convert_and_float_bridge() {
        let d: Data<u8> = Data::from_vec(vec![0, 255]);
        let wide: Data<u16> = d.convert(|v| v as u16 * 257);
        assert_eq!(wide.as_slice(), &[0, 65535]);
        assert_eq!(d.to_floats(), vec![0.0, 1.0]);
        let back: Data<u8> = Data::of_floats(&wide.to_floats());
        assert_eq!(back, d);
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a: Data<f32> = Data::from_vec(vec![0.25, 0.5]);
        let b = a.clone();
        let c: Data<f32> = Data::from_vec(vec![0.25, 0.75]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert!(a < c);
        let prefix: Data<f32> = Data::from_vec(vec![0.25]);
        assert!(prefix < a);
    }

    #[cfg(unix)]
    #[test]
    fn test_mapped_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffer.raw");
        {
            let mut d: Data<u16> = Data::create_mapped(&path, 4).unwrap();
            assert!(d.is_mapped());
            assert!(d.as_slice().iter().all(|&v| v == 0));
            d.slice_mut(1, 2).fill(0xBEEF);
            d.flush().unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8);

        let reopened: Data<u16> = Data::open_mapped(&path, 4).unwrap();
        assert_eq!(reopened.as_slice(), &[0, 0xBEEF, 0xBEEF, 0]);
        assert_eq!(reopened.mapped_path(), Some(path.as_path()));

        let copy = reopened.clone();
        assert!(!copy.is_mapped());
        assert_eq!(copy, reopened);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_mapped_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.raw");
        std::fs::write(&path, [0u8; 6]).unwrap();
        let err = Data::<u16>::open_mapped(&path, 4).unwrap_err();
        assert!(err.is_shape_error());
    }
}
