//! Iterator snapshot atas isi ring buffer
//!
//! Cursor menyimpan posisi fisik depan/belakang plus jumlah langkah yang
//! tersisa. Terminasi murni berdasarkan count, bukan posisi: `head == tail`
//! ambigu antara "baru mulai, buffer kosong" dan "baru mulai, buffer penuh"
//! kalau slot cadangan tidak ada, jadi count yang menentukan akhir.
//!
//! Iterator meminjam buffer, sehingga mutasi concurrent selama iterasi
//! ditolak compiler.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::ring_buffer::{Core, Slot};

/// Iterator const: elemen tertua ke terbaru, `.rev()` untuk terbaru ke tertua.
pub struct Iter<'a, T> {
    buffer: &'a [Slot<T>],
    front: usize,
    back: usize,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: Iter hanya memberikan &T, sama seperti slice::Iter
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(core: &'a Core<T>) -> Self {
        let (head, tail) = core.bounds();
        Self {
            buffer: core.buffer(),
            front: tail,
            back: core.prev(head),
            remaining: core.len(),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

#[inline(always)]
fn step_forward(len: usize, pos: usize) -> usize {
    if pos + 1 == len {
        0
    } else {
        pos + 1
    }
}

#[inline(always)]
fn step_back(len: usize, pos: usize) -> usize {
    if pos == 0 {
        len - 1
    } else {
        pos - 1
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: slot di [tail, head) berisi elemen valid, buffer dipinjam shared
        let item = unsafe { &*self.buffer[self.front].as_ptr() };
        self.front = step_forward(self.buffer.len(), self.front);
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: idem
        let item = unsafe { &*self.buffer[self.back].as_ptr() };
        self.back = step_back(self.buffer.len(), self.back);
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator mutable, urutan sama dengan [`Iter`].
pub struct IterMut<'a, T> {
    buffer: &'a [Slot<T>],
    front: usize,
    back: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: setiap slot diberikan paling banyak sekali sebagai &mut T
unsafe impl<T: Send> Send for IterMut<'_, T> {}
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}

impl<'a, T> IterMut<'a, T> {
    // &mut Core: tidak ada producer/consumer lain selama iterator hidup
    pub(crate) fn new(core: &'a mut Core<T>) -> Self {
        let core: &'a Core<T> = core;
        let (head, tail) = core.bounds();
        Self {
            buffer: core.buffer(),
            front: tail,
            back: core.prev(head),
            remaining: core.len(),
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: akses eksklusif ke buffer, dan count menjamin tiap slot
        // hanya dikunjungi sekali dari kedua arah
        let item = unsafe { &mut *self.buffer[self.front].as_ptr() };
        self.front = step_forward(self.buffer.len(), self.front);
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: idem
        let item = unsafe { &mut *self.buffer[self.back].as_ptr() };
        self.back = step_back(self.buffer.len(), self.back);
        self.remaining -= 1;
        Some(item)
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}
