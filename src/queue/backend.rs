//! Kontrak backend untuk [`MessageQueue`](super::MessageQueue)

use crossbeam_queue::ArrayQueue;

use crate::core::RingBuffer;

/// Kemampuan minimum sebuah backend queue untuk satu tipe elemen `T`.
///
/// `Send` supaya queue yang sudah di-erase tetap bisa dipindah ke thread lain.
pub trait Backend<T>: Send {
    /// Tambah elemen. Tidak pernah gagal.
    fn push(&mut self, item: T);

    /// Ambil elemen tertua, `None` jika kosong.
    fn try_pop(&mut self) -> Option<T>;

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;
}

impl<T: Send> Backend<T> for RingBuffer<T> {
    #[inline]
    fn push(&mut self, item: T) {
        RingBuffer::push(self, item);
    }

    #[inline]
    fn try_pop(&mut self) -> Option<T> {
        RingBuffer::try_pop(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        RingBuffer::is_empty(self)
    }

    #[inline]
    fn len(&self) -> usize {
        RingBuffer::len(self)
    }
}

/// `force_push` punya policy yang sama: buffer penuh berarti elemen tertua dibuang.
impl<T: Send> Backend<T> for ArrayQueue<T> {
    #[inline]
    fn push(&mut self, item: T) {
        drop(self.force_push(item));
    }

    #[inline]
    fn try_pop(&mut self) -> Option<T> {
        self.pop()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        ArrayQueue::is_empty(self)
    }

    #[inline]
    fn len(&self) -> usize {
        ArrayQueue::len(self)
    }
}
