//! Message Queue: façade yang tidak peduli backend
//!
//! Pemanggil memprogram terhadap "sebuah queue" tanpa tahu tipe konkret
//! backend-nya. Tipe backend di-erase lewat trait object, tapi tipe elemen
//! tetap ada di signature, jadi `enqueue`/`dequeue` dengan tipe yang salah
//! ditolak compiler, bukan merusak memori saat runtime.
//!
//! ```
//! use courier::queue::MessageQueue;
//!
//! let mut mq: MessageQueue<i32> = MessageQueue::ring(10).unwrap();
//! mq.enqueue(10);
//! assert_eq!(mq.dequeue(), Some(10));
//! assert_eq!(mq.dequeue(), None);
//! ```
//!
//! ```compile_fail
//! use courier::queue::MessageQueue;
//!
//! let mut mq: MessageQueue<i32> = MessageQueue::ring(10).unwrap();
//! mq.enqueue("bukan i32");
//! ```

mod backend;

use std::fmt;

use crate::core::{RingBuffer, RingError};
use crate::trace::debug;

pub use backend::Backend;

/// Queue dengan backend yang di-erase.
///
/// Memiliki backend secara eksklusif; drop queue berarti drop backend
/// beserta semua elemen yang masih ditahan. Move-only.
pub struct MessageQueue<T> {
    backend: Box<dyn Backend<T>>,
}

impl<T> MessageQueue<T> {
    /// Membungkus backend apa pun yang memenuhi [`Backend<T>`].
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend<T> + 'static,
    {
        debug!(
            backend = std::any::type_name::<B>(),
            "message queue constructed"
        );
        Self {
            backend: Box::new(backend),
        }
    }

    /// Kirim elemen ke backend. Tidak pernah gagal; policy saat penuh
    /// ditentukan backend (ring buffer: drop-oldest).
    #[inline]
    pub fn enqueue(&mut self, item: T) {
        self.backend.push(item);
    }

    /// Ambil elemen tertua, `None` jika kosong.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        self.backend.try_pop()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.backend.len()
    }
}

impl<T: Send + 'static> MessageQueue<T> {
    /// Queue dengan backend [`RingBuffer`] berkapasitas `capacity`.
    pub fn ring(capacity: usize) -> Result<Self, RingError> {
        RingBuffer::new(capacity).map(Self::new)
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_queue::ArrayQueue;
    use std::sync::Arc;

    fn float_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-5
    }

    #[test]
    fn test_single_enqueue_dequeue() {
        let mut mq: MessageQueue<i32> = MessageQueue::new(RingBuffer::new(10).unwrap());

        mq.enqueue(10);
        assert_eq!(mq.len(), 1);
        assert_eq!(mq.dequeue(), Some(10));
        assert!(mq.is_empty());
    }

    #[test]
    fn test_multiple_enqueue_dequeue() {
        let mut mq: MessageQueue<i32> = MessageQueue::ring(10).unwrap();

        for i in 0..5 {
            mq.enqueue(i);
        }
        for i in 0..5 {
            assert_eq!(mq.dequeue(), Some(i));
        }
        assert_eq!(mq.dequeue(), None);
    }

    #[test]
    fn test_arc_payloads() {
        let mut mq: MessageQueue<Arc<f64>> = MessageQueue::ring(5).unwrap();

        let sp1 = Arc::new(2.71828);
        mq.enqueue(Arc::clone(&sp1));

        let out = mq.dequeue().unwrap();
        assert!(float_equal(*out, 2.71828));

        for i in 0..3 {
            mq.enqueue(Arc::new(i as f64 * 1.1));
        }
        for i in 0..3 {
            let val = mq.dequeue().unwrap();
            assert!(float_equal(*val, i as f64 * 1.1));
        }
        assert!(mq.dequeue().is_none());
    }

    #[test]
    fn test_overwrite_through_facade() {
        const CAPACITY: usize = 3;
        let mut mq: MessageQueue<Arc<f64>> = MessageQueue::ring(CAPACITY).unwrap();

        let first = Arc::new(0.0);
        mq.enqueue(Arc::clone(&first));
        for i in 1..CAPACITY {
            mq.enqueue(Arc::new(i as f64));
        }
        mq.enqueue(Arc::new(99.9));

        // Elemen pertama sudah di-release oleh backend
        assert_eq!(Arc::strong_count(&first), 1);

        for expected in [1.0, 2.0, 99.9] {
            let val = mq.dequeue().unwrap();
            assert!(float_equal(*val, expected));
        }
        assert!(mq.dequeue().is_none());
    }

    #[test]
    fn test_array_queue_backend() {
        let mut mq: MessageQueue<&str> = MessageQueue::new(ArrayQueue::new(2));

        mq.enqueue("a");
        mq.enqueue("b");
        mq.enqueue("c");

        assert_eq!(mq.len(), 2);
        assert_eq!(mq.dequeue(), Some("b"));
        assert_eq!(mq.dequeue(), Some("c"));
        assert!(mq.is_empty());
    }

    #[test]
    fn test_heterogeneous_backends_same_type() {
        let queues: Vec<MessageQueue<u32>> = vec![
            MessageQueue::ring(4).unwrap(),
            MessageQueue::new(ArrayQueue::new(4)),
        ];

        for mut mq in queues {
            for i in 0..6 {
                mq.enqueue(i);
            }
            let drained: Vec<u32> = std::iter::from_fn(|| mq.dequeue()).collect();
            assert_eq!(drained, vec![2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_drop_releases_backend_elements() {
        let tracker = Arc::new(());
        {
            let mut mq: MessageQueue<Arc<()>> = MessageQueue::ring(4).unwrap();
            mq.enqueue(Arc::clone(&tracker));
            mq.enqueue(Arc::clone(&tracker));
            assert_eq!(Arc::strong_count(&tracker), 3);
        }
        assert_eq!(Arc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_debug_shows_len() {
        let mut mq: MessageQueue<u8> = MessageQueue::ring(4).unwrap();
        mq.enqueue(1);
        assert_eq!(format!("{:?}", mq), "MessageQueue { len: 1, .. }");
    }
}
