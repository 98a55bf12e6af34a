//! Handle Producer/Consumer untuk dua thread
//!
//! Blocking pop memakai parking bersyarat:
//!
//! ```text
//! push() -> tulis slot -> publish head -> if (consumer_parked) unpark()
//! pop()  -> try_pop -> spin/snooze -> set consumer_parked -> park()
//! ```
//!
//! Producer hanya melakukan syscall unpark jika consumer BENAR-BENAR tidur,
//! jadi push tetap lock-free dan tidak pernah menunggu consumer.
//!
//! Race "missed wakeup" dicegah dengan pasangan fence SeqCst:
//!
//! ```text
//! Producer                         Consumer
//! --------                         --------
//! store(head, next)                store(consumer_parked, true)
//! fence(SeqCst)                    fence(SeqCst)
//! load(consumer_parked)            load(head)  (try_pop)
//! ```
//!
//! Minimal salah satu sisi pasti melihat store sisi lainnya.

use std::sync::atomic::{fence, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::sync::{Parker, Unparker};
use crossbeam_utils::Backoff;

use super::error::{PopError, RingError};
use super::ring_buffer::{Core, RingBuffer};
use crate::trace::{debug, trace};

/// Membuat ring buffer dan langsung memecahnya menjadi producer/consumer.
///
/// # Example
///
/// ```
/// use std::thread;
///
/// let (mut tx, mut rx) = courier::core::channel::<u64>(64).unwrap();
///
/// let handle = thread::spawn(move || {
///     for i in 0..10 {
///         tx.push(i);
///     }
/// });
///
/// let mut received = Vec::new();
/// while let Ok(v) = rx.pop() {
///     received.push(v);
/// }
/// handle.join().unwrap();
/// assert_eq!(received, (0..10).collect::<Vec<_>>());
/// ```
pub fn channel<T>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), RingError> {
    RingBuffer::new(capacity).map(RingBuffer::split)
}

/// Sisi producer. Tidak bisa di-clone: hanya ada satu penulis `head`.
pub struct Producer<T> {
    core: Arc<Core<T>>,
    unparker: Unparker,
}

impl<T> Producer<T> {
    pub(crate) fn new(core: Arc<Core<T>>, unparker: Unparker) -> Self {
        Self { core, unparker }
    }

    /// Push data ke buffer. Lock-free, tidak pernah blocking, tidak pernah gagal.
    ///
    /// Jika buffer penuh, elemen tertua dibuang dan di-release.
    #[inline]
    pub fn push(&mut self, value: T) {
        // SAFETY: Producer bukan Clone dan butuh &mut self, jadi satu-satunya producer
        unsafe { self.core.push(value) };
        self.notify_consumer();
    }

    /// Membangunkan consumer jika sedang park
    #[inline]
    fn notify_consumer(&self) {
        fence(Ordering::SeqCst);
        if self.core.consumer_parked.load(Ordering::Relaxed) {
            trace!("waking parked consumer");
            self.unparker.unpark();
        }
    }

    /// Jumlah elemen dalam buffer (advisory)
    #[inline]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns `true` jika consumer sudah di-drop. Push tetap berhasil,
    /// tapi tidak ada yang akan membaca datanya.
    #[inline]
    pub fn is_abandoned(&self) -> bool {
        !self.core.consumer_alive.load(Ordering::Acquire)
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        debug!("producer dropped");
        self.core.producer_alive.store(false, Ordering::Release);
        // Token unpark tersimpan, consumer yang akan park langsung bangun
        self.unparker.unpark();
    }
}

/// Sisi consumer. Tidak bisa di-clone: hanya ada satu pembaca `tail`.
pub struct Consumer<T> {
    core: Arc<Core<T>>,
    parker: Parker,
    snooze_iters: u32,
}

impl<T> Consumer<T> {
    pub(crate) fn new(core: Arc<Core<T>>, parker: Parker, snooze_iters: u32) -> Self {
        Self {
            core,
            parker,
            snooze_iters,
        }
    }

    /// Pop non-blocking. `None` jika buffer kosong.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: Consumer bukan Clone dan butuh &mut self, jadi satu-satunya consumer
        unsafe { self.core.try_pop() }
    }

    /// Pop blocking: menunggu sampai producer mem-publish elemen baru.
    ///
    /// Tanpa batas waktu. Satu-satunya jalan keluar tanpa data adalah
    /// producer di-drop, dan itu dilaporkan sebagai [`PopError::Disconnected`]
    /// setelah semua sisa data habis diambil.
    pub fn pop(&mut self) -> Result<T, PopError> {
        self.pop_until(None)
    }

    /// Seperti [`pop`](Self::pop), tapi menyerah setelah `timeout`.
    pub fn pop_timeout(&mut self, timeout: Duration) -> Result<T, PopError> {
        // Overflow Instant: perlakukan sebagai tanpa batas waktu
        self.pop_until(Instant::now().checked_add(timeout))
    }

    /// Seperti [`pop`](Self::pop), tapi menyerah pada `deadline`.
    pub fn pop_deadline(&mut self, deadline: Instant) -> Result<T, PopError> {
        self.pop_until(Some(deadline))
    }

    fn pop_until(&mut self, deadline: Option<Instant>) -> Result<T, PopError> {
        // Phase 1: fast path
        if let Some(value) = self.try_pop() {
            return Ok(value);
        }

        // Phase 2: backoff (spin + yield)
        let backoff = Backoff::new();
        for _ in 0..self.snooze_iters {
            backoff.snooze();
            if let Some(value) = self.try_pop() {
                return Ok(value);
            }
        }

        // Phase 3: park
        loop {
            if self.is_disconnected() {
                // producer_alive di-store setelah push terakhir, jadi sisa data visible
                return self.try_pop().ok_or(PopError::Disconnected);
            }

            self.core.consumer_parked.store(true, Ordering::Relaxed);
            fence(Ordering::SeqCst);

            // Cek ulang setelah memberi sinyal - mencegah missed wakeup
            if let Some(value) = self.try_pop() {
                self.core.consumer_parked.store(false, Ordering::Relaxed);
                return Ok(value);
            }

            trace!("consumer parking");
            match deadline {
                None => self.parker.park(),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        self.core.consumer_parked.store(false, Ordering::Relaxed);
                        return Err(PopError::Timeout);
                    }
                    self.parker.park_deadline(deadline);
                }
            }
            self.core.consumer_parked.store(false, Ordering::Relaxed);
            trace!("consumer woke up");

            // Bisa spurious wakeup, loop akan cek ulang semuanya
            if let Some(value) = self.try_pop() {
                return Ok(value);
            }
        }
    }

    /// Jumlah elemen dalam buffer (advisory)
    #[inline]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns `true` jika producer sudah di-drop.
    ///
    /// Masih mungkin ada data di buffer yang bisa diambil.
    #[inline]
    pub fn is_disconnected(&self) -> bool {
        !self.core.producer_alive.load(Ordering::Acquire)
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        debug!("consumer dropped");
        self.core.consumer_alive.store(false, Ordering::Release);
    }
}
