//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer, policy overwrite-on-full
//!
//! Implementasi menggunakan Lamport Queue dengan satu slot cadangan:
//! storage fisik `capacity + 1` slot, sehingga `head == tail` SELALU berarti kosong.
//!
//! Push tidak pernah gagal dan tidak pernah blocking. Jika buffer penuh,
//! elemen tertua (di `tail`) dibuang lalu di-release (drop) sebelum slotnya
//! dianggap bebas. Data loss saat overflow adalah trade-off yang disengaja.
//!
//! Karena producer juga boleh memajukan `tail` (saat overwrite), kedua sisi
//! mengklaim slot tertua lewat compare-exchange pada `tail`. Siapa yang
//! menang CAS, dia pemilik elemen tersebut.

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::sync::Parker;
use crossbeam_utils::{Backoff, CachePadded};

use super::error::RingError;
use super::iter::{Iter, IterMut};
use super::spsc::{Consumer, Producer};
use crate::config::RingConfig;
use crate::trace::{debug, trace};

/// Nilai `reading` saat consumer tidak sedang membaca slot mana pun
const IDLE: usize = usize::MAX;

/// Slot dalam ring buffer
pub(crate) struct Slot<T> {
    data: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.data.get().cast::<T>()
    }
}

/// State bersama antara producer dan consumer.
///
/// Single-writer per field:
/// - `head`: hanya producer
/// - `tail`: consumer (pop) dan producer (overwrite), selalu lewat CAS
/// - `reading`: hanya consumer
pub(crate) struct Core<T> {
    // Producer side - cache line aligned
    head: CachePadded<AtomicUsize>,
    // Consumer side - cache line aligned
    tail: CachePadded<AtomicUsize>,
    // Slot yang sedang di-move out oleh consumer, atau IDLE
    reading: CachePadded<AtomicUsize>,
    pub(super) consumer_parked: CachePadded<AtomicBool>,
    pub(super) producer_alive: AtomicBool,
    pub(super) consumer_alive: AtomicBool,
    // Pre-allocated buffer di heap - tidak ada alokasi setelah init
    buffer: Box<[Slot<T>]>,
}

// SAFETY: Core aman untuk Send/Sync karena:
// - Hanya satu producer (menulis head) dan satu consumer (menulis reading)
// - Kepemilikan slot tertua ditentukan oleh CAS pada tail
// - Core tidak pernah memberikan &T ke dua thread sekaligus
unsafe impl<T: Send> Send for Core<T> {}
unsafe impl<T: Send> Sync for Core<T> {}

impl<T> Core<T> {
    fn allocate(capacity: usize) -> Result<Self, RingError> {
        if capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        let slots = capacity
            .checked_add(1)
            .ok_or(RingError::CapacityOverflow(capacity))?;

        // Alokasi sekali di sini, gagal alokasi dikembalikan sebagai error
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(slots)?;
        for _ in 0..slots {
            buffer.push(Slot::new());
        }

        debug!(capacity, slots, "ring buffer allocated");

        Ok(Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            reading: CachePadded::new(AtomicUsize::new(IDLE)),
            consumer_parked: CachePadded::new(AtomicBool::new(false)),
            producer_alive: AtomicBool::new(true),
            consumer_alive: AtomicBool::new(true),
            buffer: buffer.into_boxed_slice(),
        })
    }

    /// Jumlah slot fisik (`capacity + 1`)
    #[inline(always)]
    pub(crate) fn slots(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len() - 1
    }

    #[inline(always)]
    pub(crate) fn buffer(&self) -> &[Slot<T>] {
        &self.buffer
    }

    #[inline(always)]
    pub(crate) fn next(&self, index: usize) -> usize {
        if index + 1 == self.slots() {
            0
        } else {
            index + 1
        }
    }

    #[inline(always)]
    pub(crate) fn prev(&self, index: usize) -> usize {
        if index == 0 {
            self.slots() - 1
        } else {
            index - 1
        }
    }

    /// Snapshot `(head, tail)` dengan relaxed load
    #[inline(always)]
    pub(crate) fn bounds(&self) -> (usize, usize) {
        (
            self.head.load(Ordering::Relaxed),
            self.tail.load(Ordering::Relaxed),
        )
    }

    #[inline(always)]
    fn distance(&self, head: usize, tail: usize) -> usize {
        if head >= tail {
            head - tail
        } else {
            head + (self.slots() - tail)
        }
    }

    /// `(head - tail + slots) mod slots`, selalu di `[0, capacity]`.
    ///
    /// Best-effort: bisa stale saat ada mutasi concurrent.
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        let (head, tail) = self.bounds();
        self.distance(head, tail)
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        let (head, tail) = self.bounds();
        head == tail
    }

    /// Push data ke buffer (Producer side). Tidak pernah gagal.
    ///
    /// # Safety
    /// Hanya boleh dipanggil oleh satu producer pada satu waktu.
    #[inline]
    pub(crate) unsafe fn push(&self, value: T) {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = self.next(head);
        let mut tail = self.tail.load(Ordering::Acquire);

        // Buffer penuh: klaim slot tertua sebelum head menabraknya
        while next_head == tail {
            match self.tail.compare_exchange_weak(
                tail,
                self.next(tail),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    trace!(slot = tail, "buffer full, dropping oldest element");
                    if mem::needs_drop::<T>() {
                        // SAFETY: CAS menang, producer pemilik eksklusif elemen ini.
                        // Consumer hanya membaca slot setelah CAS-nya sendiri berhasil.
                        unsafe { ptr::drop_in_place(self.buffer[tail].as_ptr()) };
                    }
                    break;
                }
                // Consumer memajukan tail (atau spurious failure), cek ulang
                Err(current) => tail = current,
            }
        }

        // Consumer mungkin masih move out dari slot head. Ini hanya terjadi jika
        // producer menyusul consumer satu putaran penuh di tengah pembacaan.
        if self.reading.load(Ordering::Acquire) == head {
            let backoff = Backoff::new();
            while self.reading.load(Ordering::Acquire) == head {
                backoff.snooze();
            }
        }

        // SAFETY: slot head tidak berisi elemen valid (slot cadangan) dan
        // tidak sedang dibaca consumer
        unsafe { self.buffer[head].as_ptr().write(value) };

        // Release: write di atas visible sebelum head di-update
        self.head.store(next_head, Ordering::Release);
    }

    /// Pop data dari buffer (Consumer side). Non-blocking.
    ///
    /// # Safety
    /// Hanya boleh dipanggil oleh satu consumer pada satu waktu.
    #[inline]
    pub(crate) unsafe fn try_pop(&self) -> Option<T> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);

            if tail == head {
                return None;
            }

            // Umumkan slot yang akan dibaca SEBELUM klaim, supaya producer
            // yang melihat tail baru juga melihat marker ini
            self.reading.store(tail, Ordering::Release);

            match self.tail.compare_exchange(
                tail,
                self.next(tail),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // SAFETY: CAS menang, slot ini sudah ditulis dan milik consumer.
                    // Value di-move out, slot kosong secara logis.
                    let value = unsafe { self.buffer[tail].as_ptr().read() };
                    self.reading.store(IDLE, Ordering::Release);
                    return Some(value);
                }
                // Producer sudah membuang elemen tertua. Lepas marker dulu,
                // producer tidak boleh menunggu slot yang tidak jadi dibaca.
                Err(_) => self.reading.store(IDLE, Ordering::Release),
            }
        }
    }
}

impl<T> Drop for Core<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }

        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();

        // Release semua elemen yang masih ditahan
        while tail != head {
            // SAFETY: &mut self, elemen di [tail, head) valid
            unsafe { ptr::drop_in_place(self.buffer[tail].as_ptr()) };
            tail = self.next(tail);
        }
    }
}

/// Lock-Free SPSC Ring Buffer dengan overwrite-on-full.
///
/// Dalam bentuk ini buffer dipakai lewat `&mut self` (satu owner). Untuk
/// dipakai dua thread, pecah menjadi [`Producer`] dan [`Consumer`] dengan
/// [`RingBuffer::split`].
///
/// ```
/// use courier::core::RingBuffer;
///
/// let mut rb = RingBuffer::new(3).unwrap();
/// for v in ['a', 'b', 'c', 'd'] {
///     rb.push(v);
/// }
///
/// // 'a' dibuang saat 'd' masuk
/// assert_eq!(rb.try_pop(), Some('b'));
/// assert_eq!(rb.try_pop(), Some('c'));
/// assert_eq!(rb.try_pop(), Some('d'));
/// assert_eq!(rb.try_pop(), None);
/// ```
pub struct RingBuffer<T> {
    core: Core<T>,
    config: RingConfig,
    // &RingBuffer memberikan &T lewat iter(), jadi Sync hanya jika T: Sync
    _marker: PhantomData<T>,
}

impl<T> RingBuffer<T> {
    /// Membuat ring buffer dengan kapasitas logis `capacity`.
    ///
    /// Storage fisik `capacity + 1` slot, dialokasikan sekali di sini.
    ///
    /// # Errors
    /// [`RingError::ZeroCapacity`] jika `capacity == 0`,
    /// [`RingError::CapacityOverflow`] / [`RingError::Alloc`] jika storage tidak bisa dibuat.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::with_config(RingConfig::with_capacity(capacity))
    }

    pub fn with_config(config: RingConfig) -> Result<Self, RingError> {
        Ok(Self {
            core: Core::allocate(config.capacity)?,
            config,
            _marker: PhantomData,
        })
    }

    /// Push data ke buffer. Jika penuh, elemen tertua dibuang.
    #[inline]
    pub fn push(&mut self, value: T) {
        // SAFETY: &mut self, tidak ada producer lain
        unsafe { self.core.push(value) }
    }

    /// Returns `Some(T)` jika ada data, `None` jika buffer kosong.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        // SAFETY: &mut self, tidak ada consumer lain
        unsafe { self.core.try_pop() }
    }

    /// Jumlah elemen dalam buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Cek apakah buffer kosong
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// Cek apakah buffer penuh (push berikutnya akan overwrite)
    #[inline]
    pub fn is_full(&self) -> bool {
        self.core.len() == self.core.capacity()
    }

    /// Kapasitas logis buffer
    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Iterator dari elemen tertua ke terbaru. Pakai `.rev()` untuk arah sebaliknya.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.core)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&mut self.core)
    }

    /// Memecah buffer menjadi handle producer dan consumer untuk dua thread.
    ///
    /// Tidak ada handle yang bisa di-clone, jadi "tepat satu producer dan
    /// satu consumer" dijamin oleh type system.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let RingBuffer { core, config, .. } = self;
        debug!(capacity = core.capacity(), "ring buffer split");

        let core = Arc::new(core);
        let parker = Parker::new();
        let unparker = parker.unparker().clone();

        (
            Producer::new(Arc::clone(&core), unparker),
            Consumer::new(core, parker, config.snooze_iters),
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut RingBuffer<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_push_pop() {
        let mut rb: RingBuffer<u64> = RingBuffer::new(16).unwrap();

        assert!(rb.is_empty());
        assert!(!rb.is_full());

        rb.push(42);
        assert!(!rb.is_empty());
        assert_eq!(rb.len(), 1);

        assert_eq!(rb.try_pop(), Some(42));
        assert!(rb.is_empty());
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut rb = RingBuffer::new(10).unwrap();

        for i in 0..5 {
            rb.push(i);
        }
        for i in 0..5 {
            assert_eq!(rb.try_pop(), Some(i));
        }
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn test_overwrite_drops_oldest() {
        let mut rb = RingBuffer::new(3).unwrap();

        rb.push('a');
        rb.push('b');
        rb.push('c');
        assert!(rb.is_full());

        // Buffer penuh: 'a' dibuang, bukan error
        rb.push('d');
        assert_eq!(rb.len(), 3);

        assert_eq!(rb.try_pop(), Some('b'));
        assert_eq!(rb.try_pop(), Some('c'));
        assert_eq!(rb.try_pop(), Some('d'));
        assert!(rb.is_empty());
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn test_wraparound() {
        let mut rb: RingBuffer<u64> = RingBuffer::new(4).unwrap();

        // Fill and drain multiple times to test wraparound
        for round in 0..10 {
            for i in 0..4 {
                rb.push(round * 4 + i);
            }
            for i in 0..4 {
                assert_eq!(rb.try_pop(), Some(round * 4 + i));
            }
        }
    }

    #[test]
    fn test_capacity_one() {
        let mut rb = RingBuffer::new(1).unwrap();

        rb.push(1);
        rb.push(2);
        rb.push(3);
        assert_eq!(rb.len(), 1);
        assert_eq!(rb.try_pop(), Some(3));
        assert_eq!(rb.try_pop(), None);
    }

    #[test]
    fn test_len_and_empty_consistent() {
        let mut rb = RingBuffer::new(5).unwrap();

        for step in 0..40u32 {
            if step % 3 == 2 {
                rb.try_pop();
            } else {
                rb.push(step);
            }
            assert_eq!(rb.is_empty(), rb.len() == 0);
            assert!(rb.len() <= rb.capacity());
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = RingBuffer::<u8>::new(0);
        assert!(matches!(result, Err(RingError::ZeroCapacity)));
    }

    #[test]
    fn test_capacity_overflow_rejected() {
        let result = RingBuffer::<u8>::new(usize::MAX);
        assert!(matches!(result, Err(RingError::CapacityOverflow(_))));
    }

    #[test]
    fn test_allocation_failure_is_error() {
        // Layout melebihi isize::MAX -> try_reserve gagal, bukan abort
        let result = RingBuffer::<u64>::new(usize::MAX / 4);
        assert!(matches!(result, Err(RingError::Alloc(_))));
    }

    #[test]
    fn test_config_capacity_applied() {
        let config = RingConfig::default();
        let rb: RingBuffer<u8> = RingBuffer::with_config(config).unwrap();
        assert_eq!(rb.capacity(), 128);
        assert_eq!(rb.config(), &config);
    }

    #[test]
    fn test_arc_push_pop_refcount() {
        let mut rb = RingBuffer::new(3).unwrap();

        let sp1 = Arc::new(100);
        let sp2 = Arc::new(200);

        rb.push(Arc::clone(&sp1));
        assert_eq!(Arc::strong_count(&sp1), 2);

        rb.push(sp2);
        assert_eq!(rb.len(), 2);

        let out = rb.try_pop().unwrap();
        assert_eq!(*out, 100);
        assert_eq!(Arc::strong_count(&out), 2);
        drop(out);
        assert_eq!(Arc::strong_count(&sp1), 1);

        let out = rb.try_pop().unwrap();
        assert_eq!(*out, 200);
        assert_eq!(Arc::strong_count(&out), 1);

        assert!(rb.try_pop().is_none());
    }

    #[test]
    fn test_arc_released_on_overwrite() {
        let mut rb = RingBuffer::new(2).unwrap();

        let sp1 = Arc::new(1);
        let sp2 = Arc::new(2);
        let sp3 = Arc::new(3);

        rb.push(Arc::clone(&sp1));
        rb.push(Arc::clone(&sp2));
        assert_eq!(Arc::strong_count(&sp1), 2);

        // sp1 di-overwrite: referensi di buffer harus langsung di-release
        rb.push(Arc::clone(&sp3));
        assert_eq!(Arc::strong_count(&sp1), 1);
        assert_eq!(Arc::strong_count(&sp2), 2);

        assert_eq!(*rb.try_pop().unwrap(), 2);
        assert_eq!(*rb.try_pop().unwrap(), 3);
        assert!(rb.is_empty());
        assert_eq!(Arc::strong_count(&sp2), 1);
        assert_eq!(Arc::strong_count(&sp3), 1);
    }

    #[test]
    fn test_drop_releases_remaining() {
        let tracker = Arc::new(());
        {
            let mut rb = RingBuffer::new(4).unwrap();
            for _ in 0..6 {
                rb.push(Arc::clone(&tracker));
            }
            rb.try_pop();
            assert_eq!(Arc::strong_count(&tracker), 4);
        }
        assert_eq!(Arc::strong_count(&tracker), 1);
    }

    #[test]
    fn test_owned_heap_values() {
        let mut rb = RingBuffer::new(2).unwrap();

        rb.push(String::from("satu"));
        rb.push(String::from("dua"));
        rb.push(String::from("tiga"));

        assert_eq!(rb.try_pop().as_deref(), Some("dua"));
        assert_eq!(rb.try_pop().as_deref(), Some("tiga"));
    }

    #[test]
    fn test_debug_lists_oldest_first() {
        let mut rb = RingBuffer::new(3).unwrap();
        for i in 1..=4 {
            rb.push(i);
        }
        assert_eq!(format!("{:?}", rb), "[2, 3, 4]");
    }
}
