//! Konfigurasi ring buffer

/// Kapasitas logis default
pub const DEFAULT_CAPACITY: usize = 128;

/// Jumlah iterasi `Backoff::snooze()` sebelum consumer benar-benar park.
///
/// Park/unpark berarti syscall (~1000+ cycles). Data yang datang "sebentar
/// lagi" lebih murah ditangkap dengan spin singkat.
pub const DEFAULT_SNOOZE_ITERS: u32 = 8;

/// Parameter konstruksi ring buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    /// Kapasitas logis (jumlah elemen maksimum yang bisa ditahan).
    /// Storage fisik selalu `capacity + 1` slot.
    pub capacity: usize,
    /// Iterasi snooze sebelum blocking pop melakukan park.
    pub snooze_iters: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            snooze_iters: DEFAULT_SNOOZE_ITERS,
        }
    }
}

impl RingConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// `0` berarti langsung park setelah satu percobaan gagal.
    #[must_use]
    pub fn snooze_iters(mut self, iters: u32) -> Self {
        self.snooze_iters = iters;
        self
    }
}
