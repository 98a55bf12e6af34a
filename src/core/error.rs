//! Error types untuk ring buffer
//!
//! Buffer kosong dan overwrite saat penuh BUKAN error:
//! kosong dilaporkan lewat `Option`, overwrite adalah policy drop-oldest.

use std::collections::TryReserveError;

use thiserror::Error;

/// Kegagalan saat konstruksi ring buffer
#[derive(Debug, Error)]
pub enum RingError {
    /// Kapasitas logis 0 tidak didukung.
    #[error("ring buffer capacity must be non-zero")]
    ZeroCapacity,
    /// `capacity + 1` (slot cadangan) melebihi `usize::MAX`.
    #[error("ring buffer capacity {0} overflows when reserving the extra slot")]
    CapacityOverflow(usize),
    /// Alokasi storage gagal.
    #[error("failed to allocate ring buffer storage: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Kegagalan blocking pop di sisi consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    /// Producer sudah di-drop dan buffer sudah kosong.
    #[error("producer disconnected and buffer is empty")]
    Disconnected,
    /// Tidak ada data sampai batas waktu habis.
    #[error("timed out waiting for an element")]
    Timeout,
}
