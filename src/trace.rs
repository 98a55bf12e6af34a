//! Tracing untuk debugging courier.
//!
//! Aktifkan dengan `--features tracing`. Tanpa feature tersebut semua macro
//! di bawah menjadi no-op, jadi hot path push/pop tidak membayar apa-apa.

/// Memasang tracing subscriber dengan timestamp uptime.
///
/// Panggil sekali di awal binary atau test. Tidak melakukan apa-apa jika
/// feature `tracing` tidak aktif.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courier=trace"));

    // try_init: test yang berbeda boleh memanggil ini berkali-kali
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_line_number(false)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug_noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_noop as trace;
