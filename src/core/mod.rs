//! Core module: Lock-Free SPSC Ring Buffer dengan policy overwrite-on-full
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic operations di push/pop, tidak ada Mutex/RwLock
//! - No-Allocation: Semua slot pre-allocated saat init
//! - Never-Fail Push: Buffer penuh berarti elemen tertua dibuang (drop-oldest)
//! - SPSC by type: Producer dan Consumer tidak bisa di-clone

mod error;
mod iter;
mod ring_buffer;
mod spsc;

pub use error::{PopError, RingError};
pub use iter::{Iter, IterMut};
pub use ring_buffer::RingBuffer;
pub use spsc::{channel, Consumer, Producer};
