//! Courier - Lock-Free SPSC Ring Buffer dengan Type-Erased Message Queue
//!
//! Arsitektur:
//! - Core: Ring buffer SPSC lock-free, overwrite-on-full (drop-oldest)
//! - SPSC Handles: Producer/Consumer dengan blocking pop via parking bersyarat
//! - Queue: Façade `MessageQueue<T>` di atas backend apa pun yang memenuhi `Backend<T>`

pub mod config;
pub mod core;
pub mod queue;
pub mod trace;

pub use crate::config::RingConfig;
pub use crate::core::{channel, Consumer, PopError, Producer, RingBuffer, RingError};
pub use crate::queue::{Backend, MessageQueue};
