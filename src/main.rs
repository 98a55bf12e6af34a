//! Courier Bench - demo dan benchmark ring buffer
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use courier::core::{PopError, RingBuffer};
use courier::queue::MessageQueue;
use courier::RingConfig;

/// Konfigurasi benchmark
struct BenchConfig {
    capacity: usize,
    messages: usize,
    snooze_iters: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let ring = RingConfig::default();
        Self {
            capacity: 65536,
            messages: 1_000_000,
            snooze_iters: ring.snooze_iters,
        }
    }
}

impl BenchConfig {
    fn ring_config(&self) -> RingConfig {
        RingConfig::with_capacity(self.capacity).snooze_iters(self.snooze_iters)
    }
}

fn main() {
    courier::trace::init_tracing();

    let config = parse_args();

    println!("🚀 Courier - Lock-Free SPSC Ring Buffer");
    println!("=======================================\n");

    if let Err(e) = run(&config) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }

    println!("\n✅ All benchmarks complete!");
}

fn run(config: &BenchConfig) -> Result<(), courier::RingError> {
    benchmark_ring_buffer(config)?;
    benchmark_overwrite(config)?;
    benchmark_message_queue(config)?;
    benchmark_spsc_threads(config)?;
    Ok(())
}

fn benchmark_ring_buffer(config: &BenchConfig) -> Result<(), courier::RingError> {
    println!("📊 Ring Buffer Benchmark (single thread)");
    println!("----------------------------------------");

    let iterations = config.messages;
    let mut rb: RingBuffer<u64> = RingBuffer::with_config(config.ring_config())?;

    // Warm up
    for i in 0..1000 {
        rb.push(i);
    }
    while rb.try_pop().is_some() {}

    // Benchmark push (termasuk overwrite saat penuh)
    let start = Instant::now();
    for i in 0..iterations {
        rb.push(i as u64);
    }
    let push_duration = start.elapsed();

    // Benchmark pop
    let start = Instant::now();
    let mut popped = 0usize;
    while rb.try_pop().is_some() {
        popped += 1;
    }
    let pop_duration = start.elapsed();

    let push_ns = push_duration.as_nanos() as f64 / iterations as f64;
    let pop_ns = pop_duration.as_nanos() as f64 / popped.max(1) as f64;

    println!("  Operations:   {}", iterations);
    println!("  Capacity:     {}", rb.capacity());
    println!(
        "  Push latency: {:.2} ns/op ({:.3} μs/op)",
        push_ns,
        push_ns / 1000.0
    );
    println!(
        "  Pop latency:  {:.2} ns/op ({:.3} μs/op)",
        pop_ns,
        pop_ns / 1000.0
    );
    println!(
        "  Throughput:   {:.2} M ops/sec\n",
        iterations as f64 / push_duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn benchmark_overwrite(config: &BenchConfig) -> Result<(), courier::RingError> {
    println!("📊 Overwrite Benchmark (Arc payload, drop-oldest)");
    println!("-------------------------------------------------");

    let payload = Arc::new([0u8; 64]);
    let mut rb = RingBuffer::with_config(config.ring_config())?;

    let start = Instant::now();
    for _ in 0..config.messages {
        rb.push(Arc::clone(&payload));
    }
    let duration = start.elapsed();

    // Semua yang di-overwrite sudah di-release, sisa referensi = isi buffer + 1
    let held = Arc::strong_count(&payload) - 1;

    println!("  Pushed:       {}", config.messages);
    println!("  Held:         {} (capacity {})", held, rb.capacity());
    println!(
        "  Dropped:      {}",
        config.messages.saturating_sub(held)
    );
    println!(
        "  Push latency: {:.2} ns/op\n",
        duration.as_nanos() as f64 / config.messages as f64
    );

    Ok(())
}

fn benchmark_message_queue(config: &BenchConfig) -> Result<(), courier::RingError> {
    println!("📊 MessageQueue Benchmark (type-erased backend)");
    println!("-----------------------------------------------");

    let mut mq: MessageQueue<u64> = MessageQueue::new(RingBuffer::with_config(config.ring_config())?);

    let start = Instant::now();
    for i in 0..config.messages {
        mq.enqueue(i as u64);
        mq.dequeue();
    }
    let duration = start.elapsed();

    println!(
        "  Enqueue+dequeue: {:.2} ns/cycle\n",
        duration.as_nanos() as f64 / config.messages as f64
    );

    Ok(())
}

fn benchmark_spsc_threads(config: &BenchConfig) -> Result<(), courier::RingError> {
    println!("📊 SPSC Benchmark (producer thread -> consumer thread)");
    println!("------------------------------------------------------");

    let (mut tx, mut rx) = RingBuffer::<u64>::with_config(config.ring_config())?.split();
    let messages = config.messages;

    let start = Instant::now();
    let producer = thread::spawn(move || {
        for i in 0..messages {
            tx.push(i as u64);
        }
    });

    let mut received = 0usize;
    let mut out_of_order = 0usize;
    let mut last: Option<u64> = None;
    loop {
        match rx.pop_timeout(Duration::from_secs(1)) {
            Ok(v) => {
                if last.is_some_and(|prev| v <= prev) {
                    out_of_order += 1;
                }
                last = Some(v);
                received += 1;
            }
            Err(PopError::Disconnected) => break,
            Err(PopError::Timeout) => {
                println!("  ⚠️  Consumer timed out waiting for producer");
                break;
            }
        }
    }
    let duration = start.elapsed();
    producer.join().ok();

    println!("  Sent:         {}", messages);
    println!("  Received:     {}", received);
    println!(
        "  Dropped:      {} (overwrite-on-full)",
        messages.saturating_sub(received)
    );
    println!("  Out of order: {}", out_of_order);
    println!(
        "  Throughput:   {:.2} M msgs/sec",
        received as f64 / duration.as_secs_f64() / 1_000_000.0
    );

    Ok(())
}

fn parse_args() -> BenchConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = BenchConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    // Kapasitas 0 atau negatif ditolak oleh RingBuffer saat konstruksi
                    config.capacity = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--messages" | "-n" => {
                if i + 1 < args.len() {
                    config.messages = args[i + 1].parse().unwrap_or(1_000_000);
                    i += 1;
                }
            }
            "--snooze" => {
                if i + 1 < args.len() {
                    config.snooze_iters = args[i + 1].parse().unwrap_or(config.snooze_iters);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Courier Bench - Lock-Free SPSC Ring Buffer\n");
                println!("Usage: courier [OPTIONS]\n");
                println!("Options:");
                println!("  -c, --capacity <N>    Ring capacity (default: 65536)");
                println!("  -n, --messages <N>    Messages per benchmark (default: 1000000)");
                println!("      --snooze <N>      Snooze iterations before parking (default: 8)");
                println!("  -h, --help            Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}
