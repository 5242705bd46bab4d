use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use rayon::ThreadPoolBuilder;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

struct ThreadConfig {
    count: usize,
    source: &'static str,
}

/// Scheduler and OpenMP hints, most specific first.
const THREAD_HINTS: [&str; 6] = [
    "RVEDECK_THREADS",
    "RAYON_NUM_THREADS",
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "PBS_NP",
    "OMP_NUM_THREADS",
];

fn threads_from_env(keys: &[&'static str]) -> Option<ThreadConfig> {
    keys.iter().find_map(|&key| {
        let count = std::env::var(key)
            .ok()?
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)?;
        Some(ThreadConfig { count, source: key })
    })
}

fn detect_thread_config() -> ThreadConfig {
    threads_from_env(&THREAD_HINTS).unwrap_or_else(|| ThreadConfig {
        count: std::thread::available_parallelism().map_or(1, |n| n.get()),
        source: "available_parallelism",
    })
}

pub fn configure_thread_pool() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let cfg = detect_thread_config();
        match ThreadPoolBuilder::new()
            .num_threads(cfg.count)
            .thread_name(|i| format!("rvedeck-worker-{i}"))
            .build_global()
        {
            Ok(_) => {
                tracing::debug!(threads = cfg.count, hint = %cfg.source, "rayon pool configured");
            }
            Err(err) => {
                tracing::warn!(%err, "failed to configure rayon pool; continuing with default");
            }
        }
    });
}

/// Install the stderr subscriber; filter from `RVEDECK_LOG`, default `info`.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("RVEDECK_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        // A subscriber installed by an embedding program wins.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

/// Extensions above this records-per-measured-record ratio are logged as warnings.
/// Set via `RVEDECK_DUP_WARN`; default 2.0.
pub fn duplication_warn_ratio() -> f64 {
    std::env::var("RVEDECK_DUP_WARN")
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(2.0)
}

/// Fixed seed for extension sampling, from `RVEDECK_SEED`; unset -> none.
pub fn sampling_seed() -> Option<u64> {
    match std::env::var("RVEDECK_SEED") {
        Ok(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        _ => None,
    }
}

/// OS entropy by default; a seeded `StdRng` when `RVEDECK_SEED` is set.
pub fn sampling_rng() -> Box<dyn RngCore> {
    match sampling_seed() {
        Some(seed) => {
            tracing::info!(seed, "extension sampling seeded");
            Box::new(StdRng::seed_from_u64(seed))
        }
        None => Box::new(OsRng),
    }
}
