use crate::interfaces::windows::{OpenWindow, WindowLifecycleManager};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, warn};

pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(5);
pub const MEMORY_HIGH_WATER_BYTES: u64 = 500 * 1024 * 1024;
pub const WINDOW_COUNT_THRESHOLD: usize = 5;

/// One periodic self-check sample. Recomputed every tick, never persisted.
#[derive(Debug, Clone)]
pub struct WatchdogSample {
    pub sampled_at: Instant,
    pub heap_used_bytes: u64,
    pub live_window_count: usize,
}

/// Windows sharing an identity key are duplicates of one another; the key
/// is derived from the title so renamed labels still collapse together.
pub fn identity_key(title: &str) -> String {
    title.trim().to_ascii_lowercase()
}

/// Labels to close so that exactly one representative per identity key
/// survives. Order follows the census, so the first window seen per key is
/// the one kept.
pub fn duplicate_labels(windows: &[OpenWindow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for window in windows {
        if !seen.insert(identity_key(&window.title)) {
            duplicates.push(window.label.clone());
        }
    }
    duplicates
}

fn sample_memory(sys: &mut System) -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|process| process.memory()).unwrap_or(0)
}

/// Periodic self-check: samples process memory and the live-window census,
/// reclaims vanished-window state past the memory high-water mark, and
/// prunes duplicate windows past the count threshold. Never restarts the
/// process; it only prunes state.
pub fn spawn(windows: Arc<WindowLifecycleManager>) {
    tauri::async_runtime::spawn(async move {
        run(windows).await;
    });
}

async fn run(windows: Arc<WindowLifecycleManager>) {
    let mut interval = tokio::time::interval(WATCHDOG_INTERVAL);
    let mut sys = System::new();

    loop {
        interval.tick().await;

        let open = windows.open_windows();
        let sample = WatchdogSample {
            sampled_at: Instant::now(),
            heap_used_bytes: sample_memory(&mut sys),
            live_window_count: open.len(),
        };
        debug!(
            heap_used_bytes = sample.heap_used_bytes,
            live_window_count = sample.live_window_count,
            "watchdog tick"
        );

        if sample.heap_used_bytes > MEMORY_HIGH_WATER_BYTES {
            let pruned = windows.prune_dead_slots();
            warn!(
                heap_used_bytes = sample.heap_used_bytes,
                pruned, "memory above high-water mark, reclaimed window state"
            );
        }

        if sample.live_window_count > WINDOW_COUNT_THRESHOLD {
            for label in duplicate_labels(&open) {
                warn!(label = %label, "closing duplicate window");
                if let Err(err) = windows.close_native(&label) {
                    warn!(label = %label, error = %err, "failed to close duplicate window");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(label: &str, title: &str) -> OpenWindow {
        OpenWindow {
            label: label.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_six_windows_with_one_duplicate_pair_closes_exactly_one() {
        let census = vec![
            window("translation", "Translation"),
            window("settings", "Traylate Settings"),
            window("about", "About Traylate"),
            window("translate-now", "Translate Now"),
            window("crash", "Traylate Crash Report"),
            window("translation-2", "Translation"),
        ];

        let duplicates = duplicate_labels(&census);

        assert_eq!(duplicates, vec!["translation-2".to_string()]);
        assert_eq!(census.len() - duplicates.len(), 5);
    }

    #[test]
    fn test_identity_key_ignores_case_and_padding() {
        assert_eq!(identity_key("  Translation "), identity_key("translation"));
    }

    #[test]
    fn test_unique_windows_are_untouched() {
        let census = vec![
            window("translation", "Translation"),
            window("settings", "Traylate Settings"),
        ];
        assert!(duplicate_labels(&census).is_empty());
    }

    #[test]
    fn test_triplicate_keeps_one_representative() {
        let census = vec![
            window("a", "Translation"),
            window("b", "Translation"),
            window("c", "Translation"),
        ];
        assert_eq!(duplicate_labels(&census), vec!["b", "c"]);
    }
}
