use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::domain::config::HostConfig;

/// Default worker-pool width when the config does not set one.
pub const DEFAULT_WORKERS: usize = 4;

/// Runs `work` once per host on a bounded pool of scoped threads. Each host
/// is an independent unit; a failure inside one worker's closure never blocks
/// the others. Results come back in config host order regardless of
/// completion order.
pub fn run_hosts<T, F>(hosts: &[HostConfig], workers: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(&HostConfig) -> T + Sync,
{
    let width = workers.clamp(1, hosts.len().max(1));
    let next = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel::<(usize, T)>();

    thread::scope(|scope| {
        for _ in 0..width {
            let sender = sender.clone();
            let next = &next;
            let work = &work;
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(host) = hosts.get(index) else {
                        break;
                    };
                    if sender.send((index, work(host))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(sender);

    let mut slots: Vec<Option<T>> = (0..hosts.len()).map(|_| None).collect();
    for (index, value) in receiver {
        slots[index] = Some(value);
    }
    slots.into_iter().flatten().collect()
}
