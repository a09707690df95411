//! Collection thread.
use crate::CollectorStat;
use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;
use log::info;
use recall_core::{replay_buffer::SharedReplayBuffer, Collector, Env, Policy};
use std::{
    sync::{Arc, Mutex},
    thread::JoinHandle,
};

/// Runs a [`Collector`] on its own thread against a shared buffer.
///
/// The thread performs collection steps until [`stop`] flips the shared stop
/// flag; the in-flight step completes before the thread exits, so no
/// partially assembled batch is ever written. Collection progress is
/// reported as [`CollectorStat`] messages every `stat_interval` steps.
///
/// [`stop`]: AsyncCollector::stop
pub struct AsyncCollector {
    stop: Arc<Mutex<bool>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl AsyncCollector {
    /// Spawns the collection thread.
    pub fn spawn<E, P>(
        mut collector: Collector<E>,
        mut policy: P,
        buffer: SharedReplayBuffer,
        stats: Sender<CollectorStat>,
        stat_interval: usize,
    ) -> Self
    where
        E: Env + Send + 'static,
        P: Policy + Send + 'static,
    {
        let stop = Arc::new(Mutex::new(false));
        let stop_flag = stop.clone();
        let handle = std::thread::spawn(move || -> Result<()> {
            let mut buffer = buffer;
            let mut steps = 0;
            loop {
                if *stop_flag.lock().unwrap() {
                    break;
                }
                collector.collect_step(&mut policy, &mut buffer)?;
                steps += 1;
                if steps % stat_interval == 0 {
                    let _ = stats.send(CollectorStat {
                        env_steps: collector.env_steps(),
                        episodes: collector.episodes(),
                    });
                }
            }
            info!(
                "collector stopped after {} env steps, {} episodes",
                collector.env_steps(),
                collector.episodes()
            );
            Ok(())
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the thread to stop after its in-flight step and joins it.
    pub fn stop(&mut self) -> Result<()> {
        *self.stop.lock().unwrap() = true;
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("collector thread panicked"))??;
        }
        Ok(())
    }
}
