#![warn(missing_docs)]
//! Threaded collection and training over a shared replay buffer.
//!
//! An [`AsyncCollector`] runs a [`Collector`](recall_core::Collector) on its
//! own thread, writing into a
//! [`SharedReplayBuffer`](recall_core::replay_buffer::SharedReplayBuffer),
//! while an [`AsyncTrainer`] consumes sampled batches from the buffer's
//! stream on the calling thread. The two sides communicate collection
//! progress over a [`crossbeam_channel`].
mod collector;
mod config;
mod messages;
mod trainer;
mod util;
pub use collector::AsyncCollector;
pub use config::AsyncTrainerConfig;
pub use messages::CollectorStat;
pub use trainer::AsyncTrainer;
pub use util::train_async;
