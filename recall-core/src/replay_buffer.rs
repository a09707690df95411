//! Fixed-capacity, batched experience replay.
//!
//! A [`ReplayBuffer`] owns `batch_size` independent [`Lane`]s, one per
//! parallel collection stream. Writes go through [`add_batch`], which
//! appends exactly one spec-validated record to every lane; reads draw
//! random contiguous windows ([`get_next`]), stream them indefinitely
//! ([`SharedReplayBuffer::stream`]), or snapshot everything
//! ([`gather_all`]).
//!
//! [`add_batch`]: ReplayBuffer::add_batch
//! [`get_next`]: ReplayBuffer::get_next
//! [`gather_all`]: ReplayBuffer::gather_all
mod base;
mod config;
mod lane;
mod sampler;
mod shared;
mod stream;
pub use base::ReplayBuffer;
pub use config::ReplayBufferConfig;
pub use lane::Lane;
pub use shared::SharedReplayBuffer;
pub use stream::BatchStream;
