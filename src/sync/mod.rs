pub mod cache;
mod engine;

pub use cache::{MemoryCache, RoomCache, TtlPolicy};
pub use engine::RoomSync;

#[cfg(test)]
pub(crate) use engine::mocks;
