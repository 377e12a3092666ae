pub mod memory;

pub use memory::MemoryKv;

/// Whole-document key-value substrate the manager persists into.
///
/// Reads and writes are synchronous and assumed to succeed; an implementation
/// that can fail must absorb the failure itself.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}
