//! Glance sync: the host publishes a minimal snapshot, a separate renderer reads it.
//!
//! ```text
//! SessionController → SharedStatePublisher → SharedRegion → glance renderer
//!      (host)             (single writer)      (file/mem)     (read-only)
//! ```
//!
//! - [`region`]: the key-value regions (file-backed and in-memory)
//! - [`publisher`]: publish/read of [`PublishedSnapshot`]

mod publisher;
mod region;

pub use publisher::SharedStatePublisher;
pub use region::{FileRegion, MemoryRegion, SharedRegion};
pub use shoot_glance_protocol::{PublishedSnapshot, RefreshPolicy, RegionValue};
