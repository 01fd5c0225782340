//! Cache building blocks for upstream content
//!
//! Keys are derived from the endpoint and its sorted parameters, entries live
//! in an in-memory store for the lifetime of the process, and a freshness
//! policy decides whether an entry is served as is, served while being
//! refreshed, or refetched. Time is read through a [`Clock`] so tests can age
//! entries without sleeping.

mod clock;
mod key;
mod policy;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::CacheKey;
pub use policy::{Freshness, FreshnessPolicy, PolicyError};
pub use store::{CacheEntry, CacheStore};
