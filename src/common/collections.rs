//! Collections keyed by small ids.
//!
//! Node and window ids hash cheaply, so the fast non-cryptographic hasher is
//! used for hash maps.

pub use std::collections::{BTreeMap, BTreeSet};

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
