//! Map types used by the state store. The `std-hash` feature swaps the
//! `hashbrown` maps for the standard library ones.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::HashMap;

    pub type StoreMap<K, V> = HashMap<K, V>;

    pub fn new_store_map<K, V>() -> StoreMap<K, V> {
        HashMap::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::HashMap;

    pub type StoreMap<K, V> = HashMap<K, V, crate::hash::default::BuildHasher>;

    pub fn new_store_map<K, V>() -> StoreMap<K, V> {
        HashMap::with_hasher(crate::hash::default::BuildHasher::default())
    }
}
