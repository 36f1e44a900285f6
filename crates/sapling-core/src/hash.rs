//! Hasher selection for the store maps.

#[cfg(feature = "std-hash")]
pub mod default {
    pub type BuildHasher = std::collections::hash_map::RandomState;
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub type BuildHasher = ahash::RandomState;
}
