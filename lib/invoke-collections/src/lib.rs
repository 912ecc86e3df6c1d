//! Immutable ordered and sorted containers.
//!
//! Builders here take any sequence of entries or elements and produce a read-only container: either one that
//! remembers insertion order ([`ImmutableOrderedMap`], [`ImmutableOrderedSet`]) or one kept in sorted order
//! ([`ImmutableSortedMap`], [`ImmutableSortedSet`]), optionally with a custom comparator. Empty input always yields an
//! empty container. All containers are cheap to clone and safe to share between threads.
#![deny(warnings)]
#![deny(missing_docs)]

mod ordered;
pub use self::ordered::{immutable_ordered_map_of, immutable_ordered_set_of, ImmutableOrderedMap, ImmutableOrderedSet};

mod sorted;
pub use self::sorted::{
    immutable_sorted_map_by, immutable_sorted_map_of, immutable_sorted_set_by, immutable_sorted_set_of,
    ImmutableSortedMap, ImmutableSortedSet,
};
