#![allow(dead_code)]

use clip_batch::Identifier;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for generating target dataset names
pub fn dataset_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,15}"
}

/// Strategy for generating distinct, ordered target lists
pub fn target_list_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(dataset_name_strategy(), 0..6)
        .prop_map(|names| names.into_iter().collect())
}

/// Strategy for generating distinct identifiers in an arbitrary order
pub fn identifier_list_strategy() -> impl Strategy<Value = Vec<Identifier>> {
    prop::collection::btree_set(0i64..100_000, 0..60)
        .prop_map(|set: BTreeSet<i64>| set.into_iter().map(Identifier::from).collect::<Vec<_>>())
        .prop_shuffle()
}

/// Strategy for generating per-job failure flags
pub fn failure_mask_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..40)
}
