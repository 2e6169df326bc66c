//! Persistence gateway: ownership scopes, row locks and ordered collections.

pub mod locks;
pub mod ordering;
pub mod scope;

pub use locks::{get_for_update, lock_for_update, lock_ids_in_order, Table};
pub use ordering::{
    decrement_indexes_after, increment_indexes_after, insert_position, max_index,
    status_counts, swap_by_index, IndexedCollection, Placement, StatusCounts,
};
pub use scope::{
    delete_scoped, find_scoped, push_filter, push_parent_filter, scoped, CyclePath,
    OwnershipScope, PlanPath, WorkoutExercisePath, WorkoutPath, WorkoutSetPath,
};
