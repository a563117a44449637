#[path = "property/allocation_bounds.rs"]
mod allocation_bounds;

#[path = "property/archive_invariants.rs"]
mod archive_invariants;

#[path = "property/signature_distance.rs"]
mod signature_distance;

#[path = "property/tier_assignment.rs"]
mod tier_assignment;
