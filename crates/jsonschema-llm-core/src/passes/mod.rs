//! The converter's fixed pipeline of tree-rewriting passes (spec.md §4.3).
//!
//! Passes run in the numbered order below; each may rewrite the node,
//! append transforms to the codec being built, and append dropped
//! constraints. Order fixes the semantic compose of multiple passes and is
//! not incidental — see spec.md §9 "Open questions" for which pass pairs
//! commute.

pub mod p0_normalize;
pub mod p1_resolve_ref;
pub mod p2_flatten_allof;
pub mod p3_polymorphism;
pub mod p6_strict;
pub mod p7_constraints;
pub mod p8_max_depth;
pub mod p9_provider_compat;
