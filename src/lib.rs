//! Mixamo to OpenSim/Second Life rig conversion library.
//!
//! Takes a skeleton authored under the Mixamo naming/parenting convention and
//! reconciles it with the OpenSim/Bento skeleton: bone renaming, hierarchy
//! repair against the canonical parent table, vertex-weight redistribution,
//! and rest-pose offset application.

pub mod convert;
