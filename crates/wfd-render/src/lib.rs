pub mod hit;
pub mod paint;

pub use hit::{HitTarget, find_snap_target, hit_test};
