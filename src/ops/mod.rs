pub mod drag;
pub mod drop;
pub mod identity;
pub mod progress;
pub mod project_ops;
pub mod search;
pub mod tree;
pub mod wip;
