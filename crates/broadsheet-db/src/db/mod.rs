//! Database access: pool bootstrap and repositories.

pub mod image;
pub mod pool;
