pub mod core;
pub mod error;
pub mod io;
pub mod position;
pub mod random_walk;
pub mod seeds;
pub mod stats;
