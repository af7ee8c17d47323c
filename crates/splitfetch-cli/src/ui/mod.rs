mod tracker;

pub use tracker::ChunkBoard;
