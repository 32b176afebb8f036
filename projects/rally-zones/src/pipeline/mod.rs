// Trajectory scoring and placement pipeline

pub mod analysis;
pub mod buckets;
pub mod court;
pub mod error;
pub mod export;
pub mod geometry;
pub mod landing;
pub mod live;
pub mod rules;
pub mod sampler;
pub mod scoring;
pub mod trajectory;
pub mod types;
pub mod zones;
