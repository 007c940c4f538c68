pub mod model;
pub mod sample;
pub mod tagger;
pub mod trainer;
pub mod trellis;
