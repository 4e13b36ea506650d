mod resample;
mod segment;

pub use self::{resample::ResampleMean, segment::Segment};
