pub mod decoder;
pub mod encoder;
pub mod resample;
pub mod segmenter;
pub mod trim;
