pub mod generator;
pub mod normalizer;
pub mod rules;
pub mod subject;
