pub mod envelope;
pub mod gas;
pub mod location;
pub mod pollution;
pub mod reports;
pub mod us_states;
