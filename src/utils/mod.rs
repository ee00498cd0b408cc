pub mod bicep;
pub mod error;
pub mod labels;
pub mod logging;
