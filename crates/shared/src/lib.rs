pub mod domain;
pub mod error;
pub mod inspection;
pub mod protocol;
