//! HTTP Routes

pub mod export;
pub mod readings;
pub mod receive;
