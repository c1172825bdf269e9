//! Wire types shared by every Palaver crate

pub mod embed;
pub mod message;
pub mod request;
pub mod response;
pub mod tool;
