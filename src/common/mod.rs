pub mod response;
pub mod security;
