pub mod db;
pub mod providers;
pub mod redis;
