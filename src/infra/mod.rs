pub mod cache;
pub mod delimited;
pub mod omdb;
