pub mod cleanup;
pub mod corrections;
pub mod fetcher;
pub mod merger;
pub mod pipeline;
