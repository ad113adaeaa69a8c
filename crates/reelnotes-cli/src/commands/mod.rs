pub mod config;
pub mod movies;
pub mod review;
pub mod serve;
