pub mod config;
pub mod error;
pub mod model;
pub mod naver;
pub mod reconcile;
pub mod store;
