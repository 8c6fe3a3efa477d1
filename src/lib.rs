pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod photos;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use sea_orm;
