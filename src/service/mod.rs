pub mod background_jobs;
pub mod error;
pub mod geocoding;
pub mod guard;
pub mod map_feed;
pub mod pagination;
pub mod session;
pub mod submission;
pub mod verification_service;
