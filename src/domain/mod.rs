pub mod record;
pub mod repository;
pub mod timeline;
