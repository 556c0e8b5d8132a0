pub mod data_source;
pub mod github_api;
pub mod github_config;
pub mod rate_limit;
pub mod report_store;
pub mod timeline_builder;
pub mod timeline_plot;
