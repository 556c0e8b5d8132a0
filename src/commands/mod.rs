pub mod base_commands;
pub mod fetch_timeline_cmd;
pub mod plot_timeline_cmd;
