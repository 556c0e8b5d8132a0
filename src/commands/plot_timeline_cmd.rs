use crate::commands::base_commands::Commands;
use crate::services::timeline_plot::{TimelinePlotError, plot_timeline_from_json_file};

pub fn plot_timeline_command(cmd: Commands) -> Result<(), TimelinePlotError> {
    if let Commands::PlotTimeline { input, output } = cmd {
        plot_timeline_from_json_file(&input, &output)?;
        println!("Timeline plot written to {output}");
    }
    Ok(())
}
