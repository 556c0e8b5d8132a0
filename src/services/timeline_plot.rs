use crate::domain::timeline::DataPoint;
use crate::services::report_store::deserialize_report_from_json_str;
use plotters::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelinePlotError {
    #[error("failed to read timeline file: {0}")]
    ReadTimeline(#[from] std::io::Error),
    #[error("failed to parse timeline json: {0}")]
    ParseTimeline(#[from] serde_json::Error),
    #[error("timeline is empty")]
    EmptyTimeline,
    #[error("failed to render timeline plot: {0}")]
    Plot(String),
}

pub fn plot_timeline_from_json_file(input_path: &str, output_path: &str) -> Result<(), TimelinePlotError> {
    let json = std::fs::read_to_string(input_path)?;
    let report = deserialize_report_from_json_str(&json)?;
    let points = completed_days(&report.timeline);
    if points.is_empty() {
        return Err(TimelinePlotError::EmptyTimeline);
    }
    render_plot_png(output_path, points)
}

/// Today is still in progress, so its counts are left off the chart unless
/// it is the only day there is.
fn completed_days(timeline: &[DataPoint]) -> &[DataPoint] {
    match timeline.len() {
        0 | 1 => timeline,
        len => &timeline[..len - 1],
    }
}

fn render_plot_png(output_path: &str, timeline: &[DataPoint]) -> Result<(), TimelinePlotError> {
    let max_open = timeline
        .iter()
        .map(|point| point.open_issues.max(point.open_prs))
        .max()
        .unwrap_or(0);
    let max_y = count_to_axis(max_open.saturating_add(1).max(1));
    let max_x = timeline.len().max(2) as i32 - 1;

    let root = BitMapBackend::new(output_path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Open Issues and Pull Requests", ("sans-serif", 30))
        .x_label_area_size(55)
        .y_label_area_size(65)
        .build_cartesian_2d(0..max_x, 0..max_y)
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?;

    let label_count = timeline.len().clamp(1, 10);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Date")
        .y_desc("Open")
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 22))
        .x_labels(label_count)
        .x_label_formatter(&|index| {
            usize::try_from(*index)
                .ok()
                .and_then(|idx| timeline.get(idx))
                .map(|point| point.day.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?;

    let issue_color = RGBColor(30, 122, 204);
    chart
        .draw_series(LineSeries::new(
            timeline
                .iter()
                .enumerate()
                .map(|(idx, point)| (idx as i32, count_to_axis(point.open_issues))),
            issue_color.stroke_width(2),
        ))
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?
        .label("Issues")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], issue_color.stroke_width(2)));

    let pr_color = RGBColor(230, 126, 34);
    chart
        .draw_series(LineSeries::new(
            timeline
                .iter()
                .enumerate()
                .map(|(idx, point)| (idx as i32, count_to_axis(point.open_prs))),
            pr_color.stroke_width(2),
        ))
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?
        .label("PRs")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], pr_color.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?;

    root.present()
        .map_err(|e| TimelinePlotError::Plot(e.to_string()))?;
    Ok(())
}

fn count_to_axis(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::on_date;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    const TIMELINE_JSON: &str = r#"{
  "timeline": [
    { "day": "2026-01-26T00:00:00Z", "open_issues": 2, "closed_issues": 0, "open_prs": 1, "closed:prs": 0 },
    { "day": "2026-01-27T00:00:00Z", "open_issues": 3, "closed_issues": 0, "open_prs": 0, "closed:prs": 0 },
    { "day": "2026-01-28T00:00:00Z", "open_issues": 1, "closed_issues": 0, "open_prs": 2, "closed:prs": 0 }
  ]
}"#;

    #[test]
    fn plot_timeline_from_json_file_writes_png() {
        let input_file = assert_fs::NamedTempFile::new("timeline.json").unwrap();
        input_file.write_str(TIMELINE_JSON).unwrap();
        let output_file = assert_fs::NamedTempFile::new("timeline.png").unwrap();

        plot_timeline_from_json_file(
            input_file.path().to_str().unwrap(),
            output_file.path().to_str().unwrap(),
        )
        .unwrap();

        output_file.assert(predicate::path::exists());
        let metadata = std::fs::metadata(output_file.path()).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn plot_timeline_from_json_file_rejects_empty_data() {
        let input_file = assert_fs::NamedTempFile::new("empty.json").unwrap();
        input_file.write_str(r#"{"timeline": []}"#).unwrap();
        let output_file = assert_fs::NamedTempFile::new("empty.png").unwrap();

        let error = plot_timeline_from_json_file(
            input_file.path().to_str().unwrap(),
            output_file.path().to_str().unwrap(),
        )
        .expect_err("expected empty timeline error");

        assert!(matches!(error, TimelinePlotError::EmptyTimeline));
    }

    #[test]
    fn oversized_counts_saturate_on_the_axis() {
        assert_eq!(count_to_axis(42), 42);
        assert_eq!(count_to_axis(usize::MAX), i32::MAX);
    }

    #[test]
    fn today_is_left_off_the_chart() {
        let timeline = vec![
            DataPoint::empty(on_date(2026, 1, 26)),
            DataPoint::empty(on_date(2026, 1, 27)),
        ];
        assert_eq!(completed_days(&timeline).len(), 1);
        assert_eq!(completed_days(&timeline[..1]).len(), 1);
    }
}
