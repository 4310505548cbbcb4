use super::grouping::value_counts;
use super::{ranked_entries, ChannelAnalyzer};
use crate::table::{self, columns};
use crate::utils::{format_count, format_grouped, percentage, title_case_label};

const RULE_WIDTH: usize = 80;
const SECTION_LIMIT: usize = 5;
const NO_DATA: &str = "No data available";

impl ChannelAnalyzer {
    /// Render the narrative analysis report.
    ///
    /// A section is left out entirely when the column it depends on is
    /// absent, and prints `No data available` when the column exists but
    /// has nothing to show.
    pub fn generate_report(&self) -> String {
        let df = self.df();
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut lines: Vec<String> = Vec::new();

        lines.push(heavy.clone());
        lines.push("YOUTUBE STATISTICS ANALYSIS REPORT".to_string());
        lines.push(heavy.clone());
        lines.push(String::new());

        lines.push("DATASET OVERVIEW".to_string());
        lines.push(light.clone());
        lines.push(format!("Total Channels: {}", format_count(df.height())));
        lines.push(format!("Features: {}", df.width()));
        lines.push(String::new());

        if table::has_column(df, columns::SUBSCRIBERS) {
            lines.push("TOP 5 CHANNELS BY SUBSCRIBERS".to_string());
            lines.push(light.clone());
            let entries = self
                .top_performers(columns::SUBSCRIBERS, SECTION_LIMIT)
                .map(|top| ranked_entries(&top, columns::SUBSCRIBERS))
                .unwrap_or_default();
            if entries.is_empty() {
                lines.push(NO_DATA.to_string());
            }
            for entry in entries {
                lines.push(format!(
                    "{:<30} {:>15} subscribers",
                    entry.youtuber.as_deref().unwrap_or("n/a"),
                    format_grouped(entry.value, 0)
                ));
            }
            lines.push(String::new());
        }

        if let Ok(column) = df.column(columns::CATEGORY) {
            lines.push("CATEGORY INSIGHTS".to_string());
            lines.push(light.clone());
            let counts = value_counts(column.as_materialized_series());
            if counts.is_empty() {
                lines.push(NO_DATA.to_string());
            } else {
                lines.push("Top 5 Categories by Channel Count:".to_string());
                for entry in counts.iter().take(SECTION_LIMIT) {
                    lines.push(format!(
                        "  {:<30} {:>5} channels",
                        entry.group,
                        format_count(entry.count)
                    ));
                }
            }
            lines.push(String::new());
        }

        let metrics = self.engagement_metrics();
        if !metrics.is_empty() {
            lines.push("ENGAGEMENT METRICS".to_string());
            lines.push(light.clone());
            for metric in metrics.iter() {
                lines.push(format!(
                    "{:<40} {:>15}",
                    title_case_label(&metric.name),
                    format_grouped(metric.value, 2)
                ));
            }
            lines.push(String::new());
        }

        if let Ok(column) = df.column(columns::COUNTRY) {
            lines.push("TOP 5 COUNTRIES".to_string());
            lines.push(light.clone());
            let counts = value_counts(column.as_materialized_series());
            if counts.is_empty() {
                lines.push(NO_DATA.to_string());
            }
            for entry in counts.iter().take(SECTION_LIMIT) {
                lines.push(format!(
                    "{:<30} {:>5} channels ({:.1}%)",
                    entry.group,
                    format_count(entry.count),
                    percentage(entry.count, df.height())
                ));
            }
            lines.push(String::new());
        }

        lines.push(heavy);
        lines.join("\n")
    }
}
