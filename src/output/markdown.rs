//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of the harvest
//! files: collection sizes, failure breakdown and field coverage.

use crate::output::stats::HarvestStatistics;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Context printed at the top of the summary
#[derive(Debug, Clone, Default)]
pub struct SummaryContext {
    /// When the summary was generated (RFC 3339)
    pub generated_at: String,

    /// SHA-256 of the configuration file, when one was used
    pub config_hash: Option<String>,
}

/// Generates a markdown summary from harvest statistics
///
/// # Arguments
///
/// * `stats` - The harvest statistics
/// * `context` - Generation time and configuration hash
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    stats: &HarvestStatistics,
    context: &SummaryContext,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats, context);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats harvest statistics as markdown
pub fn format_markdown_summary(stats: &HarvestStatistics, context: &SummaryContext) -> String {
    let mut md = String::new();

    md.push_str("# Programme Harvest Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Generated**: {}\n", context.generated_at));
    if let Some(hash) = &context.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if let Some(last) = &stats.last_scraped_at {
        md.push_str(&format!("- **Last Page Scraped**: {}\n", last));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Collection | Count |\n");
    md.push_str("|------------|-------|\n");
    md.push_str(&format!("| Listings discovered | {} |\n", stats.listings));
    md.push_str(&format!("| Programmes extracted | {} |\n", stats.successes));
    md.push_str(&format!("| Failed URLs | {} |\n", stats.failures));
    md.push_str(&format!("| Never attempted | {} |\n\n", stats.never_attempted));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        stats.success_rate()
    ));
    md.push_str(&format!("- **Remaining**: {}\n\n", stats.remaining()));

    if !stats.failures_by_error.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| Error | Count |\n");
        md.push_str("|-------|-------|\n");
        for (error, count) in &stats.failures_by_error {
            md.push_str(&format!("| {} | {} |\n", escape_cell(error), count));
        }
        md.push_str("\nRun with `--retry-failures` to re-queue these URLs.\n\n");
    }

    if !stats.programmes_by_degree.is_empty() {
        md.push_str("## Programmes by Degree\n\n");
        md.push_str("| Degree | Count |\n");
        md.push_str("|--------|-------|\n");
        for (degree, count) in &stats.programmes_by_degree {
            md.push_str(&format!("| {} | {} |\n", escape_cell(degree), count));
        }
        md.push('\n');
    }

    md.push_str("## Field Coverage\n\n");
    md.push_str(&format!(
        "- **With application deadlines**: {}\n",
        stats.with_application_deadlines
    ));
    md.push_str(&format!("- **With contacts**: {}\n", stats.with_contacts));

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
