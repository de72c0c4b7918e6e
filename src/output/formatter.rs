//! Output formatters: colored console, JSON and markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::processing::ats_screener::AtsResult;
use crate::processing::pipeline::{JobRecommendation, PipelineReport, ScreeningReport};
use colored::{Color, Colorize};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Anything the CLI can print
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    Match {
        resume: String,
        job: String,
        report: PipelineReport,
    },
    Screening {
        resume: String,
        report: ScreeningReport,
    },
    Recommendations {
        resume: String,
        jobs: Vec<String>,
        recommendations: Vec<JobRecommendation>,
    },
    Batch {
        job: String,
        results: Vec<BatchEntry>,
    },
}

impl Output {
    /// File the report is about; names saved reports
    pub fn subject(&self) -> &str {
        match self {
            Output::Match { resume, .. }
            | Output::Screening { resume, .. }
            | Output::Recommendations { resume, .. } => resume,
            Output::Batch { job, .. } => job,
        }
    }
}

/// One resume's outcome in a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub resume: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PipelineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub trait OutputFormatter {
    fn format(&self, output: &Output) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f64) -> String {
        let (badge, color) = score_band(score);
        let color = match color {
            Band::Top => Color::Green,
            Band::High => Color::BrightGreen,
            Band::Mid => Color::Yellow,
            Band::Fair => Color::BrightYellow,
            Band::Low => Color::Red,
            Band::Bottom => Color::BrightRed,
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_ats(&self, ats: &AtsResult, missing_sections: &[String]) -> String {
        let mut output = String::new();
        let feedback_color = if ats.passed() { Color::Green } else { Color::Yellow };

        output.push_str(&format!("ATS Score: {:.2}% {}\n", ats.score, self.format_score_badge(ats.score)));
        output.push_str(&format!("Feedback: {}\n", self.colorize(&ats.feedback, feedback_color)));
        if !missing_sections.is_empty() {
            output.push_str(&format!(
                "Missing sections: {}\n",
                self.colorize(&missing_sections.join(", "), Color::Yellow)
            ));
        }
        output
    }

    fn format_pipeline(&self, report: &PipelineReport) -> String {
        let mut output = String::new();
        let result = &report.match_result;

        output.push_str(&self.format_header("Executive Summary", 2));
        output.push_str(&format!(
            "Match Score: {:.2}% {}\n",
            result.final_score,
            self.format_score_badge(result.final_score)
        ));
        output.push_str(&format!("Job Ranking: {:.2}%\n", report.job_ranking));

        output.push_str(&self.format_header("Score Breakdown", 3));
        output.push_str(&format!("🎯 Semantic similarity: {:.1}%\n", result.components.semantic * 100.0));
        output.push_str(&format!("🔍 Lexical similarity:  {:.1}%\n", result.components.lexical * 100.0));
        output.push_str(&format!("🧰 Skill overlap:       {:.1}%\n", result.components.skill_weight * 100.0));
        output.push_str(&format!("📅 Experience weight:   {:.1}%\n", result.components.experience_weight * 100.0));

        output.push_str(&self.format_header("Candidate Profile", 3));
        output.push_str(&format!("Experience: {} years\n", report.experience_years));
        if report.skills.is_empty() {
            output.push_str(&format!("Skills: {}\n", self.colorize("none detected", Color::BrightBlack)));
        } else {
            let skills: Vec<&str> = report.skills.iter().map(String::as_str).collect();
            output.push_str(&format!("Skills: {}\n", self.colorize(&skills.join(", "), Color::Cyan)));
        }

        output.push_str(&self.format_header("ATS Compatibility", 3));
        output.push_str(&self.format_ats(&report.ats, &report.missing_sections));

        if !report.extraction.succeeded {
            let reason = report.extraction.failure_reason.as_deref().unwrap_or("unknown error");
            output.push_str(&format!(
                "\n{} {}\n",
                self.colorize("⚠️  Text extraction failed:", Color::Red),
                reason
            ));
        }

        if self.detailed {
            output.push_str(&self.format_header("📊 Detailed Analysis", 2));
            if !report.keywords.is_empty() {
                output.push_str("Top keywords:\n");
                for keyword in &report.keywords {
                    output.push_str(&format!("  • {} ({})\n", keyword.term, keyword.count));
                }
            }
            if let Some(method) = report.extraction.method {
                output.push_str(&format!(
                    "Extraction: {:?}, {} characters\n",
                    method, report.extraction.characters
                ));
            }
            if !report.embedding_model.is_empty() {
                output.push_str(&format!("Embedding model: {}\n", report.embedding_model));
            }
            output.push_str(&format!("Processing time: {}ms\n", report.processing_time_ms));
        }

        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, output: &Output) -> Result<String> {
        let mut text = String::new();

        match output {
            Output::Match { resume, job, report } => {
                text.push_str(&self.format_header("📊 RESUME MATCH ANALYSIS", 1));
                text.push_str(&format!("Resume: {} | Job: {}\n", resume, job));
                text.push_str(&self.format_pipeline(report));
            }
            Output::Screening { resume, report } => {
                text.push_str(&self.format_header("📋 ATS SCREENING", 1));
                text.push_str(&format!("Resume: {}\n\n", resume));
                text.push_str(&self.format_ats(&report.ats, &report.missing_sections));
            }
            Output::Recommendations {
                resume,
                jobs,
                recommendations,
            } => {
                text.push_str(&self.format_header("🏆 JOB RECOMMENDATIONS", 1));
                text.push_str(&format!("Resume: {}\n\n", resume));
                for (rank, rec) in recommendations.iter().enumerate() {
                    let job = jobs.get(rec.index).map(String::as_str).unwrap_or("?");
                    text.push_str(&format!(
                        "{}. {} {:.2}% {} (ranking {:.2}%)\n",
                        rank + 1,
                        self.colorize(job, Color::White),
                        rec.match_result.final_score,
                        self.format_score_badge(rec.match_result.final_score),
                        rec.job_ranking
                    ));
                }
            }
            Output::Batch { job, results } => {
                text.push_str(&self.format_header("📚 BATCH RESULTS", 1));
                text.push_str(&format!("Job: {}\n\n", job));
                for entry in results {
                    match (&entry.report, &entry.error) {
                        (Some(report), _) => text.push_str(&format!(
                            "• {} {:.2}% {} | ATS {:.2}%\n",
                            entry.resume,
                            report.match_result.final_score,
                            self.format_score_badge(report.match_result.final_score),
                            report.ats.score
                        )),
                        (None, error) => text.push_str(&format!(
                            "• {} {}\n",
                            entry.resume,
                            self.colorize(error.as_deref().unwrap_or("failed"), Color::Red)
                        )),
                    }
                }
            }
        }

        Ok(text)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, output: &Output) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(output)?)
        } else {
            Ok(serde_json::to_string(output)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: f64) -> &'static str {
        match score_band(score).1 {
            Band::Top => "🟢 Excellent",
            Band::High => "🟡 Very Good",
            Band::Mid => "🟠 Good",
            Band::Fair => "🔴 Fair",
            Band::Low => "🔴 Below Average",
            Band::Bottom => "🔴 Poor",
        }
    }

    fn format_pipeline(report: &PipelineReport) -> String {
        let mut output = String::new();
        let result = &report.match_result;

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "**Match Score:** {:.2}% {}\n\n",
            result.final_score,
            Self::markdown_score_badge(result.final_score)
        ));
        output.push_str(&format!("**Job Ranking:** {:.2}%\n\n", report.job_ranking));

        output.push_str("## Score Breakdown\n\n");
        output.push_str("| Signal | Score |\n|---|---|\n");
        output.push_str(&format!("| Semantic similarity | {:.1}% |\n", result.components.semantic * 100.0));
        output.push_str(&format!("| Lexical similarity | {:.1}% |\n", result.components.lexical * 100.0));
        output.push_str(&format!("| Skill overlap | {:.1}% |\n", result.components.skill_weight * 100.0));
        output.push_str(&format!(
            "| Experience weight | {:.1}% |\n\n",
            result.components.experience_weight * 100.0
        ));

        output.push_str("## Candidate Profile\n\n");
        output.push_str(&format!("- **Experience:** {} years\n", report.experience_years));
        let skills: Vec<String> = report.skills.iter().map(|s| format!("`{}`", s)).collect();
        output.push_str(&format!(
            "- **Skills:** {}\n\n",
            if skills.is_empty() { "none detected".to_string() } else { skills.join(", ") }
        ));

        output.push_str(&Self::format_ats(&report.ats, &report.missing_sections));

        if !report.keywords.is_empty() {
            output.push_str("## Top Keywords\n\n");
            for keyword in &report.keywords {
                output.push_str(&format!("- {} ({})\n", keyword.term, keyword.count));
            }
            output.push('\n');
        }

        output
    }

    fn format_ats(ats: &AtsResult, missing_sections: &[String]) -> String {
        let mut output = String::new();
        output.push_str("## ATS Compatibility\n\n");
        output.push_str(&format!("**Score:** {:.2}%\n\n", ats.score));
        output.push_str(&format!("> {}\n\n", ats.feedback));
        if !missing_sections.is_empty() {
            output.push_str(&format!("**Missing sections:** {}\n\n", missing_sections.join(", ")));
        }
        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, output: &Output) -> Result<String> {
        let mut text = String::new();

        match output {
            Output::Match { resume, job, report } => {
                text.push_str("# 📊 Resume Match Report\n\n");
                if self.include_metadata {
                    text.push_str(&format!(
                        "**Generated:** {} | **Processing Time:** {}ms\n",
                        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                        report.processing_time_ms
                    ));
                    text.push_str(&format!("**Resume:** `{}` | **Job:** `{}`\n\n", file_label(resume), file_label(job)));
                }
                text.push_str(&Self::format_pipeline(report));
            }
            Output::Screening { resume, report } => {
                text.push_str("# 📋 ATS Screening Report\n\n");
                if self.include_metadata {
                    text.push_str(&format!("**Resume:** `{}`\n\n", file_label(resume)));
                }
                text.push_str(&Self::format_ats(&report.ats, &report.missing_sections));
            }
            Output::Recommendations {
                resume,
                jobs,
                recommendations,
            } => {
                text.push_str("# 🏆 Job Recommendations\n\n");
                if self.include_metadata {
                    text.push_str(&format!("**Resume:** `{}`\n\n", file_label(resume)));
                }
                text.push_str("| Rank | Job | Match | Ranking |\n|---|---|---|---|\n");
                for (rank, rec) in recommendations.iter().enumerate() {
                    let job = jobs.get(rec.index).map(|j| file_label(j)).unwrap_or_default();
                    text.push_str(&format!(
                        "| {} | `{}` | {:.2}% | {:.2}% |\n",
                        rank + 1,
                        job,
                        rec.match_result.final_score,
                        rec.job_ranking
                    ));
                }
            }
            Output::Batch { job, results } => {
                text.push_str("# 📚 Batch Results\n\n");
                if self.include_metadata {
                    text.push_str(&format!("**Job:** `{}`\n\n", file_label(job)));
                }
                text.push_str("| Resume | Match | ATS | Notes |\n|---|---|---|---|\n");
                for entry in results {
                    match &entry.report {
                        Some(report) => text.push_str(&format!(
                            "| `{}` | {:.2}% | {:.2}% | {} |\n",
                            file_label(&entry.resume),
                            report.match_result.final_score,
                            report.ats.score,
                            report.ats.feedback
                        )),
                        None => text.push_str(&format!(
                            "| `{}` | - | - | {} |\n",
                            file_label(&entry.resume),
                            entry.error.as_deref().unwrap_or("failed")
                        )),
                    }
                }
            }
        }

        Ok(text)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate(&self, output: &Output, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format(output),
            OutputFormat::Json => self.json_formatter.format(output),
            OutputFormat::Markdown => self.markdown_formatter.format(output),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum Band {
    Top,
    High,
    Mid,
    Fair,
    Low,
    Bottom,
}

fn score_band(score: f64) -> (&'static str, Band) {
    if score >= 90.0 {
        ("EXCELLENT", Band::Top)
    } else if score >= 80.0 {
        ("VERY GOOD", Band::High)
    } else if score >= 70.0 {
        ("GOOD", Band::Mid)
    } else if score >= 60.0 {
        ("FAIR", Band::Fair)
    } else if score >= 50.0 {
        ("BELOW AVG", Band::Low)
    } else {
        ("POOR", Band::Bottom)
    }
}

fn file_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Where to save a report: `target` itself, or a generated name inside it
/// when `target` is an existing directory
pub fn report_path(target: &Path, output: &Output, format: OutputFormat) -> PathBuf {
    if target.is_dir() {
        target.join(suggest_filename(format, output.subject(), true))
    } else {
        target.to_path_buf()
    }
}

pub fn suggest_filename(format: OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_match{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_match{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_match{}.md", base_name, timestamp_suffix),
    }
}
