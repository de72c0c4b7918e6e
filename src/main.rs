//! Resume matcher: score resumes against job descriptions and screen for ATS compatibility

use clap::Parser;
use log::{error, info, warn};
use resume_matcher::cli::{self, Cli, Commands, ConfigAction};
use resume_matcher::config::{Config, OutputFormat};
use resume_matcher::error::{Result, ResumeMatcherError};
use resume_matcher::input::manager::InputManager;
use resume_matcher::input::DocumentTextExtractor;
use resume_matcher::output::formatter::{report_path, save_report_to_file};
use resume_matcher::output::{BatchEntry, Output, ReportGenerator};
use resume_matcher::processing::embeddings::{Embedder, Model2VecEmbedder};
use resume_matcher::processing::pipeline::MatchEngine;
use resume_matcher::processing::skills::{OpenClassTagger, PartOfSpeechTagger, SkillStrategy};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Score {
            resume,
            job,
            job_text,
            embedding,
            fuzzy,
            detailed,
            output,
            save,
        } => {
            check_extension(&resume, cli::RESUME_EXTENSIONS, "Resume file")?;
            let format = output_format(output.as_deref(), &config)?;
            if fuzzy {
                config.skills.strategy = SkillStrategy::Fuzzy;
            }

            let mut input_manager = InputManager::new();
            let document = input_manager.load_document(&resume).await?;
            let (job_label, job_description) = match (job, job_text) {
                (Some(path), _) => {
                    check_extension(&path, cli::JOB_EXTENSIONS, "Job description file")?;
                    let extractor = DocumentTextExtractor::new(&config.extraction);
                    let text = input_manager.read_job_description(&path, &extractor).await?;
                    (path.display().to_string(), text)
                }
                (None, Some(text)) => ("inline".to_string(), text),
                (None, None) => return Err(ResumeMatcherError::MissingJobDescription),
            };

            let engine = Arc::new(build_engine(&config, embedding).await?);
            info!("Scoring {} against {}", resume.display(), job_label);

            let report = tokio::task::spawn_blocking(move || engine.evaluate(&document, &job_description))
                .await
                .map_err(join_error)??;

            let output = Output::Match {
                resume: resume.display().to_string(),
                job: job_label,
                report,
            };
            emit(&output, format, &config, detailed, save.as_deref())?;
        }

        Commands::Ats { resume, output, save } => {
            check_extension(&resume, cli::RESUME_EXTENSIONS, "Resume file")?;
            let format = output_format(output.as_deref(), &config)?;

            let document = InputManager::new().load_document(&resume).await?;
            let engine = MatchEngine::screening_only(&config, tagger())?;
            let report = tokio::task::spawn_blocking(move || engine.screen(&document))
                .await
                .map_err(join_error)?;

            let output = Output::Screening {
                resume: resume.display().to_string(),
                report,
            };
            emit(&output, format, &config, false, save.as_deref())?;
        }

        Commands::Recommend {
            resume,
            jobs,
            top,
            embedding,
            output,
            save,
        } => {
            check_extension(&resume, cli::RESUME_EXTENSIONS, "Resume file")?;
            let format = output_format(output.as_deref(), &config)?;

            let mut input_manager = InputManager::new();
            let document = input_manager.load_document(&resume).await?;
            let extractor = DocumentTextExtractor::new(&config.extraction);

            let mut job_texts = Vec::with_capacity(jobs.len());
            for path in &jobs {
                check_extension(path, cli::JOB_EXTENSIONS, "Job description file")?;
                job_texts.push(input_manager.read_job_description(path, &extractor).await?);
            }

            let engine = Arc::new(build_engine(&config, embedding).await?);
            let recommendations = tokio::task::spawn_blocking(move || {
                let extraction = engine.extract(&document);
                if extraction.is_failed() {
                    warn!("Resume text could not be extracted, ranking on job text alone");
                }
                engine.recommend_jobs(extraction.text(), &job_texts, top)
            })
            .await
            .map_err(join_error)??;

            let output = Output::Recommendations {
                resume: resume.display().to_string(),
                jobs: jobs.iter().map(|p| p.display().to_string()).collect(),
                recommendations,
            };
            emit(&output, format, &config, false, save.as_deref())?;
        }

        Commands::Batch {
            job,
            resumes,
            embedding,
            output,
            save,
        } => {
            check_extension(&job, cli::JOB_EXTENSIONS, "Job description file")?;
            let format = output_format(output.as_deref(), &config)?;

            let mut input_manager = InputManager::new();
            let extractor = DocumentTextExtractor::new(&config.extraction);
            let job_description = Arc::new(input_manager.read_job_description(&job, &extractor).await?);
            let engine = Arc::new(build_engine(&config, embedding).await?);

            info!("Scoring {} resumes against {}", resumes.len(), job.display());
            let results = score_batch(&engine, &input_manager, &resumes, job_description).await;

            let output = Output::Batch {
                job: job.display().to_string(),
                results,
            };
            emit(&output, format, &config, false, save.as_deref())?;
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration ({})\n", Config::config_path().display());
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| ResumeMatcherError::Configuration(e.to_string()))?;
                println!("{}", rendered);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save()?;
                println!("✅ Configuration reset successfully!");
            }
        },
    }

    Ok(())
}

/// One blocking task per resume; results come back in input order
async fn score_batch(
    engine: &Arc<MatchEngine>,
    input_manager: &InputManager,
    resumes: &[PathBuf],
    job_description: Arc<String>,
) -> Vec<BatchEntry> {
    let mut handles = Vec::with_capacity(resumes.len());

    for path in resumes {
        let label = path.display().to_string();
        let loaded = match cli::validate_file_extension(path, cli::RESUME_EXTENSIONS) {
            Ok(()) => input_manager.load_document(path).await,
            Err(e) => Err(ResumeMatcherError::InvalidInput(e)),
        };

        let handle = loaded.map(|document| {
            let engine = Arc::clone(engine);
            let job_description = Arc::clone(&job_description);
            tokio::task::spawn_blocking(move || engine.evaluate(&document, &job_description))
        });
        handles.push((label, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (resume, handle) in handles {
        let outcome = match handle {
            Ok(task) => task.await.map_err(join_error).and_then(|report| report),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => results.push(BatchEntry {
                resume,
                report: Some(report),
                error: None,
            }),
            Err(e) => {
                warn!("Skipping {}: {}", resume, e);
                results.push(BatchEntry {
                    resume,
                    report: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    results
}

async fn build_engine(config: &Config, embedding: Option<String>) -> Result<MatchEngine> {
    let model = embedding.unwrap_or_else(|| config.models.embedding_model.clone());
    println!("🧠 Loading embedding model: {}", model);

    // Loading may download from the hub
    let embedder = tokio::task::spawn_blocking(move || Model2VecEmbedder::load(&model))
        .await
        .map_err(join_error)??;
    let embedder: Arc<dyn Embedder> = Arc::new(embedder);

    MatchEngine::new(config, embedder, tagger())
}

fn tagger() -> Arc<dyn PartOfSpeechTagger> {
    Arc::new(OpenClassTagger)
}

fn emit(
    output: &Output,
    format: OutputFormat,
    config: &Config,
    detailed: bool,
    save: Option<&Path>,
) -> Result<()> {
    let generator = ReportGenerator::with_options(
        config.output.color_output && save.is_none(),
        detailed || config.output.detailed,
        true,
        true,
    );
    let rendered = generator.generate(output, format)?;

    match save {
        Some(target) => {
            let path = report_path(target, output, format);
            save_report_to_file(&rendered, &path)?;
            println!("💾 Report saved to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn output_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(ResumeMatcherError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn check_extension(path: &Path, allowed: &[&str], what: &str) -> Result<()> {
    cli::validate_file_extension(path, allowed)
        .map_err(|e| ResumeMatcherError::UnsupportedFormat(format!("{}: {}", what, e)))
}

fn join_error(e: tokio::task::JoinError) -> ResumeMatcherError {
    ResumeMatcherError::Processing(format!("Background task failed: {}", e))
}
