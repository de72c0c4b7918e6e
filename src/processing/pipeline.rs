//! Match engine tying extraction, skill/experience analysis, ATS screening and
//! similarity scoring into one straight-line pipeline

use crate::config::{Config, SkillConfig};
use crate::error::{Result, ResumeMatcherError};
use crate::input::document::Document;
use crate::input::text_extractor::{DocumentTextExtractor, Extraction, ExtractionMethod, ExtractionStatus};
use crate::processing::ats_screener::{AtsResult, AtsScreener};
use crate::processing::embeddings::Embedder;
use crate::processing::experience::ExperienceExtractor;
use crate::processing::similarity::{MatchResult, SimilarityScorer};
use crate::processing::skills::{PartOfSpeechTagger, SkillExtractor, SkillSet, SkillVocabulary};
use crate::processing::text_processor::TextProcessor;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_RECOMMENDATIONS: usize = 3;

/// Everything the pipeline learned about one resume against one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub extraction: ExtractionStatus,
    pub skills: SkillSet,
    pub experience_years: u32,
    pub ats: AtsResult,
    pub match_result: MatchResult,
    /// Semantic similarity as a percentage
    pub job_ranking: f64,
    pub keywords: Vec<Keyword>,
    pub missing_sections: Vec<String>,
    pub embedding_model: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub count: usize,
}

/// Outcome of the ATS-only path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub extraction: ExtractionStatus,
    pub ats: AtsResult,
    pub missing_sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecommendation {
    /// Position of the job in the caller's list
    pub index: usize,
    pub match_result: MatchResult,
    pub job_ranking: f64,
}

pub struct MatchEngine {
    extractor: DocumentTextExtractor,
    skills: SkillExtractor,
    experience: ExperienceExtractor,
    ats: AtsScreener,
    text_processor: TextProcessor,
    scorer: Option<SimilarityScorer>,
    embedding_model: String,
    keyword_count: usize,
}

impl MatchEngine {
    /// Build every stage once; the vocabulary comes from configuration
    pub fn new(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        tagger: Arc<dyn PartOfSpeechTagger>,
    ) -> Result<Self> {
        let vocabulary = Arc::new(load_vocabulary(&config.skills)?);
        Self::with_vocabulary(config, vocabulary, embedder, tagger)
    }

    pub fn with_vocabulary(
        config: &Config,
        vocabulary: Arc<SkillVocabulary>,
        embedder: Arc<dyn Embedder>,
        tagger: Arc<dyn PartOfSpeechTagger>,
    ) -> Result<Self> {
        let embedding_model = embedder.name().to_string();
        let scorer = SimilarityScorer::new(
            config.scoring.weights,
            config.scoring.experience_curve,
            embedder,
        )?;
        Self::build(config, vocabulary, tagger, Some(scorer), embedding_model)
    }

    /// Engine without an embedding model. Only [`MatchEngine::screen`] and
    /// extraction are usable; scoring calls fail with a model error.
    pub fn screening_only(config: &Config, tagger: Arc<dyn PartOfSpeechTagger>) -> Result<Self> {
        let vocabulary = Arc::new(load_vocabulary(&config.skills)?);
        Self::build(config, vocabulary, tagger, None, String::new())
    }

    fn build(
        config: &Config,
        vocabulary: Arc<SkillVocabulary>,
        tagger: Arc<dyn PartOfSpeechTagger>,
        scorer: Option<SimilarityScorer>,
        embedding_model: String,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            extractor: DocumentTextExtractor::new(&config.extraction),
            skills: SkillExtractor::new(vocabulary, &config.skills, tagger)?,
            experience: ExperienceExtractor::new(&config.experience)?,
            ats: AtsScreener::new(&config.ats)?,
            text_processor: TextProcessor::new(),
            scorer,
            embedding_model,
            keyword_count: config.output.keyword_count,
        })
    }

    pub fn extract(&self, document: &Document) -> Extraction {
        self.extractor.extract(document)
    }

    /// Full pipeline for a resume document. A blank job description is the
    /// only hard failure; unreadable documents still produce a report.
    pub fn evaluate(&self, document: &Document, job_description: &str) -> Result<PipelineReport> {
        ensure_job_description(job_description)?;

        let start_time = Instant::now();
        let extraction = self.extractor.extract(document);
        self.report(extraction.status(), extraction.text(), job_description, start_time)
    }

    /// Full pipeline for text that was already extracted
    pub fn evaluate_text(&self, resume_text: &str, job_description: &str) -> Result<PipelineReport> {
        ensure_job_description(job_description)?;

        let start_time = Instant::now();
        let status = Extraction::Extracted {
            text: resume_text.to_string(),
            method: ExtractionMethod::PlainText,
        }
        .status();
        self.report(status, resume_text, job_description, start_time)
    }

    fn report(
        &self,
        extraction: ExtractionStatus,
        resume_text: &str,
        job_description: &str,
        start_time: Instant,
    ) -> Result<PipelineReport> {
        let scorer = self.scorer()?;

        let skills = self.skills.extract(resume_text);
        let experience_years = self.experience.extract(resume_text);
        let ats = self.ats.screen(resume_text);

        let match_result = scorer.score(resume_text, job_description, &skills, experience_years)?;
        let job_ranking = match_result.semantic_rank();

        let keywords = self
            .text_processor
            .extract_keywords(resume_text, self.keyword_count)
            .into_iter()
            .map(|(term, count)| Keyword { term, count })
            .collect();

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Scored resume: {:.2}% match, ATS {:.2}, {} skills, {} years ({} ms)",
            match_result.final_score,
            ats.score,
            skills.len(),
            experience_years,
            processing_time_ms
        );

        Ok(PipelineReport {
            extraction,
            missing_sections: self.ats.missing_sections(resume_text),
            skills,
            experience_years,
            ats,
            match_result,
            job_ranking,
            keywords,
            embedding_model: self.embedding_model.clone(),
            processing_time_ms,
        })
    }

    /// ATS-only path; needs no embedding model
    pub fn screen(&self, document: &Document) -> ScreeningReport {
        let extraction = self.extractor.extract(document);
        let text = extraction.text();

        ScreeningReport {
            ats: self.ats.screen(text),
            missing_sections: self.ats.missing_sections(text),
            extraction: extraction.status(),
        }
    }

    /// Score one resume against several jobs and keep the best `top_n`.
    /// Equal scores keep the input order.
    pub fn recommend_jobs(
        &self,
        resume_text: &str,
        jobs: &[String],
        top_n: usize,
    ) -> Result<Vec<JobRecommendation>> {
        let scorer = self.scorer()?;
        let skills = self.skills.extract(resume_text);
        let years = self.experience.extract(resume_text);

        let mut recommendations = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            ensure_job_description(job)?;
            let match_result = scorer.score(resume_text, job, &skills, years)?;
            recommendations.push(JobRecommendation {
                index,
                job_ranking: match_result.semantic_rank(),
                match_result,
            });
        }

        recommendations.sort_by(|a, b| {
            b.match_result
                .final_score
                .total_cmp(&a.match_result.final_score)
        });
        recommendations.truncate(top_n);

        Ok(recommendations)
    }

    fn scorer(&self) -> Result<&SimilarityScorer> {
        self.scorer.as_ref().ok_or_else(|| {
            ResumeMatcherError::ModelLoading("No embedding model loaded for scoring".to_string())
        })
    }
}

fn load_vocabulary(config: &SkillConfig) -> Result<SkillVocabulary> {
    match &config.vocabulary_file {
        Some(path) => SkillVocabulary::from_file(path),
        None => Ok(SkillVocabulary::default()),
    }
}

fn ensure_job_description(job_description: &str) -> Result<()> {
    if job_description.trim().is_empty() {
        return Err(ResumeMatcherError::MissingJobDescription);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::document::DocumentFormat;
    use crate::input::text_extractor::tests::build_docx;
    use crate::processing::similarity::tests::HashingEmbedder;
    use crate::processing::skills::OpenClassTagger;
    use std::sync::atomic::Ordering;

    fn engine() -> MatchEngine {
        let mut config = Config::default();
        config.extraction.ocr_enabled = false;
        MatchEngine::new(&config, Arc::new(HashingEmbedder::new()), Arc::new(OpenClassTagger)).unwrap()
    }

    const RESUME: &str = "Jane Roe\nEmail: jane@example.com\n\
                          Education: Bachelor of Computer Science\n\
                          Experience: 5+ years of experience building data pipelines\n\
                          Skills: Python, SQL, Docker\n\
                          • Migrated reports to resume.pdf exports";

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MatchEngine>();
    }

    #[test]
    fn test_evaluate_text_full_report() {
        let report = engine()
            .evaluate_text(RESUME, "Python engineer with 3+ years and Docker")
            .unwrap();

        assert_eq!(report.experience_years, 5);
        assert!(report.skills.contains("python"));
        assert!(report.skills.contains("docker"));
        assert_eq!(report.ats.score, 100.0);
        assert_eq!(report.match_result.components.experience_weight, 1.0);
        assert!(report.match_result.final_score > 0.0);
        assert_eq!(report.missing_sections, vec!["projects"]);
        assert!(report.keywords.len() <= 10);
        assert_eq!(report.embedding_model, "hashing");
    }

    #[test]
    fn test_one_embedding_call_per_evaluation() {
        let embedder = Arc::new(HashingEmbedder::new());
        let mut config = Config::default();
        config.extraction.ocr_enabled = false;
        let engine = MatchEngine::new(&config, embedder.clone(), Arc::new(OpenClassTagger)).unwrap();

        let report = engine.evaluate_text(RESUME, "Python engineer").unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.job_ranking, report.match_result.semantic_rank());

        let jobs = vec!["Python engineer".to_string(), "Docker operator".to_string()];
        engine.recommend_jobs(RESUME, &jobs, 2).unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_blank_job_description_is_rejected() {
        let result = engine().evaluate_text(RESUME, "  \n ");
        assert!(matches!(result, Err(ResumeMatcherError::MissingJobDescription)));
    }

    #[test]
    fn test_failed_extraction_still_scores() {
        let doc = Document::new(b"not a docx".to_vec(), DocumentFormat::Docx);
        let report = engine().evaluate(&doc, "Python developer").unwrap();

        assert!(!report.extraction.succeeded);
        assert!(report.skills.is_empty());
        assert_eq!(report.experience_years, 0);
        assert_eq!(report.ats.score, 0.0);
        assert_eq!(report.match_result.final_score, 0.0);
    }

    #[test]
    fn test_evaluate_docx_document() {
        let bytes = build_docx(&["Skills: Kubernetes, Go", "Since 2015 in platform teams"]);
        let doc = Document::new(bytes, DocumentFormat::Docx);

        let report = engine().evaluate(&doc, "Platform engineer, kubernetes").unwrap();

        assert!(report.extraction.succeeded);
        assert!(report.skills.contains("kubernetes"));
        assert!(report.experience_years >= 9);
        assert_eq!(report.match_result.components.skill_weight, 1.0);
    }

    #[test]
    fn test_recommend_jobs_orders_by_score() {
        let jobs = vec![
            "Pastry chef for a busy bakery".to_string(),
            "Python data engineer with SQL and Docker".to_string(),
            "Docker platform engineer".to_string(),
            "Forklift operator".to_string(),
        ];

        let top = engine().recommend_jobs(RESUME, &jobs, DEFAULT_RECOMMENDATIONS).unwrap();

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].index, 1);
        assert!(top
            .windows(2)
            .all(|w| w[0].match_result.final_score >= w[1].match_result.final_score));
    }

    #[test]
    fn test_screening_only_engine() {
        let mut config = Config::default();
        config.extraction.ocr_enabled = false;
        let engine = MatchEngine::screening_only(&config, Arc::new(OpenClassTagger)).unwrap();

        let doc = Document::new(build_docx(&[RESUME]), DocumentFormat::Docx);
        let screening = engine.screen(&doc);
        assert!(screening.extraction.succeeded);
        assert!(screening.ats.score > 70.0);

        assert!(matches!(
            engine.evaluate_text(RESUME, "Python"),
            Err(ResumeMatcherError::ModelLoading(_))
        ));
    }
}
