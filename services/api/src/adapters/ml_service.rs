//! services/api/src/adapters/ml_service.rs
//!
//! This module contains the adapter for the external ML service. A single
//! `MlServiceAdapter` implements the question generation, scoring, resume
//! parsing and audio analysis ports over HTTP.

use async_trait::async_trait;
use bytes::Bytes;
use interview_core::domain::{AudioAnalysis, Evaluation, GeneratedQuestion, ParsedResume, ScoreRequest};
use interview_core::ports::{
    AudioAnalysisService, PortError, PortResult, QuestionGenerationService, ResumeParsingService,
    ScoringService,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ml_schema::{
    self, AnalyzeAudioResponseV1, GenerateQuestionsRequestV1, GenerateQuestionsResponseV1,
    ParseResumeResponseV1, ScoreAnswerRequestV1, ScoreAnswerResponseV1, SCHEMA_VERSION,
    SCHEMA_VERSION_HEADER,
};

/// An adapter that talks to the ML service's `v1` HTTP API.
#[derive(Clone, Debug)]
pub struct MlServiceAdapter {
    client: Client,
    base_url: String,
}

impl MlServiceAdapter {
    /// Creates a new `MlServiceAdapter`.
    ///
    /// The client is expected to carry the request timeout; it is shared with
    /// the rest of the service.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header(SCHEMA_VERSION_HEADER, SCHEMA_VERSION)
    }

    /// Sends the request and decodes a JSON body. Transport failures and non-2xx
    /// statuses are `Unavailable`; undecodable bodies are `InvalidResponse`.
    async fn send_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> PortResult<T> {
        let response = request.send().await.map_err(|e| {
            warn!("ML service request to /{} failed: {}", endpoint, e);
            PortError::Unavailable(format!("ML service unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("ML service /{} returned {}: {}", endpoint, status, body);
            return Err(PortError::Unavailable(format!(
                "ML service /{} returned {}",
                endpoint, status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            warn!("ML service /{} returned an unreadable body: {}", endpoint, e);
            PortError::InvalidResponse(format!("Malformed /{} response: {}", endpoint, e))
        })
    }

    fn file_part(filename: &str, mime_type: Option<&str>, content: Bytes) -> PortResult<Part> {
        let part = Part::bytes(content.to_vec()).file_name(filename.to_string());
        match mime_type {
            Some(mime) => part
                .mime_str(mime)
                .map_err(|e| PortError::InvalidInput(format!("Invalid mime type '{}': {}", mime, e))),
            None => Ok(part),
        }
    }
}

#[async_trait]
impl QuestionGenerationService for MlServiceAdapter {
    async fn generate_questions(&self, resume_text: &str, topics: &[String]) -> PortResult<Vec<GeneratedQuestion>> {
        let body = GenerateQuestionsRequestV1 { resume_text, topics };
        let request = self.post("generate_questions").json(&body);
        let response: GenerateQuestionsResponseV1 = self.send_json("generate_questions", request).await?;

        let questions = ml_schema::validate_generated(response);
        debug!("ML service generated {} questions", questions.len());
        Ok(questions)
    }
}

#[async_trait]
impl ScoringService for MlServiceAdapter {
    async fn score_answer(&self, score_request: &ScoreRequest) -> PortResult<Evaluation> {
        let body = ScoreAnswerRequestV1::from(score_request);
        let request = self.post("score_answer").json(&body);
        let response: ScoreAnswerResponseV1 = self.send_json("score_answer", request).await?;

        ml_schema::validate_score(response).map_err(|e| {
            warn!("Rejected score response: {}", e);
            PortError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl ResumeParsingService for MlServiceAdapter {
    async fn parse_resume(&self, filename: &str, content: Bytes) -> PortResult<ParsedResume> {
        let form = Form::new().part("file", Self::file_part(filename, None, content)?);
        let request = self.post("parse_resume").multipart(form);
        let response: ParseResumeResponseV1 = self.send_json("parse_resume", request).await?;
        Ok(ml_schema::validate_resume(response))
    }
}

#[async_trait]
impl AudioAnalysisService for MlServiceAdapter {
    async fn analyze_audio(&self, filename: &str, mime_type: &str, content: Bytes) -> PortResult<AudioAnalysis> {
        let form = Form::new().part("file", Self::file_part(filename, Some(mime_type), content)?);
        let request = self.post("analyze_audio").multipart(form);
        let response: AnalyzeAudioResponseV1 = self.send_json("analyze_audio", request).await?;
        Ok(ml_schema::validate_audio(response))
    }
}
