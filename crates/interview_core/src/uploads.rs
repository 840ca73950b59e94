//! crates/interview_core/src/uploads.rs
//!
//! Intake for uploaded resumes and recorded voice answers.

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AudioAnalysis, NewVoiceUpload, ResumeProfile};
use crate::ports::{
    AudioAnalysisService, BlobStorageService, DatabaseService, PortError, PortResult,
    ResumeParsingService,
};

/// Audio mimetypes accepted for voice answers.
pub const ALLOWED_AUDIO_MIME_TYPES: [&str; 5] =
    ["audio/wav", "audio/mpeg", "audio/mp3", "audio/webm", "audio/ogg"];

/// Default per-file size cap (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Storage prefix for recorded answers.
const VOICE_PREFIX: &str = "answers";

//=========================================================================================
// Resume Intake
//=========================================================================================

#[derive(Clone)]
pub struct ResumeIntake {
    db: Arc<dyn DatabaseService>,
    parser: Arc<dyn ResumeParsingService>,
}

impl ResumeIntake {
    pub fn new(db: Arc<dyn DatabaseService>, parser: Arc<dyn ResumeParsingService>) -> Self {
        Self { db, parser }
    }

    /// Parses the file through the ML service and stores the resulting profile.
    pub async fn upload(&self, user_id: Uuid, filename: &str, content: Bytes) -> PortResult<ResumeProfile> {
        if content.is_empty() {
            return Err(PortError::InvalidInput("No file uploaded".to_string()));
        }
        let parsed = self.parser.parse_resume(filename, content).await?;
        let profile = self
            .db
            .create_resume_profile(user_id, &parsed.extracted_text, &parsed.skills)
            .await?;
        info!("Stored resume profile {} ({} skills)", profile.id, profile.parsed_skills.len());
        Ok(profile)
    }
}

//=========================================================================================
// Voice Intake
//=========================================================================================

#[derive(Debug, Clone)]
pub struct VoiceFile {
    pub original_name: String,
    pub mime_type: String,
    pub content: Bytes,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct VoiceUploadOutcome {
    pub filename: String,
    pub storage_path: String,
    pub public_url: String,
    /// Absent when the upload could not be logged.
    pub upload_id: Option<Uuid>,
    pub analysis: Option<AudioAnalysis>,
}

#[derive(Clone)]
pub struct VoiceIntake {
    db: Arc<dyn DatabaseService>,
    blobs: Arc<dyn BlobStorageService>,
    analyzer: Arc<dyn AudioAnalysisService>,
    max_bytes: usize,
}

impl VoiceIntake {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        blobs: Arc<dyn BlobStorageService>,
        analyzer: Arc<dyn AudioAnalysisService>,
        max_bytes: usize,
    ) -> Self {
        Self {
            db,
            blobs,
            analyzer,
            max_bytes,
        }
    }

    /// Stores the recording. Only validation and the blob upload can fail;
    /// logging the row and audio analysis are best-effort.
    pub async fn upload(&self, file: VoiceFile) -> PortResult<VoiceUploadOutcome> {
        validate_audio(&file.mime_type, file.content.len(), self.max_bytes)?;

        let filename = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            storage_safe_name(&file.original_name)
        );
        let storage_path = format!("{}/{}", VOICE_PREFIX, filename);
        let size = file.content.len() as i64;

        let public_url = self
            .blobs
            .upload(&storage_path, file.content.clone(), &file.mime_type)
            .await?;
        info!("Stored voice answer at {}", storage_path);

        let upload_id = match self
            .db
            .create_voice_upload(NewVoiceUpload {
                session_id: file.session_id,
                filename: filename.clone(),
                storage_path: storage_path.clone(),
                public_url: public_url.clone(),
                file_size_bytes: size,
                mime_type: file.mime_type.clone(),
            })
            .await
        {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!("Failed to log voice upload {}: {:?}", storage_path, e);
                None
            }
        };

        let analysis = match self
            .analyzer
            .analyze_audio(&filename, &file.mime_type, file.content)
            .await
        {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("Audio analysis failed for {}: {:?}", storage_path, e);
                None
            }
        };

        Ok(VoiceUploadOutcome {
            filename,
            storage_path,
            public_url,
            upload_id,
            analysis,
        })
    }
}

pub fn validate_audio(mime_type: &str, size: usize, max_bytes: usize) -> PortResult<()> {
    if !ALLOWED_AUDIO_MIME_TYPES.contains(&mime_type) {
        return Err(PortError::InvalidInput(
            "Invalid file type. Only audio files are allowed.".to_string(),
        ));
    }
    if size == 0 {
        return Err(PortError::InvalidInput("No audio file uploaded".to_string()));
    }
    if size > max_bytes {
        return Err(PortError::InvalidInput(format!(
            "Audio file exceeds the {} byte limit",
            max_bytes
        )));
    }
    Ok(())
}

/// Reduces a client-supplied file name to a single safe path segment.
fn storage_safe_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "recording".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_validation_enforces_allowlist_and_size() {
        assert!(validate_audio("audio/webm", 10, 100).is_ok());
        assert!(matches!(validate_audio("video/mp4", 10, 100), Err(PortError::InvalidInput(_))));
        assert!(matches!(validate_audio("audio/ogg", 101, 100), Err(PortError::InvalidInput(_))));
        assert!(matches!(validate_audio("audio/ogg", 0, 100), Err(PortError::InvalidInput(_))));
    }

    #[test]
    fn storage_names_cannot_escape_their_prefix() {
        assert_eq!(storage_safe_name("../../etc/passwd"), "passwd");
        assert_eq!(storage_safe_name("my answer (1).webm"), "my_answer__1_.webm");
        assert_eq!(storage_safe_name("..."), "recording");
        assert_eq!(storage_safe_name(""), "recording");
    }
}
