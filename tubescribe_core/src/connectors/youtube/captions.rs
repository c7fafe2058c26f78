// src/connectors/youtube/captions.rs
//
// Caption availability resolution and transcript extraction. The pipeline
// runs yt-dlp twice (list, then caption-only download), resolves the
// artifact the downloader actually produced, parses it, and folds every
// outcome into an `ExtractionResult` payload. Nothing in here surfaces as a
// protocol fault; the tool contract always receives a well-formed response.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::warn;

use super::timed_text::{parse_vtt, serialize_vtt, Cue};
use crate::utils::clean_html_entities;

const MANUAL_SECTION_HEADER: &str = "Available subtitles";
const AUTO_SECTION_HEADER: &str = "Available automatic captions";

/// The caption languages yt-dlp reports for a video, resolved against the
/// requested language. Produced once per extraction request; immutable.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptionCatalog {
    pub requested_language: String,
    pub has_match: bool,
    pub available_languages: Vec<String>,
}

impl CaptionCatalog {
    /// Parse `yt-dlp --list-subs` output into the set of available language
    /// codes.
    ///
    /// The listing carries up to two labeled sections, each a table
    /// terminated by a blank line. Manual-subtitle rows are only admitted
    /// when the language token is exactly two characters (bare ISO-639-1;
    /// region-tagged manual tracks are knowingly not admitted). The
    /// automatic-caption section accepts tokens of 2 to 5 characters, which
    /// covers region-tagged codes like "en-US". Duplicates and encounter
    /// order are preserved; the match is exact and case-sensitive.
    pub fn parse(listing: &str, requested: &str) -> Self {
        let mut available: Vec<String> = Vec::new();
        let mut in_manual = false;
        let mut in_auto = false;

        for line in listing.lines() {
            if line.contains(MANUAL_SECTION_HEADER) {
                in_manual = true;
                in_auto = false;
                continue;
            }
            if line.contains(AUTO_SECTION_HEADER) {
                in_auto = true;
                in_manual = false;
                continue;
            }

            if line.trim().is_empty() {
                in_manual = false;
                in_auto = false;
                continue;
            }

            if in_manual {
                if let Some(token) = line.split_whitespace().next() {
                    if token.len() == 2 {
                        available.push(token.to_string());
                    }
                }
            } else if in_auto {
                if let Some(token) = line.split_whitespace().next() {
                    if (2..=5).contains(&token.len()) {
                        available.push(token.to_string());
                    }
                }
            }
        }

        let has_match = available.iter().any(|lang| lang == requested);

        CaptionCatalog {
            requested_language: requested.to_string(),
            has_match,
            available_languages: available,
        }
    }

    /// Catalog for a video whose listing could not be obtained. Absence of
    /// captions is an expected outcome, not a failure.
    pub fn empty(requested: &str) -> Self {
        CaptionCatalog {
            requested_language: requested.to_string(),
            has_match: false,
            available_languages: Vec::new(),
        }
    }
}

/// A regenerated caption file offered back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SerializedArtifact {
    pub file_name: String,
    pub content: String,
}

/// Outcome of one extraction request. Serialized as the tool response
/// payload; every failure mode lands in `reason`/`message` rather than in a
/// thrown fault.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionResult {
    Unavailable {
        requested_language: String,
        available_languages: Vec<String>,
        message: String,
    },
    Available {
        requested_language: String,
        transcript: Vec<Cue>,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        regenerated: Option<SerializedArtifact>,
    },
    Failed {
        reason: String,
    },
}

impl ExtractionResult {
    fn unavailable(catalog: CaptionCatalog) -> Self {
        let message = if catalog.available_languages.is_empty() {
            format!(
                "No auto-generated captions exist for this video in '{}' (no caption tracks were listed).",
                catalog.requested_language
            )
        } else {
            format!(
                "No auto-generated captions exist for this video in '{}'. Available languages: {}.",
                catalog.requested_language,
                catalog.available_languages.join(", ")
            )
        };

        ExtractionResult::Unavailable {
            requested_language: catalog.requested_language,
            available_languages: catalog.available_languages,
            message,
        }
    }

    fn available(video_id: &str, language: &str, cues: Vec<Cue>, save_to_file: bool) -> Self {
        let regenerated = save_to_file.then(|| SerializedArtifact {
            file_name: format!("{}_{}.vtt", video_id, language),
            content: serialize_vtt(&cues),
        });

        let text = clean_html_entities(
            &cues
                .iter()
                .map(|cue| cue.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        );

        // Cue text is accumulated with a trailing space during parsing; the
        // response boundary is where it gets trimmed.
        let transcript = cues
            .into_iter()
            .map(|cue| Cue {
                text: cue.text.trim().to_string(),
                ..cue
            })
            .collect();

        ExtractionResult::Available {
            requested_language: language.to_string(),
            transcript,
            text,
            regenerated,
        }
    }
}

/// Pipeline failures past the availability check. Recovered into
/// `ExtractionResult::Failed` by the orchestrator, never propagated.
#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("download reported success but no caption file was found under {base}")]
    ArtifactMissing { base: PathBuf },

    #[error("failed to read caption artifact: {0}")]
    Io(#[from] std::io::Error),
}

fn ytdlp_bin() -> String {
    std::env::var("TUBESCRIBE_YTDLP").unwrap_or_else(|_| "yt-dlp".to_string())
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Unique scratch base path for one extraction call. The timestamp keeps
/// concurrent extractions of the same video from colliding.
fn temp_base(video_id: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "{}_{}",
        video_id,
        chrono::Utc::now().timestamp_millis()
    ))
}

async fn run_lister(url: &str) -> Result<String, ExtractError> {
    let bin = ytdlp_bin();
    let output = Command::new(&bin)
        .arg("--list-subs")
        .arg("--no-warnings")
        .arg(url)
        .output()
        .await
        .map_err(|source| ExtractError::Launch { tool: bin.clone(), source })?;

    if !output.status.success() {
        return Err(ExtractError::ToolFailed {
            tool: bin,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn run_downloader(url: &str, language: &str, base: &Path) -> Result<(), ExtractError> {
    let bin = ytdlp_bin();
    let output = Command::new(&bin)
        .arg("--skip-download")
        .arg("--write-sub")
        .arg("--write-auto-sub")
        .arg("--sub-lang")
        .arg(language)
        .arg("--sub-format")
        .arg("vtt")
        .arg("-o")
        .arg(base)
        .arg("--no-warnings")
        .arg(url)
        .output()
        .await
        .map_err(|source| ExtractError::Launch { tool: bin.clone(), source })?;

    // Exit code 0 is the only success signal consulted.
    if !output.status.success() {
        return Err(ExtractError::ToolFailed {
            tool: bin,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Locate the caption file the downloader produced.
///
/// The actual output extension depends on whether yt-dlp matched a manual or
/// automatic track and on its own language negotiation, so the candidates
/// are probed in priority order and the first existing non-empty file wins.
pub(crate) fn resolve_artifact(base: &Path, language: &str) -> Option<PathBuf> {
    let suffixes = [
        format!(".{}.vtt", language),
        ".en.vtt".to_string(),
        ".vtt".to_string(),
    ];

    for suffix in suffixes {
        let mut raw = base.as_os_str().to_os_string();
        raw.push(&suffix);
        let candidate = PathBuf::from(raw);

        let non_empty = std::fs::metadata(&candidate)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if non_empty {
            return Some(candidate);
        }
    }

    None
}

async fn download_and_parse(
    url: &str,
    video_id: &str,
    language: &str,
) -> Result<Vec<Cue>, ExtractError> {
    let base = temp_base(video_id);
    run_downloader(url, language, &base).await?;

    let artifact = resolve_artifact(&base, language)
        .ok_or_else(|| ExtractError::ArtifactMissing { base: base.clone() })?;

    let payload = tokio::fs::read_to_string(&artifact).await?;

    // The artifact is scratch space, not a cache. Deletion is best-effort:
    // an orphan after a crash is an acceptable degraded outcome.
    if let Err(e) = tokio::fs::remove_file(&artifact).await {
        warn!(path = %artifact.display(), error = %e, "failed to remove caption artifact");
    }

    Ok(parse_vtt(&payload))
}

/// Run the full extraction pipeline for one video.
///
/// Availability checking cannot fail: a lister error collapses to an empty
/// catalog and reports `Unavailable`. Every later failure (downloader exit,
/// missing artifact, read error) becomes `Failed { reason }`.
pub async fn extract_transcript(
    video_id: &str,
    language: &str,
    save_to_file: bool,
) -> ExtractionResult {
    let url = watch_url(video_id);

    let catalog = match run_lister(&url).await {
        Ok(listing) => CaptionCatalog::parse(&listing, language),
        Err(e) => {
            warn!(video_id, error = %e, "caption listing failed");
            CaptionCatalog::empty(language)
        }
    };

    if !catalog.has_match {
        return ExtractionResult::unavailable(catalog);
    }

    match download_and_parse(&url, video_id, language).await {
        Ok(cues) => ExtractionResult::available(video_id, language, cues, save_to_file),
        Err(e) => ExtractionResult::Failed {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH_SECTIONS: &str = "\
[info] Available subtitles for dQw4w9WgXcQ:
Language formats
en    English    vtt, srt

[info] Available automatic captions for dQw4w9WgXcQ:
Language Name
en-US   English (auto)
de      German (auto)
";

    #[test]
    fn catalog_reads_both_sections() {
        let catalog = CaptionCatalog::parse(BOTH_SECTIONS, "en");
        assert!(catalog.has_match);
        assert_eq!(catalog.available_languages, vec!["en", "en-US", "de"]);
    }

    #[test]
    fn catalog_without_sections_is_empty() {
        let catalog = CaptionCatalog::parse("ERROR: video unavailable\n", "en");
        assert!(!catalog.has_match);
        assert!(catalog.available_languages.is_empty());
    }

    #[test]
    fn manual_section_only_admits_two_char_codes() {
        let listing = "\
Available subtitles:
en-US  English (United States)  vtt
fr     French                   vtt, srt
";
        let catalog = CaptionCatalog::parse(listing, "en-US");
        // Region-tagged manual tracks are knowingly not admitted.
        assert!(!catalog.has_match);
        assert_eq!(catalog.available_languages, vec!["fr"]);
    }

    #[test]
    fn blank_line_terminates_a_section() {
        let listing = "\
Available automatic captions:
en  English (auto)

fr  this line is outside any section
";
        let catalog = CaptionCatalog::parse(listing, "fr");
        assert!(!catalog.has_match);
        assert_eq!(catalog.available_languages, vec!["en"]);
    }

    #[test]
    fn catalog_match_is_case_sensitive_and_duplicates_survive() {
        let listing = "\
Available automatic captions:
en  English (auto)
en  English (auto)
";
        let catalog = CaptionCatalog::parse(listing, "EN");
        assert!(!catalog.has_match);
        assert_eq!(catalog.available_languages, vec!["en", "en"]);
    }

    #[test]
    fn unavailable_result_names_listed_languages() {
        let catalog = CaptionCatalog::parse(
            "Available automatic captions:\nen  English (auto)\n",
            "fr",
        );
        match ExtractionResult::unavailable(catalog) {
            ExtractionResult::Unavailable {
                requested_language,
                available_languages,
                message,
            } => {
                assert_eq!(requested_language, "fr");
                assert_eq!(available_languages, vec!["en"]);
                assert!(message.contains("No auto-generated captions"));
                assert!(message.contains("en"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[test]
    fn artifact_resolution_prefers_requested_language() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("vid_1");
        std::fs::write(dir.path().join("vid_1.de.vtt"), "WEBVTT\n").unwrap();
        std::fs::write(dir.path().join("vid_1.vtt"), "WEBVTT\n").unwrap();

        let resolved = resolve_artifact(&base, "de").unwrap();
        assert!(resolved.to_string_lossy().ends_with("vid_1.de.vtt"));
    }

    #[test]
    fn artifact_resolution_falls_back_to_bare_vtt() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("vid_2");
        std::fs::write(dir.path().join("vid_2.vtt"), "WEBVTT\n").unwrap();

        let resolved = resolve_artifact(&base, "en").unwrap();
        assert!(resolved.to_string_lossy().ends_with("vid_2.vtt"));
    }

    #[test]
    fn artifact_resolution_skips_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("vid_3");
        std::fs::write(dir.path().join("vid_3.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("vid_3.vtt"), "WEBVTT\n").unwrap();

        let resolved = resolve_artifact(&base, "en").unwrap();
        assert!(resolved.to_string_lossy().ends_with("vid_3.vtt"));
    }

    #[test]
    fn artifact_resolution_reports_nothing_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_artifact(&dir.path().join("vid_4"), "en").is_none());
    }

    #[test]
    fn available_result_trims_cue_text_and_regenerates_on_request() {
        let cues = parse_vtt("WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello\nworld\n\n");
        match ExtractionResult::available("abc123", "en", cues, true) {
            ExtractionResult::Available {
                transcript,
                text,
                regenerated,
                ..
            } => {
                assert_eq!(transcript[0].text, "Hello world");
                assert_eq!(text, "Hello world");
                let artifact = regenerated.expect("artifact requested");
                assert_eq!(artifact.file_name, "abc123_en.vtt");
                assert!(artifact.content.starts_with("WEBVTT\n\n1\n"));
            }
            other => panic!("expected Available, got {:?}", other),
        }
    }
}
