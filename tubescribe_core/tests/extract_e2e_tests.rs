//! End-to-end extraction tests against a scripted stand-in for yt-dlp,
//! wired in through the TUBESCRIBE_YTDLP override.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tubescribe_core::connectors::youtube::captions::{extract_transcript, ExtractionResult};

fn write_fake_ytdlp(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("fake-yt-dlp");
    std::fs::write(
        &script,
        r#"#!/bin/sh
case "$1" in
  --list-subs)
    echo "[info] Available subtitles for vid123:"
    echo "en    English    vtt, srt"
    echo ""
    echo "[info] Available automatic captions for vid123:"
    echo "en-US   English (auto)"
    exit 0
    ;;
esac
base=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then base="$arg"; fi
  prev="$arg"
done
printf 'WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello world\n\n' > "$base.en.vtt"
exit 0
"#,
    )
    .unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    script
}

// One test function so the process-global TUBESCRIBE_YTDLP override is never
// raced by a parallel test.
#[tokio::test]
async fn extraction_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_fake_ytdlp(dir.path());
    std::env::set_var("TUBESCRIBE_YTDLP", &script);

    // Requesting a language the catalog does not list terminates the
    // pipeline before any download happens.
    match extract_transcript("vid123", "fr", false).await {
        ExtractionResult::Unavailable {
            requested_language,
            available_languages,
            message,
        } => {
            assert_eq!(requested_language, "fr");
            assert_eq!(available_languages, vec!["en", "en-US"]);
            assert!(message.contains("No auto-generated captions"));
            assert!(message.contains("en"));
        }
        other => panic!("expected Unavailable, got {:?}", other),
    }

    // A cataloged language drives download, artifact resolution, parsing,
    // and (on request) regeneration.
    match extract_transcript("vid123", "en", true).await {
        ExtractionResult::Available {
            requested_language,
            transcript,
            text,
            regenerated,
        } => {
            assert_eq!(requested_language, "en");
            assert_eq!(transcript.len(), 1);
            assert_eq!(transcript[0].start_ms, 1_000);
            assert_eq!(transcript[0].end_ms, 3_500);
            assert_eq!(transcript[0].duration_ms, 2_500);
            assert_eq!(transcript[0].text, "Hello world");
            assert_eq!(text, "Hello world");

            let artifact = regenerated.expect("artifact was requested");
            assert_eq!(artifact.file_name, "vid123_en.vtt");
            assert!(artifact.content.starts_with("WEBVTT\n\n"));
            assert!(artifact.content.contains("00:00:01.000 --> 00:00:03.500"));
        }
        other => panic!("expected Available, got {:?}", other),
    }

    // A lister that cannot run at all is an expected no-captions outcome,
    // not a failure.
    std::env::set_var("TUBESCRIBE_YTDLP", dir.path().join("does-not-exist"));
    match extract_transcript("vid123", "en", false).await {
        ExtractionResult::Unavailable {
            available_languages,
            ..
        } => assert!(available_languages.is_empty()),
        other => panic!("expected Unavailable, got {:?}", other),
    }

    std::env::remove_var("TUBESCRIBE_YTDLP");
}
