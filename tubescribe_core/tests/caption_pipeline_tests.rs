use tubescribe_core::connectors::youtube::captions::CaptionCatalog;
use tubescribe_core::connectors::youtube::timed_text::{
    format_timestamp, format_timestamp_fixed, parse_timestamp, parse_vtt, serialize_vtt,
};

#[test]
fn catalog_parses_manual_and_automatic_sections() {
    let listing = "\
[info] Available subtitles for dQw4w9WgXcQ:
Language formats
en    English    vtt, srt

[info] Available automatic captions for dQw4w9WgXcQ:
Language Name
en-US   English (auto)
";

    let catalog = CaptionCatalog::parse(listing, "en");
    assert!(catalog.has_match);
    assert!(catalog.available_languages.contains(&"en".to_string()));
    assert!(catalog.available_languages.contains(&"en-US".to_string()));
}

#[test]
fn catalog_with_neither_section_is_empty() {
    let catalog = CaptionCatalog::parse("nothing to see here\n", "en");
    assert!(!catalog.has_match);
    assert!(catalog.available_languages.is_empty());
}

#[test]
fn timestamp_round_trip_is_stable_on_the_numeric_domain() {
    for input in ["00:00:00.000", "00:07:33.250", "01:00:00.000", "12:34:56.789"] {
        let ms = parse_timestamp(input);
        assert_eq!(parse_timestamp(&format_timestamp_fixed(ms)), ms);
    }
}

#[test]
fn display_timestamp_omits_hours_iff_below_one_hour() {
    assert_eq!(format_timestamp(3_599_999).len(), "59:59.999".len());
    assert!(format_timestamp(3_600_000).starts_with("01:"));
    assert_eq!(format_timestamp(3_600_000), "01:00:00.000");
}

#[test]
fn single_cue_payload_parses_to_one_cue() {
    let cues = parse_vtt("WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello world\n\n");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_ms, 1_000);
    assert_eq!(cues[0].end_ms, 3_500);
    assert_eq!(cues[0].duration_ms, 2_500);
    assert!(cues[0].text.contains("Hello world"));
}

#[test]
fn payload_without_timings_is_an_empty_transcript() {
    assert!(parse_vtt("WEBVTT\nKind: captions\nLanguage: en\n\n").is_empty());
}

#[test]
fn serialization_is_idempotent() {
    let payload = "\
WEBVTT

1
00:00:00.500 --> 00:00:02.000
line one
line two

2
01:02:03.000 --> 01:02:04.250
second cue
";

    let once = serialize_vtt(&parse_vtt(payload));
    let twice = serialize_vtt(&parse_vtt(&once));
    assert_eq!(once, twice);
    assert_eq!(parse_vtt(&once), parse_vtt(&twice));
}
