// src/connectors/youtube/timed_text.rs
//
// WebVTT cue parsing and regeneration, plus the timestamp codec both sides
// share. Everything here is a pure function; the extraction pipeline in
// `captions` owns the surrounding I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One timed text segment of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Cue {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub duration_ms: u64,
}

/// Parse a "HH:MM:SS.mmm" or "MM:SS.mmm" timestamp into milliseconds.
///
/// Lenient on purpose: a non-numeric field contributes 0 instead of failing,
/// so a single malformed timestamp never aborts a whole transcript.
pub fn parse_timestamp(raw: &str) -> u64 {
    let mut fields: Vec<&str> = raw.trim().split(':').collect();

    let seconds = fields
        .pop()
        .map(|f| f.trim().parse::<f64>().unwrap_or(0.0))
        .unwrap_or(0.0);
    let minutes = fields
        .pop()
        .map(|f| f.trim().parse::<u64>().unwrap_or(0))
        .unwrap_or(0);
    let hours = fields
        .pop()
        .map(|f| f.trim().parse::<u64>().unwrap_or(0))
        .unwrap_or(0);

    (hours * 3600 + minutes * 60) * 1000 + (seconds * 1000.0).round() as u64
}

/// Format milliseconds for human display: the hours field is omitted below
/// one hour, so `61_500` renders as "01:01.500" and `3_661_500` as
/// "01:01:01.500".
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    if hours == 0 {
        format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
    } else {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

/// Format milliseconds for cue files: always "HH:MM:SS.mmm".
///
/// Kept separate from [`format_timestamp`] rather than flag-switched so the
/// two formatting contracts stay independently testable.
pub fn format_timestamp_fixed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

const TIMING_SEPARATOR: &str = " --> ";

static CUE_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Parse a WebVTT payload into cues, in document order.
///
/// Single pass over the lines with at most one cue open at a time: a timing
/// line closes the previous cue before opening the next, and end of input
/// flushes the last one, so no cue ever escapes half-built. A payload with
/// no timing lines yields an empty transcript, not an error.
///
/// Cue text keeps the historical accumulation shape: source lines are joined
/// with single spaces and the final trailing space is left in place; callers
/// trim at their display boundary.
pub fn parse_vtt(payload: &str) -> Vec<Cue> {
    let mut cues: Vec<Cue> = Vec::new();
    let mut open: Option<Cue> = None;

    for line in payload.lines() {
        if let Some((start_raw, end_raw)) = line.split_once(TIMING_SEPARATOR) {
            if let Some(cue) = open.take() {
                cues.push(cue);
            }

            // Auto-caption timing lines carry cue settings after the end
            // timestamp ("... align:start position:0%"); only the first
            // token on each side is the timestamp.
            let start_ms = parse_timestamp(first_token(start_raw));
            let end_ms = parse_timestamp(first_token(end_raw)).max(start_ms);

            open = Some(Cue {
                text: String::new(),
                start_ms,
                end_ms,
                duration_ms: end_ms - start_ms,
            });
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "WEBVTT" || CUE_INDEX_RE.is_match(trimmed) {
            continue;
        }

        if let Some(cue) = open.as_mut() {
            cue.text.push_str(line);
            cue.text.push(' ');
        }
    }

    if let Some(cue) = open.take() {
        cues.push(cue);
    }

    cues
}

/// Regenerate a WebVTT payload from cues.
///
/// Best-effort reconstruction: multi-line source text was already flattened
/// by [`parse_vtt`], so serialize(parse(original)) need not match the
/// original byte-for-byte, but parse/serialize is a fixed point on its own
/// output.
pub fn serialize_vtt(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");

    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_timestamp_fixed(cue.start_ms),
            format_timestamp_fixed(cue.end_ms)
        ));
        out.push_str(cue.text.trim());
        out.push_str("\n\n");
    }

    out
}

fn first_token(raw: &str) -> &str {
    raw.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_full_and_short_forms() {
        assert_eq!(parse_timestamp("00:00:01.000"), 1_000);
        assert_eq!(parse_timestamp("01:02:03.500"), 3_723_500);
        assert_eq!(parse_timestamp("02:03.500"), 123_500);
        assert_eq!(parse_timestamp("5"), 5_000);
    }

    #[test]
    fn parse_timestamp_is_lenient_on_garbage() {
        assert_eq!(parse_timestamp("xx:yy:zz"), 0);
        assert_eq!(parse_timestamp("00:bad:01.000"), 1_000);
        assert_eq!(parse_timestamp(""), 0);
    }

    #[test]
    fn numeric_round_trip_through_fixed_width() {
        for ms in [0, 999, 1_000, 59_999, 61_500, 3_599_999, 3_600_000, 7_384_250] {
            assert_eq!(parse_timestamp(&format_timestamp_fixed(ms)), ms);
        }
    }

    #[test]
    fn display_format_omits_hours_below_one_hour() {
        assert_eq!(format_timestamp(3_599_999), "59:59.999");
        assert_eq!(format_timestamp(3_600_000), "01:00:00.000");
        assert_eq!(format_timestamp(61_500), "01:01.500");
        assert_eq!(format_timestamp_fixed(61_500), "00:01:01.500");
    }

    #[test]
    fn parse_vtt_single_cue() {
        let cues = parse_vtt("WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello world\n\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 1_000);
        assert_eq!(cues[0].end_ms, 3_500);
        assert_eq!(cues[0].duration_ms, 2_500);
        assert!(cues[0].text.contains("Hello world"));
    }

    #[test]
    fn parse_vtt_joins_multi_line_text_with_spaces() {
        let cues = parse_vtt("WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nfirst line\nsecond line\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "first line second line ");
    }

    #[test]
    fn parse_vtt_without_timing_lines_is_empty() {
        assert!(parse_vtt("WEBVTT\n\nKind: captions\nLanguage: en\n").is_empty());
        assert!(parse_vtt("").is_empty());
    }

    #[test]
    fn parse_vtt_flushes_last_cue_without_trailing_blank() {
        let cues = parse_vtt("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nfirst\n\n00:00:01.000 --> 00:00:02.000\nlast");
        assert_eq!(cues.len(), 2);
        assert!(cues[1].text.contains("last"));
    }

    #[test]
    fn parse_vtt_handles_cue_settings_after_end_timestamp() {
        let cues = parse_vtt("WEBVTT\n\n00:00:01.000 --> 00:00:03.000 align:start position:0%\nhey\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end_ms, 3_000);
    }

    #[test]
    fn serialize_uses_fixed_width_timestamps_and_indices() {
        let cues = vec![Cue {
            text: "Hello world ".to_string(),
            start_ms: 1_000,
            end_ms: 3_500,
            duration_ms: 2_500,
        }];
        let out = serialize_vtt(&cues);
        assert_eq!(
            out,
            "WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello world\n\n"
        );
    }

    #[test]
    fn serialize_then_parse_is_a_fixed_point() {
        let original = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:03.500\nHello\nworld\n\n2\n00:01:00.000 --> 01:02:03.000\nsecond cue\n\n";
        let once = parse_vtt(&serialize_vtt(&parse_vtt(original)));
        let twice = parse_vtt(&serialize_vtt(&once));
        assert_eq!(once, twice);
    }
}
