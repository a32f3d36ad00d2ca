//! Selection file codec.
//!
//! Rows look like `0,recording_01.wav,"[0.512, 1.034, 1.2]"`. The first line
//! is a header. Each float is one click's begin time.

use regex::Regex;
use std::fmt::Write as _;
use std::path::Path;
use tracing::warn;

use super::Selection;

const HEADER: &str = "index,filename,seconds";

fn row_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r#"^(\d+),([^,]+),"\[(.*)\]"$"#)
}

/// File name without its extension.
fn audio_id(filename: &str) -> String {
    Path::new(filename.trim())
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.trim().to_string())
}

/// Parses a selection file into markers for `group_id`. End times are
/// `begin + epsilon`. Malformed rows are skipped with a warning.
pub fn parse_selection_file(
    text: &str,
    group_id: &str,
    epsilon: f64,
) -> Result<Vec<Selection>, regex::Error> {
    let pattern = row_pattern()?;
    let mut selections = Vec::new();

    for (line_no, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(caps) = pattern.captures(line) else {
            warn!(line = line_no + 1, "skipping malformed selection row");
            continue;
        };
        let index = &caps[1];
        let filename = caps[2].trim().to_string();
        let audio = audio_id(&filename);

        for (n, raw) in caps[3].split(',').map(str::trim).filter(|s| !s.is_empty()).enumerate() {
            match raw.parse::<f64>() {
                Ok(begin) if begin.is_finite() => selections.push(Selection {
                    id: format!("{group_id}-{index}-{n}"),
                    begin_time: begin,
                    end_time: begin + epsilon,
                    source_group_id: group_id.to_string(),
                    audio_id: Some(audio.clone()),
                    source_file: Some(filename.clone()),
                }),
                _ => warn!(line = line_no + 1, value = raw, "skipping non-numeric click time"),
            }
        }
    }
    Ok(selections)
}

/// Writes selections back out in the same row format, one row per file in
/// first-seen order. The row's file name is the selection's `source_file`;
/// without one it is `{audio_id}.wav`, then `default_filename`.
pub fn format_selection_file(selections: &[Selection], default_filename: &str) -> String {
    let mut rows: Vec<(String, Vec<f64>)> = Vec::new();
    for s in selections {
        let name = match (&s.source_file, &s.audio_id) {
            (Some(file), _) => file.clone(),
            (None, Some(id)) => format!("{id}.wav"),
            (None, None) => default_filename.to_string(),
        };
        match rows.iter_mut().find(|(n, _)| *n == name) {
            Some((_, times)) => times.push(s.begin_time),
            None => rows.push((name, vec![s.begin_time])),
        }
    }

    let mut out = String::from(HEADER);
    out.push('\n');
    for (index, (name, times)) in rows.iter().enumerate() {
        let joined = times
            .iter()
            .map(|t| format!("{t}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "{index},{name},\"[{joined}]\"");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_header() {
        let text = "index,filename,seconds\n\
                    0,whale_a.wav,\"[0.5, 1.25]\"\n\
                    \n\
                    garbage line\n\
                    1,whale_b.flac,\"[3.0]\"\n";
        let sels = parse_selection_file(text, "truth", 0.01).unwrap();
        assert_eq!(sels.len(), 3);
        assert_eq!(sels[0].id, "truth-0-0");
        assert_eq!(sels[0].audio_id.as_deref(), Some("whale_a"));
        assert!((sels[1].end_time - 1.26).abs() < 1e-9);
        assert_eq!(sels[2].audio_id.as_deref(), Some("whale_b"));
    }

    #[test]
    fn empty_click_list_yields_nothing() {
        let text = "header\n0,a.wav,\"[]\"\n";
        assert!(parse_selection_file(text, "g", 0.01).unwrap().is_empty());
    }

    #[test]
    fn file_names_survive_a_round_trip() {
        let text = "index,filename,seconds\n\
                    0,whale_a.wav,\"[0.5]\"\n\
                    1,whale_b.flac,\"[3, 4.5]\"\n";
        let sels = parse_selection_file(text, "truth", 0.01).unwrap();
        assert_eq!(sels[1].source_file.as_deref(), Some("whale_b.flac"));
        assert_eq!(
            format_selection_file(&sels, "fallback.wav"),
            "index,filename,seconds\n0,whale_a.wav,\"[0.5]\"\n1,whale_b.flac,\"[3, 4.5]\"\n"
        );
    }

    #[test]
    fn written_file_parses_back() {
        let sels = parse_selection_file("h\n0,rec.wav,\"[1.5, 2.5]\"\n", "g", 0.01).unwrap();
        let text = format_selection_file(&sels, "fallback.wav");
        assert_eq!(text, "index,filename,seconds\n0,rec.wav,\"[1.5, 2.5]\"\n");
    }
}
