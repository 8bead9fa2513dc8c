// src/summarize/citations.rs
//! Splice verified source links from grounding metadata into a plain-text
//! report.
//!
//! The report is split into numbered sections (`N. title` at line start, with
//! optional `*` or `#` marks before the number).
//! Each grounding support is attributed to the section containing its
//! segment: by byte range when the range is valid and matches the segment
//! text, otherwise by searching the segment text. Per section, the first
//! attributed support whose chunk list resolves to a web chunk with a uri
//! supplies the source. A sourced section loses any `출처:` lines it already
//! had and gains exactly one `출처: [title](uri)` line right before its
//! `키워드:` line (or after its last non-blank line when there is none).
//! Sections without a source are copied byte for byte.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::summarize::prompt::{KEYWORD_LABEL, SOURCE_LABEL};
use crate::summarize::{GroundingChunk, GroundingMetadata, Segment};

const FALLBACK_TITLE: &str = "기사 원문";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub number: usize,
    /// Byte range in the report, heading line included.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

impl Citation {
    pub fn markdown(&self) -> String {
        format!("[{}]({})", self.title, self.uri)
    }
}

fn heading_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // tolerates markdown emphasis or heading marks before the number
    RE.get_or_init(|| Regex::new(r"^[ \t]*(?:[*#]+[ \t]*)?(\d{1,2})\.\s").unwrap())
}

/// Numbered sections in document order.
pub fn sections(text: &str) -> Vec<Section> {
    let mut starts: Vec<(usize, usize)> = Vec::new();
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        if let Some(n) = heading_re()
            .captures(line)
            .and_then(|c| c[1].parse::<usize>().ok())
        {
            starts.push((n, offset));
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &(number, start))| Section {
            number,
            start,
            end: starts.get(i + 1).map(|s| s.1).unwrap_or(text.len()),
        })
        .collect()
}

fn segment_position(seg: &Segment, text: &str) -> Option<usize> {
    let seg_text = seg.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let by_range = seg.end_index.and_then(|end| {
        let start = seg.start_index.unwrap_or(0);
        let slice = text.get(start..end)?;
        match seg_text {
            Some(t) if slice.trim() != t => None,
            // attribute by the first visible byte, not leading whitespace
            _ => Some(start + (slice.len() - slice.trim_start().len())),
        }
    });

    by_range.or_else(|| text.find(seg_text?))
}

fn web_citation(chunk: &GroundingChunk) -> Option<Citation> {
    let web = chunk.web.as_ref()?;
    let uri = web.uri.as_deref()?.trim();
    if uri.is_empty() {
        return None;
    }
    let title = web
        .title
        .as_deref()
        .map(|t| t.trim().replace('[', "(").replace(']', ")"))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());
    Some(Citation {
        title,
        uri: uri.replace(' ', "%20").replace(')', "%29"),
    })
}

/// Source chosen for each section (same order as `sections(text)`).
pub fn resolve_sources(
    text: &str,
    secs: &[Section],
    grounding: &GroundingMetadata,
) -> Vec<Option<Citation>> {
    let mut chosen: Vec<Option<Citation>> = vec![None; secs.len()];

    for support in &grounding.grounding_supports {
        let Some(seg) = support.segment.as_ref() else {
            continue;
        };
        let Some(pos) = segment_position(seg, text) else {
            continue;
        };
        let Some(idx) = secs.iter().position(|s| pos >= s.start && pos < s.end) else {
            continue;
        };
        if chosen[idx].is_some() {
            continue;
        }
        chosen[idx] = support
            .grounding_chunk_indices
            .iter()
            .find_map(|&ci| grounding.grounding_chunks.get(ci).and_then(web_citation));
    }
    chosen
}

fn rewrite_section(body: &str, cite: &Citation) -> String {
    let lines: Vec<&str> = body
        .split_inclusive('\n')
        .filter(|l| !l.trim_start().starts_with(SOURCE_LABEL))
        .collect();

    let link = format!("{SOURCE_LABEL} {}", cite.markdown());
    let insert_at = lines
        .iter()
        .position(|l| l.trim_start().starts_with(KEYWORD_LABEL))
        .unwrap_or_else(|| {
            lines
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .map(|i| i + 1)
                .unwrap_or(lines.len())
        });

    let mut out = String::with_capacity(body.len() + link.len() + 2);
    for (i, line) in lines.iter().enumerate() {
        if i == insert_at {
            out.push_str(&link);
            out.push('\n');
        }
        out.push_str(line);
    }
    if insert_at >= lines.len() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&link);
        if body.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Insert one citation per grounded section; leave the rest untouched.
pub fn splice_citations(text: &str, grounding: &GroundingMetadata) -> String {
    let secs = sections(text);
    if secs.is_empty() {
        return text.to_string();
    }
    let sources = resolve_sources(text, &secs, grounding);

    let mut out = String::with_capacity(text.len() + 256);
    out.push_str(&text[..secs[0].start]);
    for (sec, src) in secs.iter().zip(sources.iter()) {
        let body = &text[sec.start..sec.end];
        match src {
            Some(cite) => out.push_str(&rewrite_section(body, cite)),
            None => out.push_str(body),
        }
    }
    out
}
