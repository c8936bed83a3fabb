//! Markdown rendering of injected search payloads
//!
//! Search results are shown to the user as a numbered citation list; the
//! whole block is queued into the search channel in one piece so the pacer
//! never splits a citation line mid-read.

use jiff::Timestamp;

use crate::protocol::SearchResult;

/// Render a batch of search results as a markdown citation list
///
/// Each entry becomes `<marker> [title](url) <timestamp>` followed by the
/// snippet as a blockquote.
pub fn render_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(position, result)| {
            // A provider-assigned cite_index wins; otherwise the 1-based
            // position in this batch.
            let number = result.cite_index.unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX - 1) + 1);
            format!(
                "{} [{}]({}) {}\n> {}\n",
                citation_marker(number),
                result.title,
                result.url,
                format_timestamp(result.published_at),
                result.snippet,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Circled numeral for a citation number: ① through ⑳, then `(n)`
pub fn citation_marker(number: u32) -> String {
    match number {
        1..=20 => char::from_u32(0x2460 + number - 1).map_or_else(|| format!("({number})"), String::from),
        _ => format!("({number})"),
    }
}

/// Format an epoch-milliseconds timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
fn format_timestamp(epoch_ms: i64) -> String {
    Timestamp::from_millisecond(epoch_ms)
        .map_or_else(|_| epoch_ms.to_string(), |ts| ts.strftime("%Y-%m-%d %H:%M:%S").to_string())
}
