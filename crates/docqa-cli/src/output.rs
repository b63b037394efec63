//! Rendering of search results and ingestion reports.

use docqa_core::{cosine_similarity_from_distance, DocumentOutcome, IngestReport, SearchHit};
use serde::Serialize;

/// Characters of the best passage quoted in a chat answer.
const SNIPPET_CHARS: usize = 300;

pub const NO_CONTEXT: &str = "I couldn't find any relevant context in the indexed documents. \
     Please make sure documents were loaded and contain text.";

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    results: Vec<JsonHit<'a>>,
}

/// A hit with its cosine similarity alongside the raw L2 distance.
#[derive(Serialize)]
struct JsonHit<'a> {
    text: &'a str,
    distance: f32,
    similarity: f32,
}

pub fn format_json(query: &str, hits: &[SearchHit]) -> serde_json::Result<String> {
    let results = hits
        .iter()
        .map(|hit| JsonHit {
            text: &hit.text,
            distance: hit.distance,
            similarity: cosine_similarity_from_distance(hit.distance),
        })
        .collect();
    serde_json::to_string_pretty(&JsonOutput { query, results })
}

pub fn format_human(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results for {query:?}.");
    }
    let mut out = format!("Results for {query:?}:\n");
    out.push_str(&format_context(hits));
    out
}

/// Numbered passages with their distances, as shown under an answer.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "\nChunk {} (Distance: {:.4}):\n{}\n",
                i + 1,
                hit.distance,
                hit.text
            )
        })
        .collect()
}

/// Answer text: the closest passage, quoted and cut to a short snippet.
pub fn format_answer(hits: &[SearchHit]) -> String {
    match hits.first() {
        None => NO_CONTEXT.to_string(),
        Some(best) => {
            let snippet: String = best.text.chars().take(SNIPPET_CHARS).collect();
            format!("Based on the semantic search, here is the most relevant snippet:\n\n> {snippet}...")
        }
    }
}

/// One line per document that added nothing, then a summary line. Goes to stderr.
pub fn print_report(report: &IngestReport) {
    for doc in report.problems() {
        let reason = match &doc.outcome {
            DocumentOutcome::Empty => "no text could be extracted".to_string(),
            DocumentOutcome::ExtractFailed(e) => e.to_string(),
            DocumentOutcome::StoreFailed(e) => e.to_string(),
            DocumentOutcome::Indexed { .. } => continue,
        };
        eprintln!("warning: {}: {}", doc.path.display(), reason);
    }
    eprintln!(
        "Indexed {} of {} documents ({} chunks).",
        report.indexed(),
        report.documents.len(),
        report.total_chunks()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str, distance: f32) -> SearchHit {
        SearchHit {
            text: text.to_string(),
            distance,
        }
    }

    #[test]
    fn answer_quotes_best_snippet() {
        let long = "é".repeat(400);
        let answer = format_answer(&[hit(&long, 0.1), hit("other", 0.5)]);
        assert!(answer.starts_with("Based on the semantic search"));
        assert!(answer.ends_with("..."));
        assert_eq!(answer.matches('é').count(), SNIPPET_CHARS);
    }

    #[test]
    fn answer_without_hits() {
        assert_eq!(format_answer(&[]), NO_CONTEXT);
    }

    #[test]
    fn context_lists_distances() {
        let ctx = format_context(&[hit("the cat sat", 0.91894), hit("the dog ran", 1.41421)]);
        assert!(ctx.contains("Chunk 1 (Distance: 0.9189):\nthe cat sat"));
        assert!(ctx.contains("Chunk 2 (Distance: 1.4142):\nthe dog ran"));
    }

    #[test]
    fn json_has_query_and_results() {
        let json = format_json("cat", &[hit("the cat sat", 0.5)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "cat");
        assert_eq!(value["results"][0]["text"], "the cat sat");
        assert_eq!(value["results"][0]["distance"], 0.5);
        assert_eq!(value["results"][0]["similarity"], 0.875);
    }

    #[test]
    fn human_output_for_no_results() {
        assert_eq!(format_human("cat", &[]), "No results for \"cat\".");
    }
}
