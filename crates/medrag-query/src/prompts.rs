//! Prompt templates and context rendering.

use medrag_graph::enrich::GRAPH_SCHEMA;
use serde_json::{json, Value};

use crate::retrieve::RetrievedDoc;

/// Render retrieved docs as numbered context chunks for a prompt.
pub fn render_context(docs: &[RetrievedDoc]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let abstract_text = doc.payload["paper"]["abstract"].as_str().unwrap_or_default();
            format!(
                "[{n}] PMID: {pmid}\nTitle: {title}\nAbstract: {abstract_text}",
                n = i + 1,
                pmid = doc.pmid,
                title = doc.title,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compact source summaries returned to the API caller alongside the
/// answer.
pub fn source_summaries(docs: &[RetrievedDoc]) -> Vec<Value> {
    docs.iter()
        .map(|doc| {
            let paper = &doc.payload["paper"];
            let authors: Vec<&str> = paper["authors"]
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|a| a["name"].as_str())
                        .take(3)
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "pmid": doc.pmid,
                "title": doc.title,
                "score": doc.score,
                "journal": paper["journal"],
                "publication_date": paper["publication_date"],
                "authors": authors,
            })
        })
        .collect()
}

/// Tool-selection prompt for the enrichment phase.
pub fn hybrid_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a biomedical research assistant with access to a knowledge \
         graph built from PubMed papers.\n\n\
         Graph schema: {GRAPH_SCHEMA}\n\n\
         The user asked: {question}\n\n\
         Retrieved papers:\n{context}\n\n\
         Decide which of the available graph tools, if any, would surface \
         relationships that the retrieved text alone cannot answer. Call \
         every tool that is relevant; call none if the text is sufficient."
    )
}

/// Fusion prompt combining vector context with enrichment results.
pub fn fusion_prompt(question: &str, context: &str, enrichment: &Value) -> String {
    format!(
        "You are a biomedical research assistant. Answer the question using \
         the retrieved papers and the knowledge-graph results below. Cite \
         papers by PMID where relevant. If the evidence is insufficient, \
         say so rather than speculating.\n\n\
         Question: {question}\n\n\
         Retrieved papers:\n{context}\n\n\
         Knowledge-graph results:\n{enrichment}\n\n\
         Answer:"
    )
}

/// Retrieval-only generation prompt (no graph phase).
pub fn vector_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a biomedical research assistant. Answer the question using \
         only the retrieved papers below. Cite papers by PMID where \
         relevant. If the papers do not contain the answer, say so.\n\n\
         Question: {question}\n\n\
         Retrieved papers:\n{context}\n\n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pmid: &str, title: &str, score: f32) -> RetrievedDoc {
        RetrievedDoc {
            pmid: pmid.into(),
            title: title.into(),
            score,
            payload: json!({
                "paper": {
                    "pmid": pmid,
                    "title": title,
                    "abstract": "Findings.",
                    "journal": "Nature",
                    "publication_date": "2023-01-01",
                    "authors": [
                        {"name": "A One"}, {"name": "B Two"},
                        {"name": "C Three"}, {"name": "D Four"}
                    ],
                }
            }),
        }
    }

    #[test]
    fn context_chunks_are_numbered_and_carry_abstracts() {
        let context = render_context(&[doc("1", "First", 0.9), doc("2", "Second", 0.8)]);
        assert!(context.contains("[1] PMID: 1"));
        assert!(context.contains("[2] PMID: 2"));
        assert!(context.contains("Abstract: Findings."));
    }

    #[test]
    fn source_summaries_cap_authors_at_three() {
        let sources = source_summaries(&[doc("1", "First", 0.9)]);
        assert_eq!(sources[0]["authors"], json!(["A One", "B Two", "C Three"]));
        assert_eq!(sources[0]["journal"], json!("Nature"));
    }

    #[test]
    fn prompts_embed_question_and_context() {
        let prompt = hybrid_prompt("what genes?", "CTX");
        assert!(prompt.contains("what genes?"));
        assert!(prompt.contains("CTX"));
        assert!(prompt.contains("MENTIONED_IN"));

        let fused = fusion_prompt("q", "ctx", &json!({"op": []}));
        assert!(fused.contains("Knowledge-graph results"));
    }
}
