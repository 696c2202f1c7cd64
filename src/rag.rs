use crate::chunking::split_into_chunks;
use crate::embeddings::EmbeddingsClient;
use crate::groq::GroqClient;
use crate::loader::Document;
use crate::store::{ScoredChunk, VectorStore};
use anyhow::Result;
use log::{info, warn};
use std::fmt;
use std::io::{self, Write};

/// Chunks sent to the embeddings API per request.
const EMBED_BATCH: usize = 32;

/// The four fixed summary sections and their retrieval prompts.
const SUMMARY_SECTIONS: [(&str, &str); 4] = [
    ("Benefits", "Summarize the key benefits of the scheme."),
    (
        "Application Process",
        "Describe the application process for the scheme.",
    ),
    (
        "Eligibility",
        "What are the eligibility criteria for this scheme?",
    ),
    ("Required Documents", "List the documents required to apply."),
];

/// A generated answer with the sources that informed it
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Four-section scheme summary
#[derive(Debug, Clone)]
pub struct SchemeSummary {
    pub sections: Vec<(String, String)>,
}

impl fmt::Display for SchemeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, text) in &self.sections {
            writeln!(f, "=== {} ===", title)?;
            writeln!(f, "{}", text)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// RAG (Retrieval-Augmented Generation) engine over one named store
pub struct RagEngine {
    store: VectorStore,
    embeddings: EmbeddingsClient,
    groq: GroqClient,
    store_name: String,
    top_k: u64,
}

impl RagEngine {
    /// Create a new RAG engine
    pub fn new(
        store: VectorStore,
        embeddings: EmbeddingsClient,
        groq: GroqClient,
        store_name: String,
        top_k: u64,
    ) -> Self {
        RagEngine {
            store,
            embeddings,
            groq,
            store_name,
            top_k,
        }
    }

    /// Whether the store behind this engine has been ingested into before
    pub async fn store_exists(&self) -> Result<bool> {
        self.store.collection_exists(&self.store_name).await
    }

    /// Ingest one document: chunk it, embed the chunks, append to the store.
    /// Returns the number of chunks stored.
    pub async fn ingest(&self, document: Document) -> Result<usize> {
        let chunks = split_into_chunks(&document.content, &document.source);
        if chunks.is_empty() {
            warn!("No usable text in {}", document.source);
            return Ok(0);
        }
        info!(
            "Split {} (fetched {}) into {} chunks",
            document.source, document.fetched_at, chunks.len()
        );

        self.store.create_if_missing(&self.store_name).await?;

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let mut batch_embeddings = self.embeddings.embed_batch(&texts).await?;
            embeddings.append(&mut batch_embeddings);
        }

        let count = chunks.len();
        self.store.add(chunks, embeddings, &self.store_name).await?;

        Ok(count)
    }

    /// Retrieve the chunks nearest to a free-text query
    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embeddings.embed(query).await?;
        self.store
            .query(query_embedding, &self.store_name, self.top_k)
            .await
    }

    /// Answer a question about the ingested schemes
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let chunks = self.retrieve(question).await?;

        if chunks.is_empty() {
            return Ok(Answer {
                text: "No relevant information found in the ingested documents.".to_string(),
                sources: Vec::new(),
            });
        }

        let context = build_context(&chunks);
        let text = self.groq.generate_answer(&context, question).await?;

        Ok(Answer {
            text,
            sources: distinct_sources(&chunks),
        })
    }

    /// Generate the four-section scheme summary
    pub async fn summarize(&self) -> Result<SchemeSummary> {
        let mut sections = Vec::new();

        for (title, prompt) in SUMMARY_SECTIONS {
            info!("Summarizing section: {}", title);
            let answer = self.ask(prompt).await?;
            let text = if answer.text.trim().is_empty() {
                "No information found.".to_string()
            } else {
                answer.text.trim().to_string()
            };
            sections.push((title.to_string(), text));
        }

        Ok(SchemeSummary { sections })
    }

    /// Run the interactive question loop for the store
    pub async fn run_query_loop(&self) -> Result<()> {
        println!(
            "Ready to answer questions about '{}' using {}.",
            self.store_name,
            self.groq.model()
        );
        println!("Type 'summary' for the scheme summary, 'exit' to quit.");

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut buffer = String::new();

        loop {
            print!("\nYour question: ");
            stdout.flush()?;

            buffer.clear();
            if stdin.read_line(&mut buffer)? == 0 {
                break;
            }

            let question = buffer.trim();
            if question.is_empty() {
                continue;
            }

            if question.eq_ignore_ascii_case("exit") {
                break;
            }

            if question.eq_ignore_ascii_case("summary") {
                let summary = self.summarize().await?;
                println!("\n{}", summary);
                continue;
            }

            info!("User asked: {}", question);
            let answer = self.ask(question).await?;

            println!("\n{}", answer.text);
            if !answer.sources.is_empty() {
                println!("\nSources:");
                for source in &answer.sources {
                    println!("  - {}", source);
                }
            }
        }

        Ok(())
    }
}

/// Join retrieved chunks into a single context block for the LLM
fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<&str>>()
        .join("\n\n")
}

/// Deduplicated sources in retrieval order
fn distinct_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut sources = Vec::new();
    for chunk in chunks {
        if !sources.contains(&chunk.source) {
            sources.push(chunk.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, source: &str) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            source: source.to_string(),
            ordinal: 0,
            score: 0.9,
        }
    }

    #[test]
    fn test_build_context_joins_chunks() {
        let chunks = vec![scored("first", "a"), scored("second", "b")];
        assert_eq!(build_context(&chunks), "first\n\nsecond");
    }

    #[test]
    fn test_distinct_sources_preserves_retrieval_order() {
        let chunks = vec![
            scored("one", "https://example.gov/scheme"),
            scored("two", "guide.pdf"),
            scored("three", "https://example.gov/scheme"),
        ];
        assert_eq!(
            distinct_sources(&chunks),
            vec!["https://example.gov/scheme".to_string(), "guide.pdf".to_string()]
        );
    }

    #[test]
    fn test_summary_sections_cover_scheme_details() {
        let titles: Vec<&str> = SUMMARY_SECTIONS.iter().map(|(title, _)| *title).collect();
        assert_eq!(
            titles,
            vec![
                "Benefits",
                "Application Process",
                "Eligibility",
                "Required Documents"
            ]
        );
    }

    #[test]
    fn test_summary_display_renders_all_sections() {
        let summary = SchemeSummary {
            sections: vec![
                ("Benefits".to_string(), "Monthly pension.".to_string()),
                ("Eligibility".to_string(), "Age 60 or above.".to_string()),
            ],
        };
        let rendered = summary.to_string();
        assert!(rendered.contains("=== Benefits ==="));
        assert!(rendered.contains("Monthly pension."));
        assert!(rendered.contains("=== Eligibility ==="));
    }
}
