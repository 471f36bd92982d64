//! Count words across an in-memory corpus
//!
//! Builds a pipeline over a `MemorySource`, runs it, and prints the top words
//! along with the pipeline counters.
//!
//! Usage: cargo run --example count_files --release

use wordcount_pipeline::report::format_metrics;
use wordcount_pipeline::{ChunkBoundary, MemorySource, PipelineBuilder};

const PASSAGES: &[&str] = &[
    "It was the best of times, it was the worst of times.",
    "It was the age of wisdom, it was the age of foolishness.",
    "It was the epoch of belief, it was the epoch of incredulity.",
    "It was the season of Light, it was the season of Darkness.",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Word Count Pipeline");
    println!("===================");

    let mut source = MemorySource::new();
    let mut files = Vec::new();
    for i in 0..200 {
        let name = format!("chapter-{:03}.txt", i);
        source = source.with_file(name.clone(), PASSAGES[i % PASSAGES.len()]);
        files.push(name);
    }
    // Listed but never added: shows up as an open failure, not an error
    files.push("chapter-missing.txt".to_string());
    println!("{} files in memory, {} queued", source.len(), files.len());

    let pipeline = PipelineBuilder::new()
        .workers(4)
        .reducers(2)
        .chunk_size(16)
        .boundary(ChunkBoundary::Carry)
        .result_queue_size(2)
        .source(source)
        .build()?;

    let outcome = pipeline.run(files.as_slice())?;

    let mut top: Vec<_> = outcome.counts.iter().collect();
    top.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("\n=== Top 10 Words ===");
    for (i, (word, count)) in top.iter().take(10).enumerate() {
        println!("{:2}. {} ({})", i + 1, word, count);
    }

    println!("\n{}", format_metrics(&outcome.metrics));
    Ok(())
}
