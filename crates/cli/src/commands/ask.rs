//! `sift ask`: retrieve passages, stream the answer, list citations.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sift_config::AppConfig;
use sift_core::completion::Fragment;
use sift_rag::{MockDocumentSource, RagPipeline, SessionContext};
use tracing::info;

pub async fn run(
    config: &AppConfig,
    query: &str,
    page: usize,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = sift_providers::build_client(&config.completion)?;
    info!(backend = client.name(), model = %config.completion.model, stream, "Answering query");
    let source = MockDocumentSource::new(
        Duration::from_millis(config.search.mock_delay_ms),
        config.search.mock_results,
    );
    let pipeline = RagPipeline::new(client, Arc::new(source), &config.completion.model)
        .with_temperature(config.completion.temperature)
        .with_max_tokens(config.completion.max_tokens);

    let mut session = SessionContext::new();
    session.apply_query(query);

    println!("🔎 {query}");
    println!();

    if stream {
        let mut rag = pipeline.run_stream(query).await?;
        session.store_results(rag.passages);

        let mut answer = String::new();
        let mut stdout = std::io::stdout();
        while let Some(item) = rag.fragments.next().await {
            match item? {
                Fragment::Text(piece) => {
                    print!("{piece}");
                    stdout.flush()?;
                    answer.push_str(&piece);
                }
                Fragment::End => break,
            }
        }
        println!();
        session.store_answer(answer);
    } else {
        let rag = pipeline.run(query).await?;
        println!("{}", rag.answer);
        session.store_results(rag.passages);
        session.store_answer(rag.answer);
    }

    print_results(&mut session, page, config.page_size);
    Ok(())
}

fn print_results(session: &mut SessionContext, page: usize, page_size: usize) {
    session.set_page(page, page_size);

    println!();
    println!(
        "📄 Results (page {} of {})",
        session.page,
        session.total_pages(page_size).max(1)
    );

    let first = session.first_index(page_size);
    for (offset, passage) in session.page_slice(page_size).iter().enumerate() {
        println!("  {}. {}", first + offset + 1, passage.title());
        if let Some(link) = passage.link() {
            println!("     {link}");
        }
    }

    let buttons = session.pagination(page_size);
    if !buttons.is_empty() {
        let labels: Vec<String> = buttons
            .iter()
            .map(|b| {
                if b.is_disabled() {
                    format!("[{}]", b.label)
                } else {
                    b.label.clone()
                }
            })
            .collect();
        println!();
        println!("   {}", labels.join("  "));
    }
}
