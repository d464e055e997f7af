//! `sift feedback`: rate a search result or a generated answer.

use std::time::Duration;

use clap::Subcommand;
use sift_cms::{AnswerFeedback, FeedbackClient, FeedbackScore, SearchFeedback};
use sift_config::AppConfig;
use sift_rag::{DocumentSource, MockDocumentSource};

#[derive(Subcommand)]
pub enum FeedbackTarget {
    /// Rate one search result
    Search {
        #[arg(short, long)]
        query: String,

        /// 1-based position of the result
        #[arg(short, long)]
        result: usize,

        /// 1 (worst) to 5 (best), or a face: 😞 🙁 😐 🙂 😀
        #[arg(short, long)]
        score: FeedbackScore,

        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Rate a generated answer
    Answer {
        #[arg(short, long)]
        query: String,

        /// The answer text being rated
        #[arg(short, long)]
        answer: String,

        #[arg(short, long)]
        score: FeedbackScore,

        #[arg(short, long)]
        comment: Option<String>,
    },
}

pub async fn run(
    config: &AppConfig,
    target: FeedbackTarget,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = FeedbackClient::new(&config.cms)?;

    let accepted = match target {
        FeedbackTarget::Search {
            query,
            result,
            score,
            comment,
        } => {
            let source = MockDocumentSource::new(
                Duration::from_millis(config.search.mock_delay_ms),
                config.search.mock_results,
            );
            let results = source.search(&query).await?;
            let passage = result
                .checked_sub(1)
                .and_then(|i| results.get(i))
                .ok_or_else(|| format!("No result #{result} for '{query}' ({} results)", results.len()))?;

            let feedback = SearchFeedback::new(&query, passage, score, comment);
            client.submit_search_feedback(&feedback).await
        }
        FeedbackTarget::Answer {
            query,
            answer,
            score,
            comment,
        } => {
            let feedback = AnswerFeedback::new(query, answer, score, comment);
            client.submit_answer_feedback(&feedback).await
        }
    };

    if accepted {
        println!("✅ Feedback recorded");
    } else {
        println!("⚠️  Feedback was not recorded (see logs)");
    }
    Ok(())
}
