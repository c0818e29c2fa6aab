use chrono::{DateTime, Utc};
use mcn_core::{Article, Category};
use std::sync::atomic::{AtomicI64, Ordering};
use crate::extract::RawCandidate;

pub const UNTITLED: &str = "Untitled";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

static LAST_BATCH_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond stamp for a new batch, strictly greater than every stamp handed out before.
fn next_batch_stamp(now_millis: i64) -> i64 {
    let previous = LAST_BATCH_STAMP
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(now_millis.max(last + 1)))
        .unwrap_or_else(|last| last);
    now_millis.max(previous + 1)
}

/// Values stamped on every article built from one model answer.
#[derive(Debug, Clone)]
pub struct CandidateContext<'a> {
    pub fetched_at: DateTime<Utc>,
    /// Id prefix shared by the batch; unique per process even within one millisecond.
    pub batch: i64,
    pub location: &'a str,
    pub author: &'a str,
}

impl<'a> CandidateContext<'a> {
    pub fn new(location: &'a str, author: &'a str) -> Self {
        let fetched_at = Utc::now();
        Self {
            batch: next_batch_stamp(fetched_at.timestamp_millis()),
            fetched_at,
            location,
            author,
        }
    }
}

/// Fill the gaps in a model-described story and turn it into an article.
pub fn normalize(raw: RawCandidate, index: usize, ctx: &CandidateContext<'_>) -> Article {
    let id = format!("gen-{}-{}", ctx.batch, index);

    let category = match raw.category.as_deref() {
        Some(name) => name.parse::<Category>().unwrap_or_else(|_| {
            tracing::warn!("Received invalid category '{}', falling back to '{}'", name, Category::default());
            Category::default()
        }),
        None => Category::default(),
    };

    Article {
        url: raw.url.unwrap_or_else(|| format!("#{}", id)),
        title: raw.title.unwrap_or_else(|| UNTITLED.to_string()),
        description: raw.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        source: raw.source.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        image: None,
        published: ctx.fetched_at,
        fetched_at: ctx.fetched_at,
        location: ctx.location.to_string(),
        category,
        author: Some(ctx.author.to_string()),
        id,
    }
}

/// Only real stories with a real title, a real summary and a web link get through.
pub fn passes_quality_gate(article: &Article) -> bool {
    !article.title.is_empty()
        && article.title != UNTITLED
        && !article.description.is_empty()
        && article.description != NO_DESCRIPTION
        && article.has_web_url()
}

/// Normalize a whole batch and keep what passes the gate, in model order.
pub fn accept_batch(raws: Vec<RawCandidate>, ctx: &CandidateContext<'_>) -> Vec<Article> {
    raws.into_iter()
        .enumerate()
        .map(|(index, raw)| normalize(raw, index, ctx))
        .filter(passes_quality_gate)
        .collect()
}
