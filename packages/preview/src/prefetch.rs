//! Bulk preview fetching.

use std::sync::Arc;

use futures::stream::{self, StreamExt as _};

use crate::cache::PreviewCache;
use crate::progress::ProgressCallback;
use crate::PreviewService;

/// Counts from one [`prefetch_all`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// URLs fetched in this run.
    pub fetched: usize,
    /// Fetched URLs that produced placeholder previews.
    pub placeholders: usize,
    /// URLs skipped because they were already cached.
    pub cached: usize,
}

/// Fetches a preview for every URL not yet in `cache` and stores the
/// results, placeholders included.
///
/// At most `concurrency` fetches are in flight at once. With `refresh`
/// set, cached URLs are fetched again.
pub async fn prefetch_all<S, I>(
    service: &S,
    cache: &mut PreviewCache,
    urls: I,
    concurrency: usize,
    refresh: bool,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> PrefetchStats
where
    S: PreviewService,
    I: IntoIterator<Item = String>,
{
    let mut stats = PrefetchStats::default();
    let pending: Vec<String> = urls
        .into_iter()
        .filter(|url| {
            let keep = refresh || !cache.contains(url);
            if !keep {
                stats.cached += 1;
            }
            keep
        })
        .collect();

    log::info!(
        "Fetching {} previews ({} already cached, concurrency={concurrency})",
        pending.len(),
        stats.cached
    );
    if let Some(p) = progress {
        p.set_total(pending.len() as u64);
        p.set_message("Fetching previews".to_string());
    }

    let results: Vec<_> = stream::iter(pending.into_iter().map(|url| async move {
        let preview = service.fetch(&url).await;
        if let Some(p) = progress {
            p.inc(1);
        }
        (url, preview)
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    for (url, preview) in results {
        stats.fetched += 1;
        if preview.is_placeholder() {
            log::debug!("Placeholder preview for {url}: {}", preview.title);
            stats.placeholders += 1;
        }
        cache.insert(url, preview);
    }

    if let Some(p) = progress {
        p.finish(format!(
            "Fetched {} previews ({} placeholders)",
            stats.fetched, stats.placeholders
        ));
    }

    stats
}
