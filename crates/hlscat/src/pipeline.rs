// Segment pipeline: fetches every job concurrently and reassembles the bytes in playlist order.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::HlsError;
use crate::config::{DownloaderConfig, FALLBACK_EXTENSION};
use crate::fetcher::{SegmentFetcher, fetch_with_timeout};
use crate::playlist::ParsedPlaylist;
use crate::url_utils::{infer_extension, resolve_url};

/// One segment to fetch. `index` is its slot in the assembled output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentJob {
    pub index: usize,
    pub url: Url,
}

/// Absolute segment URLs in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobList {
    jobs: Vec<SegmentJob>,
}

impl JobList {
    pub fn from_urls(urls: impl IntoIterator<Item = Url>) -> Self {
        let jobs = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| SegmentJob { index, url })
            .collect();
        Self { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[SegmentJob] {
        &self.jobs
    }

    /// Extension for the output file, taken from the last job's URL.
    pub fn extension_hint(&self) -> String {
        self.jobs
            .last()
            .and_then(|job| infer_extension(job.url.as_str()))
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
    }
}

impl IntoIterator for JobList {
    type Item = SegmentJob;
    type IntoIter = std::vec::IntoIter<SegmentJob>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}

/// Resolve every playlist reference against `base`, init segment first.
///
/// An empty playlist parses fine but cannot be assembled, so it is rejected here.
pub fn build_jobs(base: &Url, parsed: &ParsedPlaylist) -> Result<JobList, HlsError> {
    if parsed.segment_uris.is_empty() {
        return Err(HlsError::EmptyPlaylist);
    }

    let urls = parsed
        .init_segment_uri
        .iter()
        .chain(parsed.segment_uris.iter())
        .map(|reference| resolve_url(base, reference))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(JobList::from_urls(urls))
}

/// Concatenated media plus the extension its segments suggest.
#[derive(Debug, Clone)]
pub struct AssembledMedia {
    pub data: Bytes,
    pub extension_hint: String,
    pub segment_count: usize,
}

pub struct SegmentPipeline {
    fetcher: Arc<dyn SegmentFetcher>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl SegmentPipeline {
    pub fn new(fetcher: Arc<dyn SegmentFetcher>, config: &DownloaderConfig) -> Self {
        Self {
            fetcher,
            concurrency: config.concurrency,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Fetch all jobs and concatenate them by index.
    ///
    /// At most `concurrency` fetches are in flight (all of them when it is 0).
    /// The first failure cancels the remaining fetches and is returned as is.
    pub async fn assemble(
        &self,
        jobs: JobList,
        token: &CancellationToken,
    ) -> Result<AssembledMedia, HlsError> {
        if jobs.is_empty() {
            return Err(HlsError::EmptyPlaylist);
        }

        let extension_hint = jobs.extension_hint();
        let total = jobs.len();
        let max_in_flight = if self.concurrency == 0 {
            total
        } else {
            self.concurrency
        };
        debug!(total, max_in_flight, "Starting segment fetches");

        let run_token = token.child_token();
        let mut slots: Vec<Option<Bytes>> = vec![None; total];
        let mut pending = jobs.into_iter();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < max_in_flight {
                let Some(job) = pending.next() else {
                    break;
                };
                in_flight.push(Self::fetch_job(
                    Arc::clone(&self.fetcher),
                    job,
                    self.fetch_timeout,
                    run_token.clone(),
                ));
            }

            let Some((index, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(bytes) => {
                    trace!(index, size = bytes.len(), "Segment fetched");
                    slots[index] = Some(bytes);
                }
                Err(e) => {
                    if !matches!(e, HlsError::Cancelled) {
                        warn!(index, error = %e, "Segment fetch failed, aborting remaining fetches");
                    }
                    run_token.cancel();
                    return Err(e);
                }
            }
        }

        let data = concat_in_order(slots)?;
        info!(segments = total, bytes = data.len(), "Assembled media");
        Ok(AssembledMedia {
            data,
            extension_hint,
            segment_count: total,
        })
    }

    async fn fetch_job(
        fetcher: Arc<dyn SegmentFetcher>,
        job: SegmentJob,
        timeout: Duration,
        token: CancellationToken,
    ) -> (usize, Result<Bytes, HlsError>) {
        let result = fetch_with_timeout(fetcher.as_ref(), &job.url, timeout, &token).await;
        (job.index, result)
    }
}

fn concat_in_order(slots: Vec<Option<Bytes>>) -> Result<Bytes, HlsError> {
    let total_len = slots.iter().flatten().map(Bytes::len).sum();
    let mut buffer = BytesMut::with_capacity(total_len);
    for (index, slot) in slots.into_iter().enumerate() {
        let Some(bytes) = slot else {
            return Err(HlsError::internal(format!(
                "segment {index} missing after all fetches completed"
            )));
        };
        buffer.extend_from_slice(&bytes);
    }
    Ok(buffer.freeze())
}
