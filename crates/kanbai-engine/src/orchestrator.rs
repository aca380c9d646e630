//! Concurrent fetch orchestration
//!
//! Fans one fetch job out per (member, endpoint) pair: always the normal
//! endpoint when present, plus the final endpoint while the final window is
//! open. Jobs run concurrently within fixed-size batches; batches run
//! strictly sequentially with a pause in between to bound request rate at
//! the origin. Results are regrouped by member identity, so output never
//! depends on completion order.

use crate::fetch;
use crate::progress::Progress;
use kanbai_core::{Config, Member, SlotMap, SlotRules};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Normal,
    Final,
}

#[derive(Debug, Clone)]
struct FetchJob {
    member: String,
    kind: JobKind,
    url: String,
}

/// Raw fetch results for one member, before reconciliation.
#[derive(Debug, Clone, Default)]
pub struct MemberFetch {
    pub normal: Option<SlotMap>,
    pub final_slots: Option<SlotMap>,
}

/// Schedules batched fetches over one shared HTTP client.
pub struct FetchOrchestrator {
    client: reqwest::Client,
    batch_size: usize,
    batch_delay: Duration,
    rules: SlotRules,
}

impl FetchOrchestrator {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
            rules: config.slot_rules.clone(),
        }
    }

    /// Fetch every member's stock pages. Each roster member gets an entry,
    /// even when it has no endpoints or every fetch failed.
    pub async fn run(
        &self,
        members: &[Member],
        use_final_slots: bool,
        progress: &dyn Progress,
    ) -> HashMap<String, MemberFetch> {
        let jobs = build_jobs(members, use_final_slots);
        let total = jobs.len();
        progress.begin(total);

        let started = Instant::now();
        let mut fetched: Vec<(String, JobKind, SlotMap)> = Vec::with_capacity(total);
        let mut completed = 0usize;

        for batch in jobs.chunks(self.batch_size) {
            let mut handles = Vec::with_capacity(batch.len());
            for job in batch {
                let client = self.client.clone();
                let rules = self.rules.clone();
                let member = job.member.clone();
                let kind = job.kind;
                let url = job.url.clone();

                handles.push(tokio::spawn(async move {
                    let slots = fetch::fetch_stock(&client, Some(&url), &rules).await;
                    (member, kind, slots)
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(result) => fetched.push(result),
                    Err(e) => warn!(error = %e, "fetch task failed"),
                }
            }

            completed += batch.len();
            progress.batch_done(completed, total);

            if completed < total {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        // Regroup by member; pre-seed so fetch failures still leave a row.
        let mut results: HashMap<String, MemberFetch> = members
            .iter()
            .map(|m| (m.name.clone(), MemberFetch::default()))
            .collect();

        for (member, kind, slots) in fetched {
            let entry = results.entry(member.clone()).or_default();
            let slot = match kind {
                JobKind::Normal => &mut entry.normal,
                JobKind::Final => &mut entry.final_slots,
            };
            // First result wins; a duplicate means two roster rows share a name.
            if slot.is_some() {
                warn!(member = %member, ?kind, "duplicate fetch result ignored");
            } else {
                *slot = Some(slots);
            }
        }

        progress.finish();
        debug!(
            jobs = total,
            members = members.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetch cycle complete"
        );

        results
    }
}

fn build_jobs(members: &[Member], use_final_slots: bool) -> Vec<FetchJob> {
    let mut jobs = Vec::new();
    for member in members {
        if let Some(url) = &member.normal_url {
            jobs.push(FetchJob {
                member: member.name.clone(),
                kind: JobKind::Normal,
                url: url.clone(),
            });
        }
        if use_final_slots {
            if let Some(url) = &member.final_url {
                jobs.push(FetchJob {
                    member: member.name.clone(),
                    kind: JobKind::Final,
                    url: url.clone(),
                });
            }
        }
    }
    jobs
}
