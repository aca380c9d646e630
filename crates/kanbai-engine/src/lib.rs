//! Kanbai Engine - inventory aggregation for the sold-out board
//!
//! Turns a member roster into a consolidated availability matrix with
//! derived aggregates, one fetch cycle at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────────┐     ┌───────────┐
//! │  Roster  │────▶│ Orchestrator │────▶│  Fetcher  │
//! │  (CSV)   │     │  (batches)   │     │  (HTTP)   │
//! └──────────┘     └──────┬───────┘     └───────────┘
//!                         │ per member: normal + final
//!                         ▼
//!                  ┌──────────────┐
//!                  │  Reconcile   │
//!                  │ (tail band)  │
//!                  └──────┬───────┘
//!                         ▼
//!                  ┌──────────────┐
//!                  │   Derive     │
//!                  │ (gating/agg) │
//!                  └──────┬───────┘
//!                         ▼
//!                  ┌──────────────┐
//!                  │ StatusBoard  │
//!                  └──────────────┘
//! ```
//!
//! The clock gates the whole cycle: before the sale-start instant no
//! network call is made at all, and past the final-slot deadline the final
//! endpoints stop being queried.

pub mod board;
pub mod derive;
pub mod fetch;
pub mod gate;
pub mod html;
pub mod orchestrator;
pub mod progress;
pub mod reconcile;
pub mod roster;
pub mod slots;

pub use board::{BoardCache, StatusBoard};
pub use derive::Matrix;
pub use orchestrator::{FetchOrchestrator, MemberFetch};
pub use progress::{LogProgress, NullProgress, Progress};
pub use roster::load_roster;
pub use slots::SlotBand;

use chrono::{DateTime, Utc};
use kanbai_core::{Config, Member, Result, SlotRules, StockState};
use tracing::{debug, info};

/// One engine per process run: holds the config and the shared HTTP client.
pub struct Engine {
    config: Config,
    orchestrator: FetchOrchestrator,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let orchestrator = FetchOrchestrator::new(&config);
        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one fetch cycle at instant `now` and assemble the board.
    ///
    /// `now` is sampled once by the caller so the whole cycle sees one
    /// consistent gating decision.
    pub async fn run_cycle(
        &self,
        members: &[Member],
        now: DateTime<Utc>,
        progress: &dyn Progress,
    ) -> StatusBoard {
        let rules = &self.config.slot_rules;

        let matrix = if !gate::sales_started(now, self.config.sale_start) {
            info!("sales not started; synthesizing unreleased board without fetching");
            synthesize_unreleased(members, rules)
        } else {
            let use_final = gate::use_final_slots(now, self.config.final_slot_deadline);
            debug!(use_final, members = members.len(), "starting fetch cycle");

            let fetches = self.orchestrator.run(members, use_final, progress).await;

            let mut matrix = Matrix::with_capacity(members.len());
            for (name, result) in fetches {
                let merged = reconcile::reconcile(
                    result.normal.unwrap_or_default(),
                    result.final_slots.as_ref(),
                    use_final,
                    rules,
                );
                matrix.insert(name, merged);
            }
            matrix
        };

        StatusBoard::build(
            members.to_vec(),
            matrix,
            rules,
            self.config.crowd_threshold,
            now,
        )
    }
}

/// Every member gets the full known universe at `Unreleased`; used before
/// the sale-start gate opens.
fn synthesize_unreleased(members: &[Member], rules: &SlotRules) -> Matrix {
    let universe = slots::known_universe(rules);
    members
        .iter()
        .map(|m| {
            let row = universe
                .iter()
                .map(|label| (label.clone(), StockState::Unreleased))
                .collect();
            (m.name.clone(), row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanbai_core::{DisplayState, League};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn variation_item(label: &str, sold: bool) -> String {
        let notify = if sold {
            "<a>再入荷お知らせを希望する</a>"
        } else {
            ""
        };
        format!(
            r#"<li class="cot-itemOrder-variationLI">
                 <span class="cot-itemOrder-variationName">{label}</span>
                 <span class="cot-itemOrder-variationStock"></span>
                 {notify}
               </li>"#
        )
    }

    /// Routes requests by path prefix and counts every connection.
    async fn spawn_routing_server(
        routes: Vec<(&'static str, String)>,
        hits: Arc<AtomicUsize>,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                hits.fetch_add(1, Ordering::SeqCst);
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let req = String::from_utf8_lossy(&buf[..n]);
                    let path = req
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    let body = routes
                        .iter()
                        .find(|(prefix, _)| path.starts_with(prefix))
                        .map(|(_, b)| b.clone())
                        .unwrap_or_default();
                    let resp = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(resp.as_bytes()).await;
                });
            }
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_pre_sale_short_circuit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_routing_server(vec![("/", String::new())], hits.clone()).await;

        let members = vec![
            Member::new("A", League::U17, Some(format!("{base}/a")), None),
            Member::new(
                "B",
                League::Z1,
                Some(format!("{base}/b")),
                Some(format!("{base}/bf")),
            ),
        ];

        let config = Config {
            sale_start: Some(at("2025-03-20T03:00:00Z")),
            batch_delay_ms: 0,
            ..Config::default()
        };
        let engine = Engine::new(config).unwrap();
        let board = engine
            .run_cycle(&members, at("2025-03-19T12:00:00Z"), &NullProgress)
            .await;

        // Every fixed slot is unreleased for every member, no calls made
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let universe = slots::known_universe(&engine.config().slot_rules);
        assert_eq!(board.slots, universe);
        for member in ["A", "B"] {
            for slot in &universe {
                assert_eq!(
                    board.state(member, slot),
                    Some(StockState::Unreleased),
                    "{member} {slot}"
                );
            }
        }
        assert_eq!(board.member_sales["A"], 0);
        assert_eq!(board.members_all_regular_sold_out, 0);
    }

    #[tokio::test]
    async fn test_cycle_reconciles_final_window() {
        // B's normal page: early gated slot, hours 18-20 sold out, the 21:xx
        // tail still reading available; B's final page: everything sold.
        // With the final window open the tail is forced sold out, which
        // clears B's whole regular band.
        let mut b_normal = variation_item("15:00-15:15", true);
        for hour in [18, 19, 20] {
            for minute in [0, 15, 30, 45] {
                let end = if minute == 45 {
                    format!("{:02}:00", hour + 1)
                } else {
                    format!("{hour:02}:{:02}", minute + 15)
                };
                b_normal.push_str(&variation_item(&format!("{hour:02}:{minute:02}-{end}"), true));
            }
        }
        for minute in [0, 15, 30, 45] {
            let end = if minute == 45 {
                "22:00".to_string()
            } else {
                format!("21:{:02}", minute + 15)
            };
            b_normal.push_str(&variation_item(&format!("21:{minute:02}-{end}"), false));
        }

        let b_final =
            variation_item("21:00-22:00", true) + &variation_item("final extra", true);
        let a_normal = variation_item("15:00-15:15", false);

        let hits = Arc::new(AtomicUsize::new(0));
        let base = spawn_routing_server(
            vec![("/bf", b_final), ("/b", b_normal), ("/a", a_normal)],
            hits.clone(),
        )
        .await;

        let members = vec![
            Member::new("A", League::U17, Some(format!("{base}/a")), None),
            Member::new(
                "B",
                League::Z1,
                Some(format!("{base}/b")),
                Some(format!("{base}/bf")),
            ),
        ];

        let config = Config {
            batch_delay_ms: 0,
            final_slot_deadline: at("2025-03-25T14:59:59Z"),
            ..Config::default()
        };
        let engine = Engine::new(config).unwrap();
        let board = engine
            .run_cycle(&members, at("2025-03-22T12:00:00Z"), &NullProgress)
            .await;

        // One call per endpoint: a, b, bf
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        // Tail forced sold out by the final source
        for slot in ["21:00-21:15", "21:15-21:30", "21:30-21:45", "21:45-22:00"] {
            assert_eq!(board.state("B", slot), Some(StockState::SoldOut), "{slot}");
        }
        assert_eq!(board.members_all_regular_sold_out, 1);

        // B's early slot reads unreleased from the page and renders locked...
        assert_eq!(
            board.state("B", "15:00-15:15"),
            Some(StockState::Unreleased)
        );
        let b_display = board.display_row(&members[1]);
        let early_idx = board.slots.iter().position(|s| s == "15:00-15:15").unwrap();
        assert_eq!(b_display[early_idx], DisplayState::Locked);

        // ...and with the regular band cleared, sales count the 16 regular slots
        assert_eq!(board.member_sales["B"], 16);

        // A's open early slot stays open and counts nowhere
        assert_eq!(
            board.state("A", "15:00-15:15"),
            Some(StockState::Available)
        );
        assert_eq!(board.sold_out_counts["15:00-15:15"], 0);
        assert_eq!(board.member_sales["A"], 0);
    }

    #[tokio::test]
    async fn test_cycle_after_final_deadline_skips_final_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let normal = variation_item("21:00-21:15", false);
        let base = spawn_routing_server(
            vec![("/bf", variation_item("x", true)), ("/b", normal)],
            hits.clone(),
        )
        .await;

        let members = vec![Member::new(
            "B",
            League::Z1,
            Some(format!("{base}/b")),
            Some(format!("{base}/bf")),
        )];

        let config = Config {
            batch_delay_ms: 0,
            final_slot_deadline: at("2025-03-25T14:59:59Z"),
            ..Config::default()
        };
        let engine = Engine::new(config).unwrap();
        let board = engine
            .run_cycle(&members, at("2025-03-26T00:00:00Z"), &NullProgress)
            .await;

        // Only the normal endpoint was fetched; the tail keeps its own state
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            board.state("B", "21:00-21:15"),
            Some(StockState::Available)
        );
    }
}
