//! # Upstream Stand-in
//!
//! A local axum server that plays the Our World in Data CSV endpoint for the
//! integration tests: it counts hits, can be switched to answer with an
//! error status, and delays its answer so concurrent callers overlap.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tokio::net::TcpListener;

/// A small extract of the real dataset, columns in upstream order.
pub const SAMPLE_CSV: &str = "\
Entity,Code,Year,Population - Sex: all - Age: 15-64 - Variant: estimates,Population - Sex: all - Age: 65+ - Variant: estimates,Population - Sex: all - Age: 15-64 - Variant: medium,Population - Sex: all - Age: 65+ - Variant: medium
Japan,JPN,2020,74000000,36000000,,
Japan,JPN,2021,73500000,36200000,,
Japan,JPN,2050,,,55000000,38000000
South Korea,KOR,2021,37000000,8500000,,
South Korea,KOR,2050,,,24000000,19000000
Europe (UN),,2021,490000000,155000000,,
Niger,NER,2021,13000000,650000,,
Niger,NER,2100,,,120000000,9000000
Atlantis Trust Territory,,2021,,,,
";

#[derive(Clone)]
struct StubState {
    body: Arc<String>,
    hits: Arc<AtomicUsize>,
    status: Arc<AtomicU16>,
    delay: Duration,
}

/// Handle to a running stand-in.
pub struct StubUpstream {
    addr: SocketAddr,
    state: StubState,
}

impl StubUpstream {
    /// Starts serving `body` at `/population.csv` on an ephemeral port.
    pub async fn start(body: &str, delay: Duration) -> anyhow::Result<Self> {
        let state = StubState {
            body: Arc::new(body.to_string()),
            hits: Arc::new(AtomicUsize::new(0)),
            status: Arc::new(AtomicU16::new(200)),
            delay,
        };

        let app = Router::new()
            .route("/population.csv", get(serve_csv))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state })
    }

    /// URL of the CSV document.
    pub fn url(&self) -> String {
        format!("http://{}/population.csv", self.addr)
    }

    /// Requests served so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Makes every following request answer with `status`.
    pub fn set_status(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }
}

async fn serve_csv(State(state): State<StubState>) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.delay).await;

    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        (status, state.body.as_ref().clone())
    } else {
        (status, "upstream unavailable".to_string())
    }
}
