// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic self-ping that keeps sleep-on-idle hosts awake.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

/// Pings `{base_url}/health` every `interval` until `cancel` fires.
///
/// Failures are logged and never stop the pinger.
pub fn spawn_keep_alive(
    base_url: &str,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let url = health_url(base_url);
    tokio::spawn(async move {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "keep-alive disabled: failed to build HTTP client");
                return;
            }
        };
        info!(%url, interval_secs = interval.as_secs(), "keep-alive pinger started");

        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match client.get(&url).send().await {
                        Ok(resp) => debug!(status = %resp.status(), "keep-alive ping"),
                        Err(e) => warn!(error = %e, "keep-alive ping failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("keep-alive pinger shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn health_url_joins_cleanly() {
        assert_eq!(health_url("https://x.onrender.com/"), "https://x.onrender.com/health");
        assert_eq!(health_url("http://h:3000"), "http://h:3000/health");
    }

    #[tokio::test]
    async fn pings_until_cancelled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let handle = spawn_keep_alive(&server.uri(), Duration::from_millis(40), cancel.clone());
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("pinger did not stop")
            .unwrap();

        let pings = server.received_requests().await.unwrap().len();
        assert!(pings >= 2, "expected repeated pings, got {pings}");
    }
}
