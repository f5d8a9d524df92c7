//! `tiles fetch`: run a tile in-process and fetch paths through its Worker.
//!
//! The Frame, reference Shuttle and Worker all run on this runtime. The
//! Frame only makes progress while it is dispatched, so every wait on the
//! Shuttle side is driven alongside [`Frame::next_inbound`].

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tiles_frame::{ChannelEmbedder, Frame, FrameConfig, FrameEvent, MessageHub};
use tiles_protocol::PathResponse;
use tiles_shuttle::{Shuttle, WorkerConfig};
use tracing::{debug, warn};

use super::default_registry;

/// Load `source` and fetch each path in order.
pub(crate) async fn fetch_all(
    frame_config: FrameConfig,
    worker_config: WorkerConfig,
    source: &str,
    paths: &[String],
) -> Result<Vec<(String, PathResponse)>> {
    let hub = MessageHub::with_capacity(frame_config.transport_capacity);
    let (embedder, mut embeddings) = ChannelEmbedder::new();
    let mut frame = Frame::with_config(frame_config, default_registry(), std::sync::Arc::new(embedder));
    let mut events = frame.subscribe();

    frame.connect(&hub).await?;
    frame
        .set_src(source)
        .await
        .with_context(|| format!("failed to load {source}"))?;
    if frame.manifest().is_none() {
        warn!(source, "No loader claimed the source; every fetch will fail");
    }

    let Some(embedding) = embeddings.recv().await else {
        bail!("frame did not create an embedding");
    };
    let mut shuttle = Shuttle::spawn(embedding, hub.clone(), worker_config);

    let worker = drive(&mut frame, shuttle.worker())
        .await
        .context("tile never became ready")?;
    debug!(state = %frame.state(), "Tile ready");

    let mut responses = Vec::with_capacity(paths.len());
    for path in paths {
        let response = drive(&mut frame, worker.fetch(path))
            .await
            .with_context(|| format!("fetching {path}"))?;
        responses.push((path.clone(), response));
    }

    while let Some(event) = events.try_recv() {
        if let FrameEvent::RequestFailed { request_id, message } = event {
            warn!(%request_id, %message, "Request failed");
        }
    }

    frame.disconnect();
    shuttle.join().await?;
    Ok(responses)
}

/// Dispatch frame traffic until `fut` completes.
async fn drive<T>(frame: &mut Frame, fut: impl Future<Output = T>) -> T {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return out,
            Some(inbound) = frame.next_inbound() => frame.dispatch(&inbound),
        }
    }
}

pub(crate) async fn run_fetch(
    frame_config: FrameConfig,
    worker_config: WorkerConfig,
    source: &str,
    paths: &[String],
    body: bool,
) -> Result<()> {
    let responses = fetch_all(frame_config, worker_config, source, paths).await?;

    let mut stdout = std::io::stdout().lock();
    for (path, response) in &responses {
        if body {
            stdout.write_all(&response.body)?;
            continue;
        }
        let status = response.status.to_string();
        let status = if response.is_success() {
            status.green()
        } else {
            status.red()
        };
        writeln!(stdout, "{status} {path}")?;
        for (name, value) in &response.headers {
            writeln!(stdout, "  {name}: {value}")?;
        }
        writeln!(stdout, "  {} bytes", response.body.len())?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_all_from_tile_directory() {
        let dir = tiles_test::test_tile_dir();
        let paths = vec!["/".to_owned(), "/app.js".to_owned(), "/missing".to_owned()];

        let responses = fetch_all(
            FrameConfig::default(),
            WorkerConfig::default(),
            dir.path().to_str().unwrap(),
            &paths,
        )
        .await
        .unwrap();

        let statuses: Vec<u16> = responses.iter().map(|(_, r)| r.status).collect();
        assert_eq!(statuses, vec![200, 200, 404]);
        assert_eq!(responses[1].1.body, b"console.log('tile');");
    }

    #[tokio::test]
    async fn test_fetch_all_unclaimed_source_answers_500() {
        let dir = tempfile::tempdir().unwrap();

        let responses = fetch_all(
            FrameConfig::default(),
            WorkerConfig::default(),
            dir.path().to_str().unwrap(),
            &["/".to_owned()],
        )
        .await
        .unwrap();

        assert_eq!(responses[0].1.status, 500);
    }
}
