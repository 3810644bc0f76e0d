// ===============================
// src/recorder.rs
// ===============================
//
// JSONL event recorder, write-behind: events accumulate in a batch that is
// appended and flushed when it fills, on the configured cadence, or at
// shutdown. A failed append drops that batch, reopens the file and keeps
// going; written/dropped totals feed the `events_recorded_total` metric.
//
// ENV: RECORD_FILE enables it; RECORD_FLUSH_MS / RECORD_BATCH_EVENTS tune
// the cadence and batch size (see config.rs).
//
use std::path::Path;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::domain::Event;
use crate::metrics::RECORDED;

#[derive(Clone, Debug)]
pub struct RecorderCfg {
    pub path: String,
    pub flush_ms: u64,
    pub batch_events: usize,
}

async fn open_appender(path: &str) -> std::io::Result<BufWriter<File>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

// Drain the batch into one buffered append + flush. Unserializable events
// are skipped; the count of lines actually written comes back.
async fn append_batch(writer: &mut BufWriter<File>, batch: &mut Vec<Event>) -> std::io::Result<u64> {
    let mut buf = Vec::with_capacity(batch.len() * 128);
    let mut lines: u64 = 0;
    for ev in batch.drain(..) {
        match serde_json::to_vec(&ev) {
            Ok(line) => {
                buf.extend_from_slice(&line);
                buf.push(b'\n');
                lines += 1;
            }
            Err(e) => warn!(?e, "recorder: unserializable event skipped"),
        }
    }
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(lines)
}

pub async fn run(mut rx: mpsc::Receiver<Event>, cfg: RecorderCfg) {
    let mut writer = match open_appender(&cfg.path).await {
        Ok(w) => w,
        Err(e) => {
            error!(?e, path = %cfg.path, "recorder: cannot open record file");
            return;
        }
    };
    info!(path = %cfg.path, flush_ms = cfg.flush_ms, batch = cfg.batch_events, "recorder: started");

    let mut batch: Vec<Event> = Vec::with_capacity(cfg.batch_events);
    let mut written: u64 = 0;
    let mut dropped: u64 = 0;

    let mut tick = interval(Duration::from_millis(cfg.flush_ms.max(10)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let mut tick_fired = false;
        let limit = cfg.batch_events.saturating_sub(batch.len()).max(1);
        let closed = tokio::select! {
            n = rx.recv_many(&mut batch, limit) => n == 0,
            _ = tick.tick() => {
                tick_fired = true;
                false
            }
        };

        if !batch.is_empty() && (closed || tick_fired || batch.len() >= cfg.batch_events) {
            let attempted = batch.len() as u64;
            match append_batch(&mut writer, &mut batch).await {
                Ok(lines) => {
                    written += lines;
                    RECORDED.with_label_values(&["written"]).inc_by(lines);
                    if lines < attempted {
                        dropped += attempted - lines;
                        RECORDED.with_label_values(&["dropped"]).inc_by(attempted - lines);
                    }
                }
                Err(e) => {
                    dropped += attempted;
                    RECORDED.with_label_values(&["dropped"]).inc_by(attempted);
                    warn!(?e, dropped, "recorder: append failed, reopening file");
                    match open_appender(&cfg.path).await {
                        Ok(w) => writer = w,
                        Err(e) => error!(?e, "recorder: reopen failed, keeping stale handle"),
                    }
                }
            }
        }

        if closed {
            info!(written, dropped, "recorder: channel closed, stopped");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batches_are_appended_as_jsonl() {
        let path = std::env::temp_dir().join(format!("mm_bot_rec_{}.jsonl", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let mut writer = open_appender(path.to_str().unwrap()).await.unwrap();
        let mut batch = vec![Event::Note("alpha".into()), Event::Note("beta".into())];
        let lines = append_batch(&mut writer, &mut batch).await.unwrap();
        assert_eq!(lines, 2);
        assert!(batch.is_empty());

        // A second append extends the same file.
        let mut batch = vec![Event::Note("gamma".into())];
        append_batch(&mut writer, &mut batch).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.contains("Note")));
        let _ = tokio::fs::remove_file(&path).await;
    }
}
