use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    task::JoinHandle,
};

use super::data::{LogLevel, LogMessage};
use super::message::Message;
use crate::BUFFER_SIZE;

const FILE_PREFIX: &str = "pump-stream_";

/// The core of the logging system.
///
/// Every message is appended to a timestamped log file and to `latest.log`.
/// Messages at or above `print_level` are also buffered and printed to stderr
/// when the logger is flushed.
#[derive(Debug)]
pub struct LogCore {
    /// Directory where log files are stored
    log_dir: PathBuf,
    /// Path to the current timestamped log file
    log_path: PathBuf,
    log_file: File,
    latest_log_file: File,
    /// Buffer of messages to be printed to stderr
    logs_to_print: Vec<LogMessage>,
    /// Minimum level of messages to be printed to stderr
    print_level: LogLevel,
    /// Maximum age of log files in days before they are deleted
    max_age: usize,
}

impl LogCore {
    /// Creates the log directory and opens both log files.
    pub async fn build(level: LogLevel, max_age: usize, log_dir: PathBuf) -> anyhow::Result<Self> {
        let log_path = log_dir.join(format!(
            "{}{}.log",
            FILE_PREFIX,
            chrono::Utc::now().format("%Y-%m-%d-%H-%M-%S")
        ));
        let latest_log_path = log_dir.join("latest.log");

        tokio::fs::create_dir_all(&log_dir)
            .await
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        let latest_log_file = File::create(&latest_log_path).await.with_context(|| {
            format!(
                "Failed to create latest log file: {}",
                latest_log_path.display()
            )
        })?;

        Ok(Self {
            log_dir,
            log_path,
            log_file,
            latest_log_file,
            logs_to_print: Vec::new(),
            print_level: level,
            max_age,
        })
    }

    pub fn spawn(mut self) -> (super::Log, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Message::Log(msg) => {
                        self.log(msg).await;
                    }
                    Message::Flush => {
                        rx.close();
                        // Drain what was queued before the flush request.
                        while let Ok(Message::Log(msg)) = rx.try_recv() {
                            self.log(msg).await;
                        }
                        self.flush();
                        break;
                    }
                    Message::CollectGarbage => {
                        self.collect_garbage().await;
                    }
                }
            }
        });
        (super::Log::Actual(tx), handle)
    }

    async fn log(&mut self, message: LogMessage) {
        let line = format!("{}\n", &message);

        for file in [&mut self.log_file, &mut self.latest_log_file] {
            if let Err(err) = write_line(file, &line).await {
                eprintln!("Failed to write to log file: {err}");
            }
        }

        if message.level >= self.print_level {
            self.logs_to_print.push(message);
        }
    }

    fn flush(self) {
        for message in &self.logs_to_print {
            eprintln!("{}", message);
        }
        if !self.logs_to_print.is_empty() {
            eprintln!("Check the full log file: {}", self.log_path.display());
        }
    }

    async fn collect_garbage(&mut self) {
        if self.max_age == 0 {
            return;
        }

        let now = std::time::SystemTime::now();
        let Ok(mut logs) = tokio::fs::read_dir(&self.log_dir).await else {
            self.log(LogMessage {
                level: LogLevel::Error,
                scope: "log",
                message: "Failed to read the logs directory during garbage collection".into(),
            })
            .await;
            return;
        };

        while let Ok(Some(log)) = logs.next_entry().await {
            let path = log.path();
            if !is_managed_log(&path) || path == self.log_path {
                continue;
            }

            let Ok(Ok(modified)) = log.metadata().await.map(|meta| meta.modified()) else {
                continue;
            };
            let Ok(age) = now.duration_since(modified) else {
                continue;
            };
            let age = age.as_secs() / 60 / 60 / 24;

            if age as usize > self.max_age && tokio::fs::remove_file(&path).await.is_err() {
                self.log(LogMessage {
                    level: LogLevel::Warning,
                    scope: "log",
                    message: format!("Failed to remove the log file: {}", path.display()),
                })
                .await;
            }
        }
    }
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

fn is_managed_log(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".log"))
}
