//! Line sources for the chat loop

use async_trait::async_trait;
use std::io::BufRead;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::mpsc;

use crate::error::Result;

/// Async source of input lines; `None` is end of input
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator.
    ///
    /// Must be cancel safe: a read abandoned on Ctrl-C may not lose data.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for Lines<R> {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(Lines::next_line(self).await?)
    }
}

/// Console input read on a dedicated thread.
///
/// A blocking read pending at shutdown would otherwise keep the runtime
/// alive; the reader thread is detached and dies with the process.
pub struct StdinLines {
    rx: mpsc::Receiver<std::io::Result<String>>,
}

impl StdinLines {
    /// Start the reader thread
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        StdinLines { rx }
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.rx.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    #[tokio::test]
    async fn test_lines_source_reads_until_eof() {
        let mut lines = tokio::io::BufReader::new(&b"hello\r\nworld"[..]).lines();
        assert_eq!(LineSource::next_line(&mut lines).await.unwrap().as_deref(), Some("hello"));
        assert_eq!(LineSource::next_line(&mut lines).await.unwrap().as_deref(), Some("world"));
        assert_eq!(LineSource::next_line(&mut lines).await.unwrap(), None);
    }
}
