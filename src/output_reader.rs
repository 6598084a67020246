use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, Receiver};

/// Spawns a background task that reads the monitored output stream.
///
/// Each read is decoded as UTF-8 (lossily) and forwarded as one chunk. The
/// channel closes on end-of-file; a read error is forwarded once, then the
/// task stops.
pub fn spawn_reader<R>(mut reader: R) -> Receiver<io::Result<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buffer[..n]).into_owned();
                    if tx.send(Ok(chunk)).await.is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    break;
                }
            }
        }
    });

    rx
}

/// Reads and discards everything from `reader` until end-of-file.
pub fn spawn_drain<R>(mut reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_chunks_until_eof() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut rx = spawn_reader(reader);

        tokio::io::AsyncWriteExt::write_all(&mut writer, b"hello\n").await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk, "hello\n");

        drop(writer);
        assert!(rx.recv().await.is_none());
    }
}
