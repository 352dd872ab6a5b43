use misty_client::Client;
use std::path::Path;

/// Grabs one camera frame and saves it to `out`.
///
/// Returns the single line to show the operator, `Ok` when a frame was saved.
pub async fn check_connection(client: &Client, out: &Path) -> Result<String, String> {
    tracing::info!("Requesting a frame from {}...", client.base_url());
    let bytes = client
        .capture_rgb()
        .await
        .map_err(|e| format!("Connection failed: {e}"))?;
    tokio::fs::write(out, &bytes)
        .await
        .map_err(|e| format!("Connection failed: could not save frame to {}: {e}", out.display()))?;
    Ok(format!(
        "Connection successful! Saved {} bytes to {}",
        bytes.len(),
        out.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use misty_client::Config;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn answer_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });
        addr
    }

    fn client_for(addr: &str) -> Client {
        let config = Config::builder()
            .with_address(addr)
            .with_timeout(Duration::from_secs(2))
            .build();
        Client::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_frame_is_saved_and_success_reported() {
        let addr = answer_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\nConnection: close\r\n\r\nJPEG",
        )
        .await;
        let dir = tempdir().unwrap();
        let out = dir.path().join("frame.jpg");

        let line = check_connection(&client_for(&addr), &out).await.unwrap();

        assert_eq!(line, format!("Connection successful! Saved 4 bytes to {}", out.display()));
        assert_eq!(std::fs::read(&out).unwrap(), b"JPEG");
    }

    #[tokio::test]
    async fn test_error_status_reported_once() {
        let addr = answer_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let dir = tempdir().unwrap();
        let out = dir.path().join("frame.jpg");

        let line = check_connection(&client_for(&addr), &out).await.unwrap_err();

        assert_eq!(line, "Connection failed: HTTP Error 404");
        assert!(!out.exists());
    }
}
