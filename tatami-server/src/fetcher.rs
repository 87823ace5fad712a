use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to referenced avatar failed")]
    Http(#[from] reqwest::Error),

    #[error("Referenced avatar answered with status {0}")]
    Status(u16),

    #[error("Referenced avatar is larger than {limit} bytes (at least {size})")]
    TooLarge { size: u64, limit: u64 },
}

/// Downloads avatar content that a client referenced by URL instead of uploading.
#[async_trait]
pub trait AvatarFetcher: Send + Sync {
    /// Fails with [`FetchError::TooLarge`] as soon as more than `limit` bytes are seen.
    async fn fetch(&self, url: &Url, limit: u64) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpAvatarFetcher {
    client: reqwest::Client,
}

impl HttpAvatarFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch(&self, url: &Url, limit: u64) -> Result<Vec<u8>, FetchError> {
        let mut resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        if let Some(size) = resp.content_length().filter(|size| *size > limit) {
            return Err(FetchError::TooLarge { size, limit });
        }

        // Content-Length can be absent or wrong, so the body is counted as it arrives.
        let mut content = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            let size = (content.len() + chunk.len()) as u64;
            if size > limit {
                tracing::debug!("Stopped reading {} after {} bytes", url, size);
                return Err(FetchError::TooLarge { size, limit });
            }
            content.extend_from_slice(&chunk);
        }
        Ok(content)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `response` verbatim to the first connection and returns its URL.
    async fn serve_once(response: Vec<u8>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            // The client hangs up early on oversized bodies.
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{}/avatar.png", addr)).unwrap()
    }

    fn with_length(status: &str, body: &[u8]) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(body);
        response
    }

    fn until_close(body: &[u8]) -> Vec<u8> {
        let mut response = b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_vec();
        response.extend_from_slice(body);
        response
    }

    fn fetcher() -> HttpAvatarFetcher {
        HttpAvatarFetcher { client: reqwest::Client::builder().no_proxy().build().unwrap() }
    }

    #[tokio::test]
    async fn test_error_status() {
        let url = serve_once(with_length("404 Not Found", b"gone")).await;

        let result = fetcher().fetch(&url, 1024).await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_returns_exact_body() {
        let url = serve_once(with_length("200 OK", b"avatar bytes")).await;

        let content = fetcher().fetch(&url, 1024).await.unwrap();
        assert_eq!(content, b"avatar bytes");
    }

    #[tokio::test]
    async fn test_body_at_limit_is_accepted() {
        let url = serve_once(until_close(b"12345678")).await;

        let content = fetcher().fetch(&url, 8).await.unwrap();
        assert_eq!(content, b"12345678");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let url = serve_once(with_length("200 OK", &[0u8; 64])).await;

        let result = fetcher().fetch(&url, 16).await;
        assert!(matches!(result, Err(FetchError::TooLarge { size: 64, limit: 16 })));
    }

    #[tokio::test]
    async fn test_undeclared_length_over_limit() {
        let url = serve_once(until_close(&[0u8; 64 * 1024])).await;

        match fetcher().fetch(&url, 16).await {
            Err(FetchError::TooLarge { size, limit: 16 }) => assert!(size > 16),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
