use std::error::Error as _;
use std::io;

use log::{debug, warn};
use reqwest::blocking::{Client, Response};

use crate::config::InstallerConfig;
use crate::error::{RetrievalError, UpdateError};
use crate::updater::{AssetFetcher, ReleaseDescriptor, ReleaseResolver};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for the release feed and asset downloads.
#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    fn get(&self, url: &str) -> Result<Response, RetrievalError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| RetrievalError::Transport {
                url: url.to_owned(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Default for NetworkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseResolver for NetworkClient {
    fn latest_release(&self, config: &InstallerConfig) -> Result<ReleaseDescriptor, UpdateError> {
        let url = config.latest_release_url();
        debug!("release: querying {url}");
        let body = self
            .get(&url)?
            .text()
            .map_err(|source| RetrievalError::Transport {
                url: url.clone(),
                source,
            })?;
        parse_release(&url, &body)
    }
}

impl AssetFetcher for NetworkClient {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        debug!("fetch: GET {url}");
        let response = self.get(url)?;
        let expected = response.content_length();
        let bytes = response
            .bytes()
            .map_err(|source| body_error(url, expected, source))?;
        Ok(bytes.to_vec())
    }
}

fn parse_release(url: &str, body: &str) -> Result<ReleaseDescriptor, UpdateError> {
    serde_json::from_str(body).map_err(|source| UpdateError::MalformedMetadata {
        url: url.to_owned(),
        source,
    })
}

/// A body that ends before its declared `Content-Length` is a truncated
/// download; anything else that breaks the body is a transport failure.
fn body_error(url: &str, expected: Option<u64>, source: reqwest::Error) -> RetrievalError {
    match expected {
        Some(expected) if ended_early(&source) => RetrievalError::Truncated {
            url: url.to_owned(),
            expected,
            source,
        },
        _ => RetrievalError::Transport {
            url: url.to_owned(),
            source,
        },
    }
}

fn ended_early(err: &reqwest::Error) -> bool {
    let mut cause = err.source();
    while let Some(inner) = cause {
        if let Some(io_err) = inner.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::UnexpectedEof
        {
            return true;
        }
        cause = inner.source();
    }
    err.is_body()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const URL: &str = "https://api.github.com/repos/acme/widget/releases/latest";

    #[test]
    fn parses_release_body() {
        let body = r#"{"tag_name":"v0.4.0","assets":[
            {"name":"Plugin.addin","browser_download_url":"https://example.test/Plugin.addin"},
            {"name":"Plugin.dll","browser_download_url":"https://example.test/Plugin.dll"}
        ]}"#;
        let release = parse_release(URL, body).unwrap();
        assert_eq!(release.tag_name, "v0.4.0");
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.assets[1].name, "Plugin.dll");
    }

    #[test]
    fn rejects_malformed_body() {
        let err = parse_release(URL, "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, UpdateError::MalformedMetadata { ref url, .. } if url == URL));
    }

    #[test]
    fn rejects_body_missing_tag() {
        let err = parse_release(URL, r#"{"assets": []}"#).unwrap_err();
        assert!(matches!(err, UpdateError::MalformedMetadata { .. }));
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("addin-updater/"));
    }

    /// Serve one canned HTTP response on a loopback port and return its base URL.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });
        (base, handle)
    }

    fn local_client() -> NetworkClient {
        NetworkClient {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .no_proxy()
                .build()
                .unwrap(),
        }
    }

    #[test]
    fn fetch_returns_full_body() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nDLLv1");
        let bytes = local_client().fetch(&format!("{base}/Plugin.dll")).unwrap();
        server.join().unwrap();
        assert_eq!(bytes, b"DLLv1");
    }

    #[test]
    fn fetch_reports_error_status() {
        let (base, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = local_client().fetch(&format!("{base}/missing.dll")).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, RetrievalError::Status { status: 404, .. }));
    }

    #[test]
    fn fetch_flags_body_shorter_than_content_length() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\nabc");
        let err = local_client().fetch(&format!("{base}/Plugin.dll")).unwrap_err();
        server.join().unwrap();
        assert!(
            matches!(err, RetrievalError::Truncated { expected: 10, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn release_lookup_rejects_non_json_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 25\r\nConnection: close\r\n\r\n<html>rate limited</html>",
        );
        let mut config = InstallerConfig::new("/unused");
        config.api_base = base;
        let err = local_client().latest_release(&config).unwrap_err();
        server.join().unwrap();
        assert!(
            matches!(err, UpdateError::MalformedMetadata { ref url, .. } if url.ends_with("/releases/latest")),
            "got {err:?}"
        );
    }

    #[test]
    fn release_lookup_reports_error_status() {
        let (base, server) = serve_once(
            "HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let mut config = InstallerConfig::new("/unused");
        config.api_base = base;
        let err = local_client().latest_release(&config).unwrap_err();
        server.join().unwrap();
        assert!(matches!(
            err,
            UpdateError::Retrieval(RetrievalError::Status { status: 403, .. })
        ));
    }
}
