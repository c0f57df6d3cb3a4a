//! Asset byte sources
//!
//! Every reader streams its data in chunks and reports `(loaded, total)`
//! after each chunk; `total` is `None` when the source does not announce a
//! size. The callback runs on the asset runtime, never on the loop thread.

use std::io;
#[cfg(feature = "http")]
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::io::AsyncReadExt;

#[cfg(feature = "http")]
use ehttp::streaming::Part;

/// Chunk size used by the file reader.
const FILE_CHUNK_SIZE: usize = 256 * 1024;

/// Progress callback: `(bytes_loaded, total_bytes)`.
pub type ChunkCallback<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

pub trait AssetReader: Send + Sync {
    fn read_bytes(
        &self,
        uri: &str,
        on_chunk: ChunkCallback<'_>,
    ) -> impl std::future::Future<Output = io::Result<Vec<u8>>> + Send;
}

// ============================================================================
// File
// ============================================================================

pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str, on_chunk: ChunkCallback<'_>) -> io::Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        let mut file = tokio::fs::File::open(&path).await?;
        let total = file.metadata().await.ok().map(|m| m.len());

        let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = vec![0u8; FILE_CHUNK_SIZE];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            on_chunk(data.len() as u64, total);
        }
        Ok(data)
    }
}

// ============================================================================
// Memory
// ============================================================================

#[derive(Clone)]
enum MemoryEntry {
    Data {
        bytes: Arc<Vec<u8>>,
        chunk_size: usize,
        announce_size: bool,
    },
    Failure {
        kind: io::ErrorKind,
        message: String,
    },
}

/// In-memory sources for embedded assets and tests.
#[derive(Default)]
pub struct MemoryAssetReader {
    entries: RwLock<FxHashMap<String, MemoryEntry>>,
    latency: Option<Duration>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits `latency` before delivering each chunk.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serves `bytes` in chunks of `chunk_size`, announcing the total size.
    pub fn insert(&self, uri: impl Into<String>, bytes: Vec<u8>, chunk_size: usize) {
        self.put(uri.into(), bytes, chunk_size, true);
    }

    /// Like [`insert`](Self::insert) but without announcing a total.
    pub fn insert_unsized(&self, uri: impl Into<String>, bytes: Vec<u8>, chunk_size: usize) {
        self.put(uri.into(), bytes, chunk_size, false);
    }

    /// Makes every read of `uri` fail with the given error.
    pub fn insert_failure(&self, uri: impl Into<String>, kind: io::ErrorKind, message: impl Into<String>) {
        self.entries.write().insert(
            uri.into(),
            MemoryEntry::Failure {
                kind,
                message: message.into(),
            },
        );
    }

    fn put(&self, uri: String, bytes: Vec<u8>, chunk_size: usize, announce_size: bool) {
        self.entries.write().insert(
            uri,
            MemoryEntry::Data {
                bytes: Arc::new(bytes),
                chunk_size: chunk_size.max(1),
                announce_size,
            },
        );
    }
}

impl AssetReader for MemoryAssetReader {
    async fn read_bytes(&self, uri: &str, on_chunk: ChunkCallback<'_>) -> io::Result<Vec<u8>> {
        let entry = self.entries.read().get(uri).cloned();
        let (bytes, chunk_size, announce_size) = match entry {
            Some(MemoryEntry::Data {
                bytes,
                chunk_size,
                announce_size,
            }) => (bytes, chunk_size, announce_size),
            Some(MemoryEntry::Failure { kind, message }) => return Err(io::Error::new(kind, message)),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no in-memory asset at '{uri}'"),
                ));
            }
        };

        let total = announce_size.then_some(bytes.len() as u64);
        let mut data = Vec::with_capacity(bytes.len());
        for chunk in bytes.chunks(chunk_size) {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            data.extend_from_slice(chunk);
            on_chunk(data.len() as u64, total);
        }
        Ok(data)
    }
}

// ============================================================================
// HTTP
// ============================================================================

#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> io::Result<Self> {
        let url = url::Url::parse(url_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            let mut u = url.clone();
            if let Ok(mut segments) = u.path_segments_mut() {
                segments.pop();
                segments.push("");
            }
            u
        };
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str, on_chunk: ChunkCallback<'_>) -> io::Result<Vec<u8>> {
        let url = self
            .root_url
            .join(uri)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // The streaming fetch runs on its own thread; parts come back over a
        // channel. Dropping this future drops the receiver, which stops it.
        let (tx, rx) = flume::unbounded();
        ehttp::streaming::fetch(ehttp::Request::get(url.as_str()), move |part| {
            let last = match &part {
                Ok(Part::Response(response)) => !response.ok,
                Ok(Part::Chunk(chunk)) => chunk.is_empty(),
                Err(_) => true,
            };
            if tx.send(part).is_err() || last {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        let mut total = None;
        let mut bytes = Vec::new();
        loop {
            let part = rx
                .recv_async()
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, format!("{url}: connection closed early")))?;
            match part.map_err(io::Error::other)? {
                Part::Response(response) => {
                    if !response.ok {
                        return Err(io::Error::other(format!(
                            "HTTP {} {} for {url}",
                            response.status, response.status_text
                        )));
                    }
                    total = response
                        .headers
                        .get("content-length")
                        .and_then(|v| v.parse::<u64>().ok());
                    if let Some(total) = total {
                        bytes.reserve(total as usize);
                    }
                }
                // an empty chunk ends the body
                Part::Chunk(chunk) if chunk.is_empty() => break,
                Part::Chunk(chunk) => {
                    bytes.extend_from_slice(&chunk);
                    on_chunk(bytes.len() as u64, total);
                }
            }
        }
        Ok(bytes)
    }
}

// ============================================================================
// Variant
// ============================================================================

/// Reader selected at runtime, without a trait object.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    Memory(Arc<MemoryAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// Picks a reader for a local directory or a base URL.
    pub fn from_source(source: &str) -> io::Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "HTTP sources need the `http` feature",
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }

    #[must_use]
    pub fn memory(reader: MemoryAssetReader) -> Self {
        Self::Memory(Arc::new(reader))
    }

    pub async fn read_bytes(&self, uri: &str, on_chunk: ChunkCallback<'_>) -> io::Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri, on_chunk).await,
            Self::Memory(r) => r.read_bytes(uri, on_chunk).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri, on_chunk).await,
        }
    }

    /// File name part of a path or URL.
    #[must_use]
    pub fn source_filename(source: &str) -> &str {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn memory_reader_reports_each_chunk() {
        let reader = MemoryAssetReader::new();
        reader.insert("a.bin", vec![7u8; 10], 4);

        let seen = Mutex::new(Vec::new());
        let data = pollster::block_on(reader.read_bytes("a.bin", &|loaded, total| {
            seen.lock().push((loaded, total));
        }))
        .unwrap();

        assert_eq!(data.len(), 10);
        assert_eq!(*seen.lock(), vec![(4, Some(10)), (8, Some(10)), (10, Some(10))]);
    }

    #[test]
    fn missing_memory_asset_is_not_found() {
        let reader = MemoryAssetReader::new();
        let err = pollster::block_on(reader.read_bytes("nope", &|_, _| {})).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    /// Serves one canned HTTP response on a local port, body in two writes.
    #[cfg(feature = "http")]
    fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
            stream.write_all(head.as_bytes()).unwrap();
            let (first, second) = body.split_at(body.len() / 2);
            stream.write_all(first).unwrap();
            stream.flush().unwrap();
            std::thread::sleep(Duration::from_millis(50));
            stream.write_all(second).unwrap();
        });
        format!("http://{addr}/assets/")
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_reader_reports_progress_while_streaming() {
        let body: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let reader = HttpAssetReader::new(&serve_once("200 OK", body.clone())).unwrap();

        let seen = Mutex::new(Vec::new());
        let data = pollster::block_on(reader.read_bytes("model.glb", &|loaded, total| {
            seen.lock().push((loaded, total));
        }))
        .unwrap();

        assert_eq!(data, body);
        let seen = seen.lock();
        let total = body.len() as u64;
        assert!(seen.len() >= 2, "{seen:?}");
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(seen.iter().all(|&(_, t)| t == Some(total)));
        assert_eq!(seen.last(), Some(&(total, Some(total))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_error_status_is_an_error() {
        let reader = HttpAssetReader::new(&serve_once("404 Not Found", Vec::new())).unwrap();
        let err = pollster::block_on(reader.read_bytes("missing.glb", &|_, _| {})).unwrap_err();
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[test]
    fn source_filename_handles_urls_and_paths() {
        assert_eq!(AssetReaderVariant::source_filename("https://x.org/m/model.glb"), "model.glb");
        assert_eq!(AssetReaderVariant::source_filename("assets/env.hdr"), "env.hdr");
    }
}
