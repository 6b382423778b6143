//! Image decode worker - runs in a separate thread

use std::fs;

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::{LoadError, PageImage, PageLoader, PageSource, SourceKind};

type DecodeReply = Result<PageImage, LoadError>;

/// Request sent to the decode worker
enum DecodeRequest {
    /// Decode one page and answer on `reply`
    Decode {
        source: PageSource,
        reply: Sender<DecodeReply>,
    },

    /// Stop the worker
    Shutdown,
}

/// Loads pages by decoding them on a background thread.
///
/// The caller's thread only waits on the reply channel, so decoding a large
/// page never blocks the executor driving the preload pipeline.
pub struct ImageLoader {
    request_tx: Sender<DecodeRequest>,
}

impl ImageLoader {
    #[must_use]
    pub fn new() -> Self {
        let (request_tx, request_rx) = flume::unbounded();

        std::thread::spawn(move || {
            decode_worker(request_rx);
        });

        Self { request_tx }
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PageLoader for ImageLoader {
    async fn load(&self, source: &PageSource) -> Result<PageImage, LoadError> {
        let (reply, response) = flume::bounded(1);

        self.request_tx
            .send(DecodeRequest::Decode {
                source: source.clone(),
                reply,
            })
            .map_err(|_| LoadError::WorkerUnavailable)?;

        response
            .recv_async()
            .await
            .map_err(|_| LoadError::WorkerUnavailable)?
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        let _ = self.request_tx.send(DecodeRequest::Shutdown);
    }
}

fn decode_worker(requests: Receiver<DecodeRequest>) {
    for request in requests {
        match request {
            DecodeRequest::Decode { source, reply } => {
                let result = decode_page(&source);
                if let Err(e) = &result {
                    warn!("Failed to decode page '{source}': {e}");
                }
                let _ = reply.send(result);
            }

            DecodeRequest::Shutdown => break,
        }
    }
    debug!("Decode worker stopped");
}

/// Read and decode a single page synchronously
pub fn decode_page(source: &PageSource) -> Result<PageImage, LoadError> {
    let image = match source.kind()? {
        SourceKind::File(path) => {
            let bytes = fs::read(&path).map_err(|e| LoadError::Io {
                path: path.clone(),
                source: e,
            })?;
            image::load_from_memory(&bytes)?
        }
        SourceKind::Data {
            media_type,
            payload,
        } => {
            debug!("Decoding inline {media_type} page ({} bytes)", payload.len());
            image::load_from_memory(&payload)?
        }
    };

    debug!(
        "Decoded page '{source}': {}x{}",
        image.width(),
        image.height()
    );
    Ok(PageImage::new(source.clone(), image.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY_GIF: &str = "data:image/gif;base64,R0lGODlhAQABAPAAAKqqqv///yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==";

    #[test]
    fn decodes_inline_gif() {
        let page = decode_page(&PageSource::from(GRAY_GIF)).unwrap();
        assert_eq!((page.width(), page.height()), (1, 1));
        assert_eq!(page.source().as_str(), GRAY_GIF);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = decode_page(&PageSource::from("/definitely/not/here/page.png"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let result = decode_page(&PageSource::from("data:image/png,not-an-image"));
        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn loader_round_trips_through_worker() {
        let loader = ImageLoader::new();
        let page = smol::block_on(loader.load(&PageSource::from(GRAY_GIF))).unwrap();
        assert_eq!(page.width(), 1);
    }
}
