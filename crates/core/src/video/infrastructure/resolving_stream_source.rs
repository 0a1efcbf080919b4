use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::source_reference::SourceReference;
use crate::video::domain::stream_source::{SourceError, StreamSource};
use crate::video::domain::url_resolver::UrlResolver;

/// Resolves page URLs to direct media URLs before handing them to the
/// wrapped source. Other references pass straight through.
pub struct ResolvingStreamSource {
    inner: Box<dyn StreamSource>,
    resolver: Box<dyn UrlResolver>,
}

impl ResolvingStreamSource {
    pub fn new(inner: Box<dyn StreamSource>, resolver: Box<dyn UrlResolver>) -> Self {
        Self { inner, resolver }
    }
}

impl StreamSource for ResolvingStreamSource {
    fn open(&mut self, reference: &SourceReference) -> Result<VideoMetadata, SourceError> {
        let SourceReference::YouTube(page_url) = reference else {
            return self.inner.open(reference);
        };

        // Direct URLs expire, so resolve on every open.
        let direct = self.resolver.resolve(page_url)?;
        log::debug!("Resolved {page_url} to a direct stream URL");

        let mut metadata = self.inner.open(&SourceReference::Remote(direct))?;
        metadata.source = page_url.clone();
        Ok(metadata)
    }

    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        self.inner.read()
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::url_resolver::ResolutionError;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct RecordingSource {
        opened: Arc<Mutex<Vec<SourceReference>>>,
    }

    impl StreamSource for RecordingSource {
        fn open(&mut self, reference: &SourceReference) -> Result<VideoMetadata, SourceError> {
            self.opened.lock().unwrap().push(reference.clone());
            Ok(VideoMetadata {
                width: 4,
                height: 4,
                fps: 30.0,
                total_frames: 0,
                codec: "h264".to_string(),
                source: reference.to_string(),
                rotation: 0,
            })
        }

        fn read(&mut self) -> Result<Option<Frame>, SourceError> {
            Ok(None)
        }

        fn close(&mut self) {}
    }

    struct StubResolver {
        result: Result<String, ()>,
        calls: Arc<Mutex<usize>>,
    }

    impl UrlResolver for StubResolver {
        fn resolve(&self, page_url: &str) -> Result<String, ResolutionError> {
            *self.calls.lock().unwrap() += 1;
            self.result.clone().map_err(|_| ResolutionError::Failed {
                url: page_url.to_string(),
                message: "Video unavailable".to_string(),
            })
        }
    }

    fn build(
        result: Result<String, ()>,
    ) -> (
        ResolvingStreamSource,
        Arc<Mutex<Vec<SourceReference>>>,
        Arc<Mutex<usize>>,
    ) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(0));
        let source = ResolvingStreamSource::new(
            Box::new(RecordingSource {
                opened: opened.clone(),
            }),
            Box::new(StubResolver {
                result,
                calls: calls.clone(),
            }),
        );
        (source, opened, calls)
    }

    #[test]
    fn test_youtube_reference_is_resolved_before_open() {
        let (mut source, opened, calls) = build(Ok("https://media.example/v.mp4".to_string()));
        let page = SourceReference::YouTube("https://youtu.be/abc".to_string());

        let meta = source.open(&page).unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(
            opened.lock().unwrap().as_slice(),
            &[SourceReference::Remote(
                "https://media.example/v.mp4".to_string()
            )]
        );
        assert_eq!(meta.source, "https://youtu.be/abc");
    }

    #[test]
    fn test_every_open_resolves_again() {
        let (mut source, _, calls) = build(Ok("https://media.example/v.mp4".to_string()));
        let page = SourceReference::YouTube("https://youtu.be/abc".to_string());

        source.open(&page).unwrap();
        source.close();
        source.open(&page).unwrap();

        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_files_bypass_the_resolver() {
        let (mut source, opened, calls) = build(Err(()));
        let file = SourceReference::File(PathBuf::from("face.mp4"));

        source.open(&file).unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(opened.lock().unwrap().as_slice(), &[file]);
    }

    #[test]
    fn test_resolution_failure_surfaces_as_source_error() {
        let (mut source, opened, _) = build(Err(()));
        let page = SourceReference::YouTube("https://youtu.be/gone".to_string());

        let err = source.open(&page).unwrap_err();

        assert!(
            matches!(err, SourceError::Resolution(ResolutionError::Failed { .. })),
            "{err:?}"
        );
        assert!(opened.lock().unwrap().is_empty());
    }
}
