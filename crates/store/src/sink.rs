//! Artifact sink writing one file per format into the output directory.

use std::fs;
use std::path::PathBuf;

use pipeline::{
    ArtifactSink, RenderedArtifacts, RunStamp, SinkError, ARTIFACT_PREFIX, DIGEST_MARKDOWN_SUFFIX,
    DOCUMENT_EXTENSION, FULL_MARKDOWN_SUFFIX, HTML_EXTENSION,
};
use tracing::info;

/// Writes `<output_dir>/AbstractReview_<stamp><suffix>{.docx,.md,_simple.md,.html}`.
#[derive(Debug, Clone)]
pub struct FileArtifactSink {
    output_dir: PathBuf,
    suffix: String,
}

impl FileArtifactSink {
    pub fn new(output_dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            suffix: suffix.into(),
        }
    }

    /// Common path prefix of every artifact of the run stamped `stamp`.
    pub fn prefix(&self, stamp: &RunStamp) -> PathBuf {
        self.output_dir
            .join(format!("{ARTIFACT_PREFIX}{stamp}{}", self.suffix))
    }

    fn with_suffix(&self, stamp: &RunStamp, suffix: &str) -> PathBuf {
        let mut path = self.prefix(stamp).into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }
}

impl ArtifactSink for FileArtifactSink {
    fn write(&self, stamp: &RunStamp, artifacts: &RenderedArtifacts) -> Result<Vec<PathBuf>, SinkError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| SinkError(format!("{}: {e}", self.output_dir.display())))?;

        // The markdown is written before the HTML derived from it.
        let outputs: [(&str, &[u8]); 4] = [
            (DOCUMENT_EXTENSION, artifacts.document.as_slice()),
            (FULL_MARKDOWN_SUFFIX, artifacts.full_markdown.as_bytes()),
            (DIGEST_MARKDOWN_SUFFIX, artifacts.digest_markdown.as_bytes()),
            (HTML_EXTENSION, artifacts.html.as_bytes()),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (suffix, bytes) in outputs {
            let path = self.with_suffix(stamp, suffix);
            info!(path = %path.display(), "Writing file");
            fs::write(&path, bytes).map_err(|e| SinkError(format!("{}: {e}", path.display())))?;
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifacts() -> RenderedArtifacts {
        RenderedArtifacts {
            document: b"PK\x03\x04".to_vec(),
            full_markdown: "## Title".into(),
            digest_markdown: "## Title (digest)".into(),
            html: "<head><meta charset=\"UTF-8\"></head>\n<body>\n<h2>Title</h2>\n</body>\n".into(),
            article_count: 1,
        }
    }

    #[test]
    fn writes_all_four_files_with_a_shared_prefix() {
        let dir = TempDir::new().unwrap();
        let sink = FileArtifactSink::new(dir.path().join("ToReview"), "");
        let stamp = RunStamp::new("2024-05-01T08-00-00_000001");

        let written = sink.write(&stamp, &artifacts()).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "AbstractReview_2024-05-01T08-00-00_000001.docx",
                "AbstractReview_2024-05-01T08-00-00_000001.md",
                "AbstractReview_2024-05-01T08-00-00_000001_simple.md",
                "AbstractReview_2024-05-01T08-00-00_000001.html",
            ]
        );
        assert_eq!(fs::read_to_string(&written[2]).unwrap(), "## Title (digest)");
    }

    #[test]
    fn suffix_follows_the_stamp() {
        let sink = FileArtifactSink::new("/out", "_weekly");
        let prefix = sink.prefix(&RunStamp::new("s"));
        assert_eq!(prefix, PathBuf::from("/out/AbstractReview_s_weekly"));
    }
}
