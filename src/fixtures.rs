//! Fixture files attached by scenarios

use std::path::{Component, Path, PathBuf};

use action_primitives::FileDescriptor;
use tracing::debug;

use crate::errors::{FlowcheckError, Result};

/// Read-only view of the fixtures directory
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `relative` under the root; absolute paths and `..` are refused.
    pub fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if escapes || relative.as_os_str().is_empty() {
            return Err(FlowcheckError::FixtureOutsideRoot(
                relative.display().to_string(),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Reads a fixture into a [`FileDescriptor`].
    ///
    /// `file_name` defaults to the fixture's own file name and `mime_type` is
    /// inferred from the extension when not given.
    pub fn load(
        &self,
        relative: &Path,
        file_name: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<FileDescriptor> {
        let path = self.resolve(relative)?;
        let content = std::fs::read(&path).map_err(|err| FlowcheckError::io(&path, err))?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => relative
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| infer_mime(relative));
        debug!(
            fixture = %path.display(),
            bytes = content.len(),
            mime = %mime_type,
            "fixture loaded"
        );
        Ok(FileDescriptor::new(content, file_name, mime_type))
    }
}

/// MIME type for a file extension, `application/octet-stream` when unknown
pub fn infer_mime(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn infers_common_types() {
        assert_eq!(infer_mime(Path::new("images/photo.JPG")), "image/jpeg");
        assert_eq!(infer_mime(Path::new("doc.pdf")), "application/pdf");
        assert_eq!(infer_mime(Path::new("avatar.png")), "image/png");
        assert_eq!(infer_mime(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn refuses_paths_leaving_the_root() {
        let store = FixtureStore::new("fixtures");
        for bad in ["../secret", "/etc/passwd", "images/../../x", ""] {
            assert!(
                matches!(
                    store.resolve(Path::new(bad)),
                    Err(FlowcheckError::FixtureOutsideRoot(_))
                ),
                "{bad} should be refused"
            );
        }
        assert_eq!(
            store.resolve(Path::new("./images/photo.jpg")).unwrap(),
            PathBuf::from("fixtures/./images/photo.jpg")
        );
    }

    #[test]
    fn loads_bytes_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0xff, 0xd9];
        std::fs::write(dir.path().join("images/photo.jpg"), &bytes).unwrap();
        let store = FixtureStore::new(dir.path());

        let file = store.load(Path::new("images/photo.jpg"), None, None).unwrap();
        assert_eq!(file.content, bytes);
        assert_eq!(file.file_name, "photo.jpg");
        assert_eq!(file.mime_type, "image/jpeg");

        let renamed = store
            .load(Path::new("images/photo.jpg"), Some("avatar"), Some("image/x-test"))
            .unwrap();
        assert_eq!(renamed.file_name, "avatar");
        assert_eq!(renamed.mime_type, "image/x-test");
    }

    #[test]
    fn missing_fixture_is_an_io_error() {
        let store = FixtureStore::new("does-not-exist");
        assert!(matches!(
            store.load(Path::new("photo.jpg"), None, None),
            Err(FlowcheckError::Io { .. })
        ));
    }
}
