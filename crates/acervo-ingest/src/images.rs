//! Filesystem-backed image storage

use acervo_domain::traits::{ImageStore, Upload};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Extensions kept from the uploaded file name
const KNOWN_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "tif", "tiff"];

/// Errors from the filesystem image store
#[derive(Error, Debug)]
pub enum ImageStoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The URL was not issued by this store
    #[error("Not an image reference of this store: {0}")]
    ForeignUrl(String),
}

/// Stores images as files in one directory and serves them under a URL prefix
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsImageStore {
    /// Create the store, making `root` if it does not exist
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Result<Self, ImageStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Read back the bytes behind a reference issued by [`ImageStore::store`]
    pub fn read(&self, url: &str) -> Result<Vec<u8>, ImageStoreError> {
        Ok(fs::read(self.path_for(url)?)?)
    }

    /// URL prefix under which stored images are referenced
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Map a reference URL back to a file in the store directory
    fn path_for(&self, url: &str) -> Result<PathBuf, ImageStoreError> {
        let foreign = || ImageStoreError::ForeignUrl(url.to_string());
        let name = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(foreign)?;

        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(foreign());
        }
        Ok(self.root.join(name))
    }
}

impl ImageStore for FsImageStore {
    type Error = ImageStoreError;

    fn store(&self, image: &Upload) -> Result<String, Self::Error> {
        let file_name = format!("{}.{}", uuid::Uuid::now_v7(), image_extension(image));
        fs::write(self.root.join(&file_name), &image.bytes)?;

        debug!("Stored image {} ({} bytes)", file_name, image.bytes.len());

        Ok(format!("{}/{}", self.public_base_url, file_name))
    }

    fn discard(&self, url: &str) -> Result<(), Self::Error> {
        let path = self.path_for(url)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Pick a file extension from the upload's name, then its MIME type
fn image_extension(image: &Upload) -> &'static str {
    let from_name = image
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| KNOWN_EXTENSIONS.iter().find(|known| **known == ext).copied());

    let from_type = || match image.content_type.as_deref()? {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/tiff" => Some("tif"),
        _ => None,
    };

    match from_name.or_else(from_type).unwrap_or("bin") {
        "jpeg" => "jpg",
        "tiff" => "tif",
        ext => ext,
    }
}
