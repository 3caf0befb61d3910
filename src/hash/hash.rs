// Digest computation module
// BLAKE3 digest adapter: streaming file hashing, symlink target hashing,
// modification-time binding, and the two display encodings

use super::error::HashUtilityError;
use super::path_utils;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::fs::{self, File, Metadata};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Trait for streaming digest implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the digest and return the raw bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Raw digest length produced per file (BLAKE3 extended output)
pub const DIGEST_LEN: usize = 64;

/// Bytes shown in hexadecimal output
pub const HEX_BYTES: usize = 32;

/// Bytes carried by the tagged output
pub const TAGGED_BYTES: usize = 33;

/// Tag naming the primitive and byte count of the tagged output
pub const TAG_PREFIX: &str = "blake3.33B-";

/// UTC, nanosecond precision, numeric zone: 2006-01-02T15:04:05.000000000+00:00
pub const MODTIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f%:z";

/// BLAKE3 with a 64 byte extended output
pub struct Blake3Wrapper(blake3::Hasher);

impl Blake3Wrapper {
    pub fn new() -> Self {
        Self(blake3::Hasher::new())
    }
}

impl Default for Blake3Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        let mut out = vec![0u8; DIGEST_LEN];
        self.0.finalize_xof().fill(&mut out);
        out
    }
}

/// How digests are rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestEncoding {
    /// `blake3.33B-` followed by URL-safe base64 of the first 33 bytes
    #[default]
    Tagged,
    /// Lowercase hex of the first 32 bytes
    Hex,
}

impl DigestEncoding {
    pub fn encode(&self, digest: &[u8]) -> String {
        match self {
            DigestEncoding::Hex => hex::encode(&digest[..HEX_BYTES.min(digest.len())]),
            DigestEncoding::Tagged => format!(
                "{}{}",
                TAG_PREFIX,
                URL_SAFE.encode(&digest[..TAGGED_BYTES.min(digest.len())])
            ),
        }
    }
}

/// Format a modification time the way it is bound into digests
pub fn format_modtime(time: SystemTime) -> String {
    let utc: DateTime<Utc> = time.into();
    utc.format(MODTIME_FORMAT).to_string()
}

fn modtime_of(meta: &Metadata, path: &Path) -> Result<String, HashUtilityError> {
    let modified = meta.modified().map_err(|e| {
        HashUtilityError::from_io_error(e, "reading modification time of", Some(path.to_path_buf()))
    })?;
    Ok(format_modtime(modified))
}

/// Result of one digest computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    pub file_path: PathBuf,
    /// Raw digest bytes
    pub digest: Vec<u8>,
    /// Display form in the computer's encoding
    pub encoded: String,
    /// Content bytes consumed (zero for hashed symlink targets)
    pub bytes: u64,
}

/// Digest computer with streaming I/O
///
/// Holds only immutable settings, so one instance is shared by every worker.
#[derive(Debug, Clone)]
pub struct HashComputer {
    buffer_size: usize,
    follow_symlinks: bool,
    bind_modtime: bool,
    encoding: DigestEncoding,
}

impl Default for HashComputer {
    fn default() -> Self {
        Self::new()
    }
}

impl HashComputer {
    /// Create a new HashComputer with default buffer size (1MB)
    pub fn new() -> Self {
        Self {
            buffer_size: 1024 * 1024,
            follow_symlinks: true,
            bind_modtime: false,
            encoding: DigestEncoding::default(),
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Bind each file's modification time into its digest
    pub fn with_modtime(mut self, bind: bool) -> Self {
        self.bind_modtime = bind;
        self
    }

    pub fn with_encoding(mut self, encoding: DigestEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn encoding(&self) -> DigestEncoding {
        self.encoding
    }

    /// A fresh digest context
    pub fn new_hasher(&self) -> Box<dyn Hasher> {
        Box::new(Blake3Wrapper::new())
    }

    /// Render raw digest bytes in this computer's encoding
    pub fn encode(&self, digest: &[u8]) -> String {
        self.encoding.encode(digest)
    }

    /// Compute the digest of a string (no modification time involved)
    pub fn compute_hash_text(&self, text: &str) -> String {
        let mut hasher = self.new_hasher();
        hasher.update(text.as_bytes());
        self.encode(&hasher.finalize())
    }

    /// Compute the digest for one path
    ///
    /// A symlink that is not being followed, or whose target does not exist,
    /// is hashed by its target path string rather than by content. With
    /// modification-time binding the formatted mtime is fed after the content.
    pub fn compute_digest(&self, path: &Path) -> Result<HashResult, HashUtilityError> {
        let link_meta = fs::symlink_metadata(path).map_err(|e| {
            HashUtilityError::from_io_error(e, "reading metadata of", Some(path.to_path_buf()))
        })?;

        if link_meta.file_type().is_symlink() {
            let target = fs::read_link(path).map_err(|e| {
                HashUtilityError::from_io_error(e, "reading symlink", Some(path.to_path_buf()))
            })?;
            let resolved = path_utils::link_target_from(path, &target);
            let target_is_file = fs::metadata(&resolved).map(|m| !m.is_dir()).unwrap_or(false);

            if !self.follow_symlinks || !target_is_file {
                let mut hasher = self.new_hasher();
                hasher.update(target.to_string_lossy().as_bytes());
                if self.bind_modtime {
                    hasher.update(modtime_of(&link_meta, path)?.as_bytes());
                }
                return Ok(self.finish(hasher, path, 0));
            }
        }

        let file = File::open(path).map_err(|e| {
            HashUtilityError::from_io_error(e, "reading", Some(path.to_path_buf()))
        })?;
        let meta = file.metadata().map_err(|e| {
            HashUtilityError::from_io_error(e, "reading metadata of", Some(path.to_path_buf()))
        })?;

        let mut hasher = self.new_hasher();
        let bytes = self.hash_with_buffered_io(&mut hasher, file, path)?;

        if self.bind_modtime {
            hasher.update(modtime_of(&meta, path)?.as_bytes());
        }

        Ok(self.finish(hasher, path, bytes))
    }

    fn finish(&self, hasher: Box<dyn Hasher>, path: &Path, bytes: u64) -> HashResult {
        let digest = hasher.finalize();
        HashResult {
            file_path: path.to_path_buf(),
            encoded: self.encode(&digest),
            digest,
            bytes,
        }
    }

    /// Stream a file through the hasher, returning the bytes consumed
    ///
    /// A file that shrinks while being read simply ends early; a read
    /// failure surfaces as an error for this path only.
    fn hash_with_buffered_io(
        &self,
        hasher: &mut Box<dyn Hasher>,
        mut file: File,
        path: &Path,
    ) -> Result<u64, HashUtilityError> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total = 0u64;

        loop {
            let bytes_read = file.read(&mut buffer).map_err(|e| {
                HashUtilityError::from_io_error(e, "reading", Some(path.to_path_buf()))
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok(total)
    }
}
