//! Sequential part reads from an archive stream

use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{ClientError, Result};

/// One part's worth of archive bytes, read in order
#[derive(Debug, Clone)]
pub struct PartChunk {
    pub index: u64,
    pub offset: u64,
    pub body: Bytes,
}

/// Reads an archive front to back in `part_size` chunks.
///
/// Holds at most one chunk at a time; the next read starts only when the
/// caller asks for it, so nothing is read ahead of an outstanding upload.
#[derive(Debug)]
pub struct PartReader<R> {
    inner: R,
    part_size: usize,
    index: u64,
    offset: u64,
    exhausted: bool,
}

impl PartReader<File> {
    /// Open `path` for part-sized reads
    pub async fn open(path: &Path, part_size: u64) -> Result<Self> {
        let file = File::open(path).await.map_err(|e| {
            ClientError::validation(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::new(file, part_size)
    }
}

impl<R: AsyncRead + Unpin> PartReader<R> {
    /// Wrap any async byte source
    pub fn new(inner: R, part_size: u64) -> Result<Self> {
        let part_size = usize::try_from(part_size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| ClientError::validation(format!("unusable part size {}", part_size)))?;

        Ok(PartReader {
            inner,
            part_size,
            index: 0,
            offset: 0,
            exhausted: false,
        })
    }

    /// Read the next part; `None` at end of stream.
    ///
    /// Every part except the last is exactly `part_size` bytes.
    pub async fn next_part(&mut self) -> Result<Option<PartChunk>> {
        // a short read already hit EOF; skip the part-sized allocation
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = BytesMut::zeroed(self.part_size);
        let mut filled = 0;

        while filled < self.part_size {
            let n = self.inner.read(&mut buf[filled..]).await?;
            if n == 0 {
                self.exhausted = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = PartChunk {
            index: self.index,
            offset: self.offset,
            body: buf.freeze(),
        };
        self.index += 1;
        self.offset += filled as u64;
        Ok(Some(chunk))
    }

    /// Bytes handed out so far
    pub fn offset(&self) -> u64 {
        self.offset
    }
}
