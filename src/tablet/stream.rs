//! Streaming Tablet Reader
//!
//! Consumes a tablet front to back from any [`Read`] without seeking,
//! e.g. a socket or a pipe. The footer and index are never read: data
//! blocks are decoded in file order until the meta-index magic shows up,
//! so every block is scanned even when a term is given.
//!
//! [`StreamTablet::copy_to`] uses the same walk to receive a tablet into a
//! new file while reporting the entries it carries.

use std::io::{self, Cursor, Read, Write};

use crate::block::{BlockIter, DataBlock};
use crate::codec::read_uint_from;
use crate::config::ReaderOptions;
use crate::error::{KvError, Result};
use crate::kv::KeyValue;
use crate::view::ByteView;

use super::format::{
    self, into_validation, BlockHeader, BLOCK_META, HEADER_SIZE, META_INDEX_MAGIC,
};

/// A tablet read sequentially from a byte stream
pub struct StreamTablet<R: Read> {
    reader: R,
    opts: ReaderOptions,
}

impl<R: Read> StreamTablet<R> {
    pub fn new(reader: R, opts: ReaderOptions) -> Self {
        Self { reader, opts }
    }

    /// Validate the header and stream the entries `>= term` of every block
    pub fn find(mut self, term: Option<&[u8]>) -> Result<StreamIter<R>> {
        let mut header = [0u8; HEADER_SIZE];
        read_exact(&mut self.reader, &mut header)?;
        format::check_header(&header)?;

        Ok(StreamIter {
            reader: self.reader,
            opts: self.opts,
            term: term.filter(|t| !t.is_empty()).map(<[u8]>::to_vec),
            current: BlockIter::empty(),
            blocks_read: 0,
            done: false,
        })
    }

    /// Copy the whole tablet into `out`, handing every data block's
    /// entries to `on_entries` as it goes by
    ///
    /// Header, framing and payloads are copied byte for byte so the index
    /// offsets in the copied tail stay valid. Checksums are always
    /// verified here. Meta blocks are copied but not reported. Returns the
    /// number of bytes written.
    pub fn copy_to<W, F>(mut self, out: &mut W, mut on_entries: F) -> Result<u64>
    where
        W: Write,
        F: FnMut(Vec<KeyValue>),
    {
        let mut header = [0u8; HEADER_SIZE];
        read_exact(&mut self.reader, &mut header)?;
        format::check_header(&header)?;
        out.write_all(&header)?;
        let mut copied = HEADER_SIZE as u64;

        let opts = self.opts.verify_checksums(true);
        while let Some(block) = read_stored_block(&mut self.reader)? {
            out.write_all(&block.framing)?;
            out.write_all(&block.payload)?;
            copied += (block.framing.len() + block.payload.len()) as u64;

            let header = block.header;
            let raw = format::decode_payload(&header, ByteView::from(block.payload), &opts)?;
            if header.block_type & BLOCK_META != 0 {
                continue;
            }
            let entries = DataBlock::new(raw)
                .and_then(|b| b.find(None))
                .and_then(|iter| iter.collect::<Result<Vec<_>>>())
                .map_err(into_validation)?;
            on_entries(entries);
        }

        // Meta index, data index and footer go across untouched.
        out.write_all(&META_INDEX_MAGIC.to_be_bytes())?;
        copied += 4 + io::copy(&mut self.reader, out)?;
        out.flush()?;
        Ok(copied)
    }
}

/// Entries of a streamed tablet
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct StreamIter<R: Read> {
    reader: R,
    opts: ReaderOptions,
    term: Option<Vec<u8>>,
    current: BlockIter,
    blocks_read: usize,
    done: bool,
}

impl<R: Read> StreamIter<R> {
    /// Data blocks consumed so far
    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    /// Read the next data block, or `None` at the meta index
    fn next_block(&mut self) -> Result<Option<DataBlock>> {
        let block = match read_stored_block(&mut self.reader)? {
            Some(block) => block,
            None => return Ok(None),
        };
        let raw = format::decode_payload(&block.header, ByteView::from(block.payload), &self.opts)?;
        self.blocks_read += 1;
        DataBlock::new(raw).map(Some).map_err(into_validation)
    }
}

impl<R: Read> Iterator for StreamIter<R> {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.current.next() {
                Some(Ok(kv)) => return Some(Ok(kv)),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(into_validation(e)));
                }
                None => {}
            }
            let block = match self.next_block() {
                Ok(Some(block)) => block,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            match block.find(self.term.as_deref()) {
                Ok(iter) => self.current = iter,
                Err(e) => {
                    self.done = true;
                    return Some(Err(into_validation(e)));
                }
            }
        }
    }
}

/// A stored block exactly as it appeared on the stream
struct StoredBlock {
    /// Encoded block header bytes as read
    framing: Vec<u8>,
    header: BlockHeader,
    payload: Vec<u8>,
}

/// Read one stored block, or `None` when the meta-index magic comes next
///
/// The payload is read through `take`, so a corrupt length can never
/// allocate more than the stream actually holds.
fn read_stored_block<R: Read>(reader: &mut R) -> Result<Option<StoredBlock>> {
    let mut peek = [0u8; 4];
    read_exact(reader, &mut peek)?;
    if u32::from_be_bytes(peek) == META_INDEX_MAGIC {
        return Ok(None);
    }

    // The peeked bytes belong to the block header; replay them first.
    let mut input = Cursor::new(peek).chain(reader);
    let mut framing = Vec::new();
    let header = {
        let mut rec = Recorder {
            inner: &mut input,
            seen: &mut framing,
        };
        let checksum = read_uint_from(&mut rec).map_err(into_validation)?;
        let block_type = read_uint_from(&mut rec).map_err(into_validation)?;
        let length = read_uint_from(&mut rec).map_err(into_validation)?;
        BlockHeader {
            checksum: u32::try_from(checksum).map_err(|_| {
                KvError::validation(format!("block checksum {} exceeds 32 bits", checksum))
            })?,
            block_type,
            length,
        }
    };

    let mut payload = Vec::new();
    (&mut input).take(header.length).read_to_end(&mut payload)?;
    if payload.len() as u64 != header.length {
        return Err(KvError::validation("truncated tablet stream"));
    }
    Ok(Some(StoredBlock {
        framing,
        header,
        payload,
    }))
}

/// Keeps a copy of every byte read through it
struct Recorder<'a, R> {
    inner: R,
    seen: &'a mut Vec<u8>,
}

impl<R: Read> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => KvError::validation("truncated tablet stream"),
        _ => KvError::Io(e),
    })
}
