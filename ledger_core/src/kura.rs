//! `Kura`: the append-only block store (`§4.2`).
//!
//! Grounded on the teacher's `core/src/kura.rs`: a flat file of
//! length-prefixed, CRC-checked block records plus an in-memory index of
//! file offsets, opened in either [`Mode::Strict`] (validate the whole
//! file and its hash chain at startup) or [`Mode::Fast`] (trust the file,
//! skip validation). Unlike the teacher, which keeps blocks and an index
//! file separate, this store keeps everything in one file — the spec's
//! scale doesn't warrant the teacher's separate merkle-index file.

use std::{
    io::SeekFrom,
    path::{Path, PathBuf},
};

use ledger_crypto::Hash;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
    sync::Mutex,
};

use crate::data_model::block::Block;

/// How strictly to validate the block file at startup.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    /// Read every block, recompute its hash, and check the `prev_hash`
    /// chain before returning from [`BlockStore::open`].
    #[default]
    Strict,
    /// Trust the on-disk index built while scanning for record
    /// boundaries; never hash or verify the chain.
    Fast,
}

/// Configuration for [`BlockStore::open`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KuraConfiguration {
    /// Directory the block file lives in; created if missing.
    pub block_store_path: PathBuf,
    /// Validation strictness at startup.
    pub mode: Mode,
}

impl Default for KuraConfiguration {
    fn default() -> Self {
        Self {
            block_store_path: PathBuf::from("./blocks"),
            mode: Mode::default(),
        }
    }
}

/// Errors raised by the block store.
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// I/O error accessing the block file
    Io(#[from] std::io::Error),
    /// failed to (de)serialize a block record
    Codec(#[from] serde_json::Error),
    /// block record at offset {offset} failed its checksum
    BadChecksum { offset: u64 },
    /// chain is broken: block at height {height} has prev_hash {got}, expected {expected}
    ChainBreak { height: u64, expected: Hash, got: Hash },
    /// attempted to append height {got}, expected {expected}
    NonSequentialHeight { expected: u64, got: u64 },
}

/// One physical record: `[u32 len][json body][u32 crc]`.
async fn read_record_at(file: &mut File, offset: u64) -> Result<Option<(Block, u64)>, Error> {
    file.seek(SeekFrom::Start(offset)).await?;
    let mut len_buf = [0_u8; 4];
    match file.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut body = vec![0_u8; len];
    file.read_exact(&mut body).await?;
    let mut crc_buf = [0_u8; 4];
    file.read_exact(&mut crc_buf).await?;
    let expected_crc = u32::from_le_bytes(crc_buf);
    if crc32(&body) != expected_crc {
        return Err(Error::BadChecksum { offset });
    }
    let block: Block = serde_json::from_slice(&body)?;
    let next_offset = offset + 4 + len as u64 + 4;
    Ok(Some((block, next_offset)))
}

fn crc32(bytes: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

fn encode_record(block: &Block) -> Result<Vec<u8>, Error> {
    let body = serde_json::to_vec(block)?;
    let mut record = Vec::with_capacity(8 + body.len());
    record.extend_from_slice(&(body.len() as u32).to_le_bytes());
    record.extend_from_slice(&body);
    record.extend_from_slice(&crc32(&body).to_le_bytes());
    Ok(record)
}

/// The append-only block store. Appends are serialized by an internal
/// [`Mutex`]; reads (`top`, `get_blocks`, `top_blocks`) only ever touch the
/// in-memory offset index plus a single `pread`-style seek, never the write
/// lock.
pub struct BlockStore {
    path: PathBuf,
    file: Mutex<File>,
    /// Byte offset of each block, indexed by `height - 1`.
    offsets: Mutex<Vec<u64>>,
    top_hash: Mutex<Hash>,
}

impl BlockStore {
    /// Opens (creating if absent) the block file named `blocks.dat` under
    /// `config.block_store_path`, replaying existing records into the
    /// offset index and validating the hash chain if `config.mode` is
    /// [`Mode::Strict`].
    ///
    /// # Errors
    /// Propagates I/O, codec, checksum or chain-break errors.
    pub async fn open(config: &KuraConfiguration) -> Result<Self, Error> {
        tokio::fs::create_dir_all(&config.block_store_path).await?;
        let path = config.block_store_path.join("blocks.dat");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;

        let mut offsets = Vec::new();
        let mut top_hash = Hash::ZERO;
        let mut offset = 0_u64;
        let mut expected_height = 1_u64;
        loop {
            match read_record_at(&mut file, offset).await? {
                None => break,
                Some((block, next_offset)) => {
                    if config.mode == Mode::Strict {
                        if block.header.height != expected_height {
                            return Err(Error::NonSequentialHeight {
                                expected: expected_height,
                                got: block.header.height,
                            });
                        }
                        if block.header.prev_hash != top_hash {
                            return Err(Error::ChainBreak {
                                height: block.header.height,
                                expected: top_hash,
                                got: block.header.prev_hash,
                            });
                        }
                        top_hash = block.hash().into_hash();
                    } else {
                        top_hash = block.hash().into_hash();
                    }
                    offsets.push(offset);
                    offset = next_offset;
                    expected_height += 1;
                }
            }
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            offsets: Mutex::new(offsets),
            top_hash: Mutex::new(top_hash),
        })
    }

    /// Number of blocks currently stored.
    pub async fn height(&self) -> u64 {
        self.offsets.lock().await.len() as u64
    }

    /// The on-disk path of the block file, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `block` durably: the record is written, then the file is
    /// flushed and `fsync`'d before this returns, so a crash immediately
    /// after a successful `append` never loses the block.
    ///
    /// # Errors
    /// [`Error::NonSequentialHeight`] if `block.header.height` does not
    /// continue the chain; [`Error::ChainBreak`] if `prev_hash` does not
    /// match the current top; I/O and codec errors otherwise.
    pub async fn append(&self, block: &Block) -> Result<(), Error> {
        let mut offsets = self.offsets.lock().await;
        let mut top_hash = self.top_hash.lock().await;
        let expected_height = offsets.len() as u64 + 1;
        if block.header.height != expected_height {
            return Err(Error::NonSequentialHeight {
                expected: expected_height,
                got: block.header.height,
            });
        }
        if block.header.prev_hash != *top_hash {
            return Err(Error::ChainBreak {
                height: block.header.height,
                expected: *top_hash,
                got: block.header.prev_hash,
            });
        }

        let record = encode_record(block)?;
        let mut file = self.file.lock().await;
        let write_offset = file.seek(SeekFrom::End(0)).await?;
        file.write_all(&record).await?;
        file.flush().await?;
        file.sync_data().await?;

        offsets.push(write_offset);
        *top_hash = block.hash().into_hash();
        Ok(())
    }

    /// The highest committed block, or `None` if the store is empty.
    ///
    /// # Errors
    /// I/O or codec errors reading the record back.
    pub async fn top(&self) -> Result<Option<Block>, Error> {
        let offsets = self.offsets.lock().await;
        let Some(&offset) = offsets.last() else {
            return Ok(None);
        };
        drop(offsets);
        let mut file = self.file.lock().await;
        Ok(read_record_at(&mut file, offset).await?.map(|(block, _)| block))
    }

    /// The current chain tip's hash, or [`Hash::ZERO`] if the store is
    /// empty.
    pub async fn top_hash(&self) -> Hash {
        *self.top_hash.lock().await
    }

    /// Reads blocks `[from, to]` inclusive, in ascending height order. If
    /// `from` is past the top the result is empty; if `to` is past the top
    /// the result truncates at the top.
    ///
    /// # Errors
    /// I/O or codec errors reading a record back.
    pub async fn get_blocks(&self, from: u64, to: u64) -> Result<Vec<Block>, Error> {
        if from == 0 || to < from {
            return Ok(Vec::new());
        }
        let offsets = self.offsets.lock().await;
        let start_index = (from - 1) as usize;
        if start_index >= offsets.len() {
            return Ok(Vec::new());
        }
        let end_index = (to as usize).min(offsets.len());
        let wanted: Vec<u64> = offsets[start_index..end_index].to_vec();
        drop(offsets);

        let mut file = self.file.lock().await;
        let mut blocks = Vec::with_capacity(wanted.len());
        for offset in wanted {
            let (block, _) = read_record_at(&mut file, offset)
                .await?
                .expect("offset recorded in the index always has a readable record");
            blocks.push(block);
        }
        Ok(blocks)
    }

    /// Reads the newest `n` blocks, newest-first. Returns fewer than `n`
    /// if the store is shorter.
    ///
    /// # Errors
    /// I/O or codec errors reading a record back.
    pub async fn top_blocks(&self, n: u64) -> Result<Vec<Block>, Error> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let offsets = self.offsets.lock().await;
        let take = (n as usize).min(offsets.len());
        let wanted: Vec<u64> = offsets[offsets.len() - take..].iter().rev().copied().collect();
        drop(offsets);

        let mut file = self.file.lock().await;
        let mut blocks = Vec::with_capacity(wanted.len());
        for offset in wanted {
            let (block, _) = read_record_at(&mut file, offset)
                .await?
                .expect("offset recorded in the index always has a readable record");
            blocks.push(block);
        }
        Ok(blocks)
    }
}
