// nand/query.rs from rustwii-nand (c) 2025 NinjaCheetah & Contributors
// https://github.com/NinjaCheetah/rustwii
//
// Implements finding which NAND blocks hold the data for a given file.

use std::io::{Read, Seek};
use tracing::debug;
use crate::nand::fst::FSTEntry;
use crate::nand::session::Session;
use crate::nand::walker::{self, FstVisitor, NandPath};
use crate::nand::NANDError;

/// Number of clusters in an erase block.
pub const CLUSTERS_PER_BLOCK: u16 = 64;

/// An FST visitor that looks for one file and records the blocks its clusters are stored in.
pub struct BlockQuery {
    target: NandPath,
    blocks: Option<Vec<u32>>,
}

impl BlockQuery {
    pub fn new(target: NandPath) -> Self {
        BlockQuery {
            target,
            blocks: None,
        }
    }

    /// Walks the FST looking for the file at `target`, and returns the blocks it occupies or
    /// None if there's no file at that path. If a damaged FST holds the same path more than once,
    /// the first match in walk order is used.
    pub fn find<R: Read + Seek>(session: &Session<R>, target: NandPath) -> Result<Option<Vec<u32>>, NANDError> {
        let mut query = BlockQuery::new(target);
        walker::walk(session, &mut query)?;
        Ok(query.blocks)
    }

    /// Gets the blocks found for the target, in the order the file's chain visits them.
    pub fn blocks(&self) -> Option<&[u32]> {
        self.blocks.as_deref()
    }
}

/// Gets the blocks a cluster chain passes through. A block is only listed again if the chain
/// leaves it and later comes back.
pub fn chain_blocks<R: Read + Seek>(session: &Session<R>, first: u16) -> Result<Vec<u32>, NANDError> {
    let mut blocks: Vec<u32> = Vec::new();
    for cluster in session.cluster_chain(first) {
        let block = (cluster? / CLUSTERS_PER_BLOCK) as u32;
        if blocks.last() != Some(&block) {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

impl FstVisitor for BlockQuery {
    fn directory<R: Read + Seek>(&mut self, _: &Session<R>, _: &FSTEntry, _: &NandPath) -> Result<(), NANDError> {
        Ok(())
    }

    fn file<R: Read + Seek>(&mut self, session: &Session<R>, entry: &FSTEntry, path: &NandPath) -> Result<(), NANDError> {
        if self.blocks.is_none() && *path == self.target {
            debug!("found {} starting at cluster {:#06X}", path, entry.sub);
            self.blocks = Some(chain_blocks(session, entry.sub)?);
        }
        Ok(())
    }
}
