//! Fixed pool of working-set blocks for effects that need large scratch
//! state (heat maps, particle tables).
//!
//! Effects acquire a block in `init` and release it in `cleanup`. When every
//! block is taken, `acquire` fails immediately.

use core::fmt;

use crate::zone::MAX_ZONES;

/// Number of blocks in the pool: one per zone, one for the shared effect
/// and one for the outgoing effect of a transition
pub const WORKING_SET_BLOCKS: usize = MAX_ZONES + 2;

/// Size of one block in bytes
pub const WORKING_SET_BLOCK_LEN: usize = 512;

/// Handle to an acquired block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle(u8);

/// The pool has no free block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    Exhausted,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no free working-set block")
    }
}

pub struct WorkingSetPool {
    blocks: [[u8; WORKING_SET_BLOCK_LEN]; WORKING_SET_BLOCKS],
    in_use: [bool; WORKING_SET_BLOCKS],
}

impl WorkingSetPool {
    pub const fn new() -> Self {
        Self {
            blocks: [[0; WORKING_SET_BLOCK_LEN]; WORKING_SET_BLOCKS],
            in_use: [false; WORKING_SET_BLOCKS],
        }
    }

    /// Take a zeroed block
    #[allow(clippy::cast_possible_truncation)]
    pub fn acquire(&mut self) -> Result<BlockHandle, ArenaError> {
        let index = self
            .in_use
            .iter()
            .position(|used| !used)
            .ok_or(ArenaError::Exhausted)?;
        self.in_use[index] = true;
        self.blocks[index].fill(0);
        Ok(BlockHandle(index as u8))
    }

    /// Return a block to the pool; releasing twice is a no-op
    pub fn release(&mut self, handle: BlockHandle) {
        if let Some(used) = self.in_use.get_mut(usize::from(handle.0)) {
            *used = false;
        }
    }

    /// Access an acquired block
    pub fn block_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        let index = usize::from(handle.0);
        if !self.in_use.get(index).copied().unwrap_or(false) {
            return None;
        }
        self.blocks.get_mut(index).map(|block| &mut block[..])
    }

    /// Number of blocks that can still be acquired
    pub fn available(&self) -> usize {
        self.in_use.iter().filter(|used| !**used).count()
    }
}

impl Default for WorkingSetPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkingSetPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingSetPool")
            .field("available", &self.available())
            .finish_non_exhaustive()
    }
}
