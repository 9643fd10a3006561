//! The ordered, append-only sequence of blocks

use crate::types::*;

/// Hash-linked chain of blocks, starting with the genesis block
///
/// Only grows by single-block appends; never truncated or reordered.
#[derive(Debug, Clone)]
pub struct Chain {
    pub(crate) blocks: Vec<Block>,
}

impl Chain {
    /// Create a chain holding only a genesis block stamped with the current time
    pub fn new() -> Self {
        Self::with_genesis_timestamp(chrono::Utc::now().timestamp())
    }

    /// Create a chain whose genesis block carries `timestamp`
    pub fn with_genesis_timestamp(timestamp: i64) -> Self {
        Self {
            blocks: vec![Block::genesis(timestamp)],
        }
    }

    /// Rebuild a chain from stored blocks, rejecting anything that fails verification
    pub fn from_blocks(blocks: Vec<Block>) -> LedgerResult<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::Snapshot(
                "chain must contain a genesis block".to_string(),
            ));
        }

        let chain = Self { blocks };
        chain.ensure_intact()?;
        Ok(chain)
    }

    /// Append `payload` as a new block stamped with the current time
    pub fn append(&mut self, payload: BlockPayload) -> Block {
        self.append_at(chrono::Utc::now().timestamp(), payload)
    }

    /// Append `payload` as a new block stamped no earlier than the last block
    pub fn append_at(&mut self, timestamp: i64, payload: BlockPayload) -> Block {
        let last = self.last();
        let index = last.index + 1;
        let timestamp = timestamp.max(last.timestamp);
        let block = Block::new(index, last.hash.clone(), timestamp, payload);

        self.blocks.push(block.clone());
        block
    }

    /// The most recent block
    pub fn last(&self) -> &Block {
        // A chain always holds at least the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the genesis block is never removed
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in chain order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Find a block by index
    pub fn get_by_index(&self, index: u64) -> Option<&Block> {
        self.blocks.iter().find(|block| block.index == index)
    }

    /// Find a block by hash
    pub fn get_by_hash(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.hash == hash)
    }

    /// Locate the first block that breaks the chain's invariants
    pub fn first_violation(&self) -> Option<IntegrityViolation> {
        for (position, block) in self.blocks.iter().enumerate() {
            let violation = |kind| {
                Some(IntegrityViolation {
                    index: position as u64,
                    kind,
                })
            };

            if block.index != position as u64 {
                return violation(ViolationKind::Index);
            }
            if !block.has_valid_hash() {
                return violation(ViolationKind::Hash);
            }

            let expected_previous = match position {
                0 => GENESIS_PREVIOUS_HASH,
                _ => self.blocks[position - 1].hash.as_str(),
            };
            if block.previous_hash != expected_previous {
                return violation(ViolationKind::Linkage);
            }
        }

        None
    }

    /// Recompute every hash and link; false on the first mismatch
    pub fn verify(&self) -> bool {
        match self.first_violation() {
            None => true,
            Some(violation) => {
                tracing::warn!(
                    index = violation.index,
                    kind = %violation.kind,
                    "ledger verification failed"
                );
                false
            }
        }
    }

    /// Like [`Chain::verify`], but reports the violation as an error
    pub fn ensure_intact(&self) -> LedgerResult<()> {
        match self.first_violation() {
            None => Ok(()),
            Some(violation) => {
                tracing::warn!(
                    index = violation.index,
                    kind = %violation.kind,
                    "ledger integrity violated"
                );
                Err(violation.into())
            }
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
