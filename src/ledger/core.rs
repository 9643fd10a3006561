//! Shared ledger handle enforcing single-writer appends

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ledger::{Chain, ChainSnapshot};
use crate::types::*;

/// Process-wide handle to one chain
///
/// Clones share the same chain. Appends hold the write lock from reading the
/// last block until the new block is pushed, so two appends can never build on
/// the same predecessor. Reads take the read lock and return owned copies.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub(crate) chain: Arc<RwLock<Chain>>,
}

impl Ledger {
    /// Create a ledger seeded with a fresh genesis block
    pub fn new() -> Self {
        Self::from_chain(Chain::new())
    }

    /// Wrap an existing chain
    pub fn from_chain(chain: Chain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
        }
    }

    /// Rebuild a ledger from a snapshot, verifying every block
    pub fn restore(snapshot: ChainSnapshot) -> LedgerResult<Self> {
        if snapshot.length != snapshot.chain.len() {
            return Err(LedgerError::Snapshot(format!(
                "snapshot declares {} blocks but holds {}",
                snapshot.length,
                snapshot.chain.len()
            )));
        }

        let chain = Chain::from_blocks(snapshot.chain)?;
        tracing::info!(length = chain.len(), "restored ledger from snapshot");
        Ok(Self::from_chain(chain))
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Chain>> {
        self.chain
            .read()
            .map_err(|_| LedgerError::LedgerUnavailable("chain lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Chain>> {
        self.chain
            .write()
            .map_err(|_| LedgerError::LedgerUnavailable("chain lock poisoned".to_string()))
    }

    /// Append `payload` as the next block
    ///
    /// No payload validation happens here; that is the caller's job.
    pub fn append(&self, payload: BlockPayload) -> LedgerResult<Block> {
        let block = self.write()?.append(payload);
        tracing::info!(
            index = block.index,
            hash = %block.hash,
            "appended block"
        );
        Ok(block)
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.len())
    }

    /// The most recent block
    pub fn last(&self) -> LedgerResult<Block> {
        Ok(self.read()?.last().clone())
    }

    /// Copy of every block in chain order
    pub fn blocks(&self) -> LedgerResult<Vec<Block>> {
        Ok(self.read()?.blocks().to_vec())
    }

    /// Find a block by index
    pub fn get_by_index(&self, index: u64) -> LedgerResult<Option<Block>> {
        Ok(self.read()?.get_by_index(index).cloned())
    }

    /// Find a block by hash
    pub fn get_by_hash(&self, hash: &str) -> LedgerResult<Option<Block>> {
        Ok(self.read()?.get_by_hash(hash).cloned())
    }

    /// Recompute every hash and link
    pub fn verify(&self) -> LedgerResult<bool> {
        Ok(self.read()?.verify())
    }

    /// First block breaking the chain's invariants, if any
    pub fn first_violation(&self) -> LedgerResult<Option<IntegrityViolation>> {
        Ok(self.read()?.first_violation())
    }

    /// Fail with [`LedgerError::Integrity`] if the chain does not verify
    pub fn ensure_intact(&self) -> LedgerResult<()> {
        self.read()?.ensure_intact()
    }

    /// Serializable copy of the whole chain
    pub fn snapshot(&self) -> LedgerResult<ChainSnapshot> {
        Ok(ChainSnapshot::new(self.blocks()?))
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Barrier;

    #[test]
    fn test_clones_share_one_chain() {
        let ledger = Ledger::new();
        let other = ledger.clone();
        other
            .append(BlockPayload::Text("shared".to_string()))
            .unwrap();
        assert_eq!(ledger.len().unwrap(), 2);
        assert_eq!(
            ledger.last().unwrap().payload,
            BlockPayload::Text("shared".to_string())
        );
    }

    #[test]
    fn test_concurrent_appends_stay_consistent() {
        let ledger = Ledger::new();
        let writers = 8;
        let per_writer = 25;
        let barrier = Barrier::new(writers);

        std::thread::scope(|scope| {
            for writer in 0..writers {
                let ledger = ledger.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    for n in 0..per_writer {
                        ledger
                            .append(BlockPayload::Text(format!("{}-{}", writer, n)))
                            .unwrap();
                    }
                });
            }
        });

        let blocks = ledger.blocks().unwrap();
        assert_eq!(blocks.len(), 1 + writers * per_writer);
        let indices: HashSet<u64> = blocks.iter().map(|b| b.index).collect();
        assert_eq!(indices.len(), blocks.len());
        assert!(ledger.verify().unwrap());
    }

    #[test]
    fn test_two_simultaneous_appends() {
        let ledger = Ledger::new();
        let before = ledger.len().unwrap();
        let barrier = Barrier::new(2);

        let (a, b) = std::thread::scope(|scope| {
            let first = scope.spawn(|| {
                barrier.wait();
                ledger.append(BlockPayload::Text("a".to_string())).unwrap()
            });
            let second = scope.spawn(|| {
                barrier.wait();
                ledger.append(BlockPayload::Text("b".to_string())).unwrap()
            });
            (first.join().unwrap(), second.join().unwrap())
        });

        assert_eq!(ledger.len().unwrap(), before + 2);
        assert_ne!(a.index, b.index);
        assert_ne!(a.previous_hash, b.previous_hash);
        assert!(ledger.verify().unwrap());
    }

    #[test]
    fn test_lookups_return_not_found() {
        let ledger = Ledger::new();
        assert!(ledger.get_by_index(1).unwrap().is_none());
        assert!(ledger.get_by_hash("missing").unwrap().is_none());
        let genesis = ledger.get_by_index(0).unwrap().unwrap();
        assert_eq!(ledger.get_by_hash(&genesis.hash).unwrap(), Some(genesis));
    }

    #[test]
    fn test_restore_round_trip() {
        let ledger = Ledger::new();
        ledger.append(BlockPayload::Text("one".to_string())).unwrap();
        let snapshot = ledger.snapshot().unwrap();

        let restored = Ledger::restore(snapshot.clone()).unwrap();
        assert_eq!(restored.blocks().unwrap(), snapshot.chain);

        let mut short = snapshot;
        short.length += 1;
        assert!(matches!(
            Ledger::restore(short),
            Err(LedgerError::Snapshot(_))
        ));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let ledger = Ledger::new();
        let chain = ledger.chain.clone();
        let _ = std::thread::spawn(move || {
            let _guard = chain.write().unwrap();
            panic!("writer crashed");
        })
        .join();

        assert!(matches!(
            ledger.append(BlockPayload::Text("x".to_string())),
            Err(LedgerError::LedgerUnavailable(_))
        ));
        assert!(ledger.verify().is_err());
    }
}
