use crate::{
    decode_hash, mine, pow::hash_meets_target, Block, BlockTemplate, CancelFlag, Difficulty,
    LedgerError, Result,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Build and mine the successor of `prev` carrying `payload`.
pub fn generate_block(
    prev: &Block,
    payload: i64,
    difficulty: Difficulty,
    cancel: &CancelFlag,
) -> Result<Block> {
    let template = BlockTemplate::next(prev, payload)?;
    let (hash, nonce) = mine::mine(&template, difficulty, cancel)?;
    Ok(template.seal(hash, nonce))
}

/// Check `candidate` against its predecessor: index step, hash link,
/// recomputed content hash and proof-of-work target.
pub fn validate_block(candidate: &Block, prev: &Block, difficulty: Difficulty) -> Result<()> {
    if prev.index.checked_add(1) != Some(candidate.index) {
        return Err(LedgerError::InvalidBlock(format!(
            "index {} does not follow {}",
            candidate.index, prev.index
        )));
    }
    if candidate.prev_hash != prev.hash {
        return Err(LedgerError::InvalidBlock(format!(
            "block {} does not link to the hash of block {}",
            candidate.index, prev.index
        )));
    }
    if candidate.compute_hash_hex() != candidate.hash {
        return Err(LedgerError::InvalidBlock(format!(
            "block {} hash does not match its contents",
            candidate.index
        )));
    }
    let digest = decode_hash(&candidate.hash).ok_or_else(|| {
        LedgerError::InvalidBlock(format!("block {} hash is not 32 bytes of hex", candidate.index))
    })?;
    if !hash_meets_target(&digest, difficulty) {
        return Err(LedgerError::InvalidBlock(format!(
            "block {} hash is above the target",
            candidate.index
        )));
    }
    Ok(())
}

pub fn is_block_valid(candidate: &Block, prev: &Block, difficulty: Difficulty) -> bool {
    validate_block(candidate, prev, difficulty).is_ok()
}

/// Full pairwise check of a sequence starting at a genesis block.
pub fn validate_chain(chain: &[Block], difficulty: Difficulty) -> Result<()> {
    let genesis = chain
        .first()
        .ok_or_else(|| LedgerError::InvalidBlock("chain is empty".into()))?;
    if genesis.index != 0 || !genesis.prev_hash.is_empty() || !genesis.hash.is_empty() {
        return Err(LedgerError::InvalidBlock(
            "first block is not a genesis block".into(),
        ));
    }
    chain
        .windows(2)
        .try_for_each(|pair| validate_block(&pair[1], &pair[0], difficulty))
}

/// Owner of the canonical chain.
///
/// Readers get cloned snapshots. Submissions are serialised so that mining
/// always runs against the tail it will be appended to; the chain lock itself
/// is only held for the final check-and-push or a wholesale swap.
pub struct Ledger {
    chain: RwLock<Vec<Block>>,
    submit_lock: Mutex<()>,
    difficulty: Difficulty,
}

impl Ledger {
    /// New ledger holding only a fresh genesis block.
    pub fn new(difficulty: Difficulty) -> Self {
        let genesis = Block::genesis();
        debug!(?genesis, "genesis block created");
        Self {
            chain: RwLock::new(vec![genesis]),
            submit_lock: Mutex::new(()),
            difficulty,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn chain(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    pub fn tip(&self) -> Block {
        self.chain
            .read()
            .last()
            .cloned()
            .expect("chain always holds its genesis block")
    }

    /// Append `candidate` if it extends the live tail; otherwise the chain is untouched.
    pub fn append(&self, candidate: Block) -> Result<()> {
        let mut chain = self.chain.write();
        let tail = chain.last().expect("chain always holds its genesis block");
        if let Err(err) = validate_block(&candidate, tail, self.difficulty) {
            warn!(index = candidate.index, %err, "rejected block");
            return Err(err);
        }
        debug!(block = ?candidate, "appended block");
        chain.push(candidate);
        Ok(())
    }

    /// Longest chain wins: swap in `candidate` iff it is strictly longer.
    /// The candidate's blocks are not re-validated.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> bool {
        let mut chain = self.chain.write();
        if candidate.len() > chain.len() {
            info!(
                from = chain.len(),
                to = candidate.len(),
                "replacing canonical chain"
            );
            *chain = candidate;
            true
        } else {
            debug!(
                current = chain.len(),
                candidate = candidate.len(),
                "kept canonical chain"
            );
            false
        }
    }

    /// Mine a block for `payload` on top of the current tail and append it.
    pub fn submit_payload(&self, payload: i64, cancel: &CancelFlag) -> Result<Block> {
        let _writer = self.submit_lock.lock();
        let tail = self.tip();
        let block = generate_block(&tail, payload, self.difficulty, cancel)?;
        self.append(block.clone())?;
        Ok(block)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}
