use crate::{
    constants::PROGRESS_INTERVAL, finish_with_nonce, pow::hash_meets_target, BlockTemplate,
    Difficulty, LedgerError, Result,
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info};

/// Shared switch a caller flips to abandon an in-flight search.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Searches nonces upward from 0 until the content hash falls below the target.
/// Returns the hex hash and the winning nonce.
///
/// Each window of `PROGRESS_INTERVAL` nonces is scanned in parallel with
/// `find_first`, so the result is always the smallest qualifying nonce, the
/// same one a sequential scan would find. Cancellation is observed between
/// windows.
pub fn mine(
    template: &BlockTemplate,
    difficulty: Difficulty,
    cancel: &CancelFlag,
) -> Result<(String, u64)> {
    let prefix = template.prefix_hasher();
    let mut start = 0u64;

    while start < u64::MAX {
        if cancel.is_cancelled() {
            return Err(LedgerError::MiningCancelled {
                index: template.index,
                attempts: start,
            });
        }

        let end = start.saturating_add(PROGRESS_INTERVAL);
        let found = (start..end).into_par_iter().find_first(|nonce| {
            hash_meets_target(&finish_with_nonce(&prefix, *nonce), difficulty)
        });

        if let Some(nonce) = found {
            let hash = hex::encode(finish_with_nonce(&prefix, nonce));
            info!(
                "Mined block {} with nonce {} and hash {}",
                template.index, nonce, hash
            );
            return Ok((hash, nonce));
        }

        debug!(index = template.index, attempts = end, "still mining");
        start = end;
    }

    Err(LedgerError::MiningExhausted {
        index: template.index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_hash;

    fn fixed_template() -> BlockTemplate {
        BlockTemplate {
            index: 1,
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            payload: 70,
            prev_hash: String::new(),
        }
    }

    #[test]
    fn mine_fixed_template_default_difficulty() {
        let (hash, nonce) = mine(&fixed_template(), Difficulty::default(), &CancelFlag::new())
            .expect("mining succeeds");
        assert_eq!(nonce, 7992);
        assert_eq!(
            hash,
            "0000f197274b6f23f3b50aa640a26c5be966a86a44585016f6f4e518b9a28a1a"
        );
    }

    #[test]
    fn mine_fixed_template_low_difficulty() {
        let d = Difficulty::new(8).unwrap();
        let (hash, nonce) = mine(&fixed_template(), d, &CancelFlag::new()).unwrap();
        assert_eq!(nonce, 75);
        assert!(hash.starts_with("00"));
    }

    #[test]
    fn mined_nonce_is_the_smallest() {
        let template = fixed_template();
        let d = Difficulty::new(10).unwrap();
        let (hash, nonce) = mine(&template, d, &CancelFlag::new()).unwrap();
        let digest = decode_hash(&hash).unwrap();
        assert!(hash_meets_target(&digest, d));
        for earlier in 0..nonce {
            assert!(!hash_meets_target(&template.hash_with_nonce(earlier), d));
        }
    }

    #[test]
    fn mining_is_deterministic() {
        let d = Difficulty::new(12).unwrap();
        let a = mine(&fixed_template(), d, &CancelFlag::new()).unwrap();
        let b = mine(&fixed_template(), d, &CancelFlag::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cancelled_flag_stops_search() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = mine(&fixed_template(), Difficulty::default(), &cancel).unwrap_err();
        assert_eq!(
            err,
            LedgerError::MiningCancelled {
                index: 1,
                attempts: 0
            }
        );
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let cancel = CancelFlag::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());
        cancel.cancel();
        assert!(clone.is_cancelled());
    }
}
