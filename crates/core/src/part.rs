//! Parts and candidates.
//!
//! A part is an ordered slot in the final plaintext; a run supplies one or
//! more candidate strings per part via `next_part`/`add_string`. Each
//! candidate's [`HashPart`](crate::adler::HashPart) is precomputed once,
//! at ingestion time, so the search loop never re-hashes a candidate.

use crate::adler::{hash_part, HashPart};
use crate::error::IngestError;
use crate::intern::{InternId, InternPool};

/// One candidate string belonging to a [`Part`]: its interned bytes plus
/// its precomputed Adler-32 contribution.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub id: InternId,
    pub hash: HashPart,
}

/// An ordered slot in the plaintext and the candidates that may fill it.
#[derive(Debug, Default)]
pub struct Part {
    candidates: Vec<Candidate>,
}

impl Part {
    pub fn new() -> Self {
        Part { candidates: Vec::new() }
    }

    /// Intern `data` and append it as a candidate for this part.
    pub fn push_candidate(
        &mut self,
        pool: &mut InternPool,
        data: &[u8],
    ) -> Result<(), IngestError> {
        let hash = hash_part(data)?;
        let id = pool.intern(data);
        self.candidates.push(Candidate { id, hash });
        Ok(())
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_candidate_interns_and_hashes() {
        let mut pool = InternPool::new();
        let mut part = Part::new();
        part.push_candidate(&mut pool, b"alpha").unwrap();
        part.push_candidate(&mut pool, b"beta").unwrap();

        assert_eq!(part.len(), 2);
        assert_eq!(pool.get(part.candidates()[0].id), b"alpha");
        assert_eq!(pool.get(part.candidates()[1].id), b"beta");
    }

    #[test]
    fn too_long_candidate_is_rejected() {
        let mut pool = InternPool::new();
        let mut part = Part::new();
        let oversized = vec![0u8; crate::adler::MAX_CANDIDATE_LEN + 1];
        assert!(part.push_candidate(&mut pool, &oversized).is_err());
        assert!(part.is_empty());
    }
}
