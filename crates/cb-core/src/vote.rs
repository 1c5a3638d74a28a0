//! # Vote Casting
//!
//! Single-vote-per-session casting over a `VoteRepo`.
//!
//! The dedup pre-check makes the common duplicate case cheap and lets the
//! caller render an "already voted" notice without attempting an insert.
//! It does NOT serialize concurrent casts — the storage layer's uniqueness
//! guarantee inside `record_vote` does. A failed pre-check propagates:
//! unknown vote state must never let a vote through.

use crate::error::Result;
use crate::models::{VoteOutcome, VoteTarget};
use crate::traits::VoteRepo;

/// Casts a vote for `session` on `target`, adjusting the target's counter
/// by `value`. Callers currently always pass +1; the signed interface is
/// kept for parity with the storage contract.
pub async fn cast_vote(
    repo: &dyn VoteRepo,
    session: &str,
    target: VoteTarget,
    value: i64,
) -> Result<VoteOutcome> {
    if repo.has_voted(session, target).await? {
        return Ok(VoteOutcome::AlreadyVoted);
    }
    repo.record_vote(session, target, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Map-backed vote store; optionally fails every read.
    #[derive(Default)]
    struct FakeVotes {
        rows: Mutex<HashSet<(String, Uuid)>>,
        fail_reads: bool,
        recorded: Mutex<u32>,
    }

    #[async_trait]
    impl VoteRepo for FakeVotes {
        async fn has_voted(&self, session: &str, target: VoteTarget) -> Result<bool> {
            if self.fail_reads {
                return Err(AppError::Internal("vote lookup failed".into()));
            }
            Ok(self.rows.lock().unwrap().contains(&(session.to_string(), target.id())))
        }

        async fn voted_in_thread(&self, _session: &str, _thread_id: Uuid) -> Result<Vec<Uuid>> {
            Ok(Vec::new())
        }

        async fn record_vote(
            &self,
            session: &str,
            target: VoteTarget,
            _value: i64,
        ) -> Result<VoteOutcome> {
            *self.recorded.lock().unwrap() += 1;
            let fresh = self.rows.lock().unwrap().insert((session.to_string(), target.id()));
            if fresh {
                Ok(VoteOutcome::Accepted)
            } else {
                Ok(VoteOutcome::AlreadyVoted)
            }
        }
    }

    #[tokio::test]
    async fn accepted_then_already_voted() {
        let repo = FakeVotes::default();
        let target = VoteTarget::Thread(Uuid::now_v7());

        assert!(!repo.has_voted("s1", target).await.unwrap());
        assert_eq!(cast_vote(&repo, "s1", target, 1).await.unwrap(), VoteOutcome::Accepted);
        assert!(repo.has_voted("s1", target).await.unwrap());
        assert_eq!(cast_vote(&repo, "s1", target, 1).await.unwrap(), VoteOutcome::AlreadyVoted);
    }

    #[tokio::test]
    async fn second_session_votes_independently() {
        let repo = FakeVotes::default();
        let target = VoteTarget::Comment(Uuid::now_v7());

        assert_eq!(cast_vote(&repo, "s1", target, 1).await.unwrap(), VoteOutcome::Accepted);
        assert_eq!(cast_vote(&repo, "s2", target, 1).await.unwrap(), VoteOutcome::Accepted);
    }

    #[tokio::test]
    async fn failed_dedup_check_blocks_the_vote() {
        let repo = FakeVotes { fail_reads: true, ..Default::default() };
        let target = VoteTarget::Thread(Uuid::now_v7());

        let err = cast_vote(&repo, "s1", target, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        // The insert must not have been attempted on an unknown vote state.
        assert_eq!(*repo.recorded.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_pre_check_skips_the_insert() {
        let repo = FakeVotes::default();
        let target = VoteTarget::Thread(Uuid::now_v7());

        cast_vote(&repo, "s1", target, 1).await.unwrap();
        cast_vote(&repo, "s1", target, 1).await.unwrap();
        // One real insert; the duplicate was answered from the pre-check.
        assert_eq!(*repo.recorded.lock().unwrap(), 1);
    }
}
