//! Generation counters for stale-result suppression.
//!
//! Every resolution captures a [`RunToken`] when it starts and may only
//! commit while that token is still current. Superseded runs are not
//! cancelled; their results are simply dropped at commit time.

/// Counters captured by a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    /// Session generation the run belongs to.
    pub session: u64,
    /// Organization generation, meaningful for organization commits only.
    pub org: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Generations {
    /// Bumped by every identity resolution and sign-out.
    session: u64,
    /// Bumped by every organization phase (full run or reload).
    org: u64,
    /// Session generation whose identity is currently committed.
    committed_session: u64,
}

impl Generations {
    /// Start an identity resolution, superseding all earlier ones.
    pub(crate) fn begin_session(&mut self) -> RunToken {
        self.session += 1;
        RunToken {
            session: self.session,
            org: self.org,
        }
    }

    pub(crate) fn is_current_session(&self, token: RunToken) -> bool {
        self.session == token.session
    }

    /// Record that `token`'s identity was committed and open its
    /// organization phase.
    pub(crate) fn commit_session(&mut self, token: RunToken) -> RunToken {
        self.committed_session = token.session;
        self.org += 1;
        RunToken {
            session: token.session,
            org: self.org,
        }
    }

    /// Start an organization reload for the committed identity.
    ///
    /// If an identity resolution is in flight the token is already stale:
    /// that run will resolve the organization itself.
    pub(crate) fn begin_reload(&mut self) -> RunToken {
        self.org += 1;
        RunToken {
            session: self.committed_session,
            org: self.org,
        }
    }

    pub(crate) fn is_current_org(&self, token: RunToken) -> bool {
        self.session == token.session && self.org == token.org
    }

    /// Make every outstanding token stale.
    pub(crate) fn invalidate(&mut self) {
        self.session += 1;
        self.org += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_session_supersedes_older() {
        let mut gens = Generations::default();
        let first = gens.begin_session();
        let second = gens.begin_session();
        assert!(!gens.is_current_session(first));
        assert!(gens.is_current_session(second));
        assert!(second.session > first.session);
    }

    #[test]
    fn test_reload_supersedes_org_phase() {
        let mut gens = Generations::default();
        let run = gens.begin_session();
        let org_phase = gens.commit_session(run);
        assert!(gens.is_current_org(org_phase));

        let reload = gens.begin_reload();
        assert!(!gens.is_current_org(org_phase));
        assert!(gens.is_current_org(reload));
        assert_eq!(reload.session, run.session);
    }

    #[test]
    fn test_reload_during_identity_resolution_is_stale() {
        let mut gens = Generations::default();
        let run = gens.begin_session();
        gens.commit_session(run);

        let _pending = gens.begin_session();
        let reload = gens.begin_reload();
        assert!(!gens.is_current_org(reload));
    }

    #[test]
    fn test_invalidate() {
        let mut gens = Generations::default();
        let run = gens.begin_session();
        let org_phase = gens.commit_session(run);
        gens.invalidate();
        assert!(!gens.is_current_session(run));
        assert!(!gens.is_current_org(org_phase));
    }
}
