//! Authorization policy: which identities may see and verify reports.

use reclaim_types::Identity;

/// Owner of the deployed report contract.
pub const OWNER_ADDRESS: &str = "0x6054060A93943D7eAB480B815dC2E2350Ae48C19";

/// Decides whether a connected identity is an administrator.
///
/// Closures `Fn(&Identity) -> bool` are policies too.
pub trait AuthorizationPolicy: Send + Sync {
    fn is_authorized(&self, identity: &Identity) -> bool;
}

/// Single-owner policy: exactly one identity, compared case-insensitively.
#[derive(Clone, Debug)]
pub struct OwnerPolicy {
    owner: Identity,
}

impl OwnerPolicy {
    pub fn new(owner: Identity) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }
}

impl AuthorizationPolicy for OwnerPolicy {
    fn is_authorized(&self, identity: &Identity) -> bool {
        // Identity equality ignores ASCII case.
        *identity == self.owner
    }
}

impl<F> AuthorizationPolicy for F
where
    F: Fn(&Identity) -> bool + Send + Sync,
{
    fn is_authorized(&self, identity: &Identity) -> bool {
        self(identity)
    }
}
