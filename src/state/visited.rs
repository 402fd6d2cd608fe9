//! Visited set shared by every branch of one traversal

use crate::state::PageState;
use crate::url::Address;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Addresses claimed during one crawl, with the state each one reached
///
/// Membership is decided by [`VisitedSet::claim`], a single check-and-insert
/// under one lock, so two branches can never both win the same address.
#[derive(Debug, Default)]
pub struct VisitedSet {
    states: Mutex<HashMap<Address, PageState>>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Address, PageState>> {
        // Entries stay consistent even if a holder panicked mid-update
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims an address for the calling branch
    ///
    /// # Returns
    ///
    /// * `true` - The address was unclaimed and is now `Pending`
    /// * `false` - Another branch already claimed it
    pub fn claim(&self, address: &Address) -> bool {
        let mut states = self.lock();
        if states.contains_key(address) {
            return false;
        }
        states.insert(address.clone(), PageState::Pending);
        true
    }

    /// Moves a claimed address to a new state
    ///
    /// Illegal transitions and unclaimed addresses are ignored.
    pub fn transition(&self, address: &Address, next: PageState) {
        let mut states = self.lock();
        match states.get_mut(address) {
            Some(current) if current.can_transition_to(next) => {
                tracing::trace!("{}: {} -> {}", address, current, next);
                *current = next;
            }
            Some(current) => {
                tracing::debug!(
                    "Ignoring invalid transition for {}: {} -> {}",
                    address,
                    current,
                    next
                );
            }
            None => {
                tracing::debug!("Ignoring transition for unclaimed address {}", address);
            }
        }
    }

    /// Returns true if the address has been claimed
    pub fn contains(&self, address: &Address) -> bool {
        self.lock().contains_key(address)
    }

    /// Returns the current state of an address
    pub fn state_of(&self, address: &Address) -> Option<PageState> {
        self.lock().get(address).copied()
    }

    /// Number of claimed addresses
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been claimed
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of addresses currently in the given state
    pub fn count_in(&self, state: PageState) -> usize {
        self.lock().values().filter(|s| **s == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_claim_once() {
        let visited = VisitedSet::new();
        let a = addr("https://example.com/a");

        assert!(visited.claim(&a));
        assert!(!visited.claim(&a));
        assert_eq!(visited.len(), 1);
        assert_eq!(visited.state_of(&a), Some(PageState::Pending));
    }

    #[test]
    fn test_claim_is_fragment_insensitive() {
        let visited = VisitedSet::new();
        assert!(visited.claim(&addr("https://example.com/a#x")));
        assert!(!visited.claim(&addr("https://example.com/a#y")));
    }

    #[test]
    fn test_transition_follows_state_machine() {
        let visited = VisitedSet::new();
        let a = addr("https://example.com/a");
        visited.claim(&a);

        visited.transition(&a, PageState::Fetching);
        assert_eq!(visited.state_of(&a), Some(PageState::Fetching));

        // Illegal: Fetching -> Merged is ignored
        visited.transition(&a, PageState::Merged);
        assert_eq!(visited.state_of(&a), Some(PageState::Fetching));

        visited.transition(&a, PageState::Failed);
        assert_eq!(visited.count_in(PageState::Failed), 1);
    }

    #[test]
    fn test_transition_unclaimed_is_noop() {
        let visited = VisitedSet::new();
        let a = addr("https://example.com/a");
        visited.transition(&a, PageState::Fetching);
        assert!(!visited.contains(&a));
        assert!(visited.is_empty());
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let visited = Arc::new(VisitedSet::new());
        let a = addr("https://example.com/contended");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                let a = a.clone();
                std::thread::spawn(move || visited.claim(&a))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(visited.len(), 1);
    }
}
