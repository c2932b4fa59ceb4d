//! Scroll-listener bookkeeping shared by surface implementations.

/// Opaque handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Set of currently registered listeners.
///
/// Ids are never reused, so a stale handle can't accidentally match a newer
/// registration.
#[derive(Debug, Default)]
pub struct ListenerSet {
    next: u64,
    registered: Vec<ListenerId>,
}

impl ListenerSet {
    pub fn add(&mut self) -> ListenerId {
        let id = ListenerId(self.next);
        self.next = self.next.wrapping_add(1);
        self.registered.push(id);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.registered.len();
        self.registered.retain(|l| *l != id);
        self.registered.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.registered.contains(&id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_is_reported_once() {
        let mut set = ListenerSet::default();
        let id = set.add();
        assert!(set.contains(id));
        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert!(set.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut set = ListenerSet::default();
        let first = set.add();
        set.remove(first);
        let second = set.add();
        assert_ne!(first, second);
        assert!(!set.contains(first));
        assert_eq!(set.len(), 1);
    }
}
