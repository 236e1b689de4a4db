use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Ids currently being processed by this process.
#[derive(Clone, Default)]
pub struct InFlightSet {
    ids: Arc<Mutex<HashSet<i64>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as in flight. Returns `None` if it already is; otherwise the
    /// id is released when the returned guard drops.
    pub fn try_track(&self, id: i64) -> Option<InFlightGuard> {
        if self.lock().insert(id) {
            Some(InFlightGuard {
                set: self.clone(),
                id,
            })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<i64>> {
        // The set holds plain ids, so a poisoned lock is still consistent.
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct InFlightGuard {
    set: InFlightSet,
    id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_are_rejected_until_released() {
        let set = InFlightSet::new();

        let guard = set.try_track(7).expect("first claim");
        assert!(set.try_track(7).is_none());
        assert_eq!(set.len(), 1);

        let other = set.try_track(8).expect("different id");
        assert_eq!(set.len(), 2);

        drop(guard);
        assert_eq!(set.len(), 1);
        assert!(set.try_track(7).is_some());

        drop(other);
        assert!(set.is_empty());
    }
}
