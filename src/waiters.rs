use std::collections::VecDeque;
use std::sync::Arc;

use crate::signal::Signal;

/// Ordered queue of select notification tokens parked on one side of a
/// channel.
///
/// All mutation happens under the owning channel's lock; the queue itself
/// carries no synchronisation. Tokens are compared by identity, never by
/// value: the same `Arc<Signal>` that was appended is the one removed.
pub(crate) struct WaiterQueue {
    tokens: VecDeque<Arc<Signal>>,
}

impl WaiterQueue {
    pub(crate) fn new() -> Self {
        Self {
            tokens: VecDeque::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Appends a token at the tail.
    pub(crate) fn append(&mut self, token: Arc<Signal>) {
        self.tokens.push_back(token);
    }

    /// Removes the first token identical to `token`. No-op when absent,
    /// so deregistration is idempotent.
    pub(crate) fn remove(&mut self, token: &Arc<Signal>) {
        if let Some(pos) = self.tokens.iter().position(|t| Arc::ptr_eq(t, token)) {
            self.tokens.remove(pos);
        }
    }

    /// Removes the head, appends it at the tail and returns it.
    ///
    /// Rotation is what makes channel notifications round-robin across
    /// select callers parked on the same channel.
    pub(crate) fn rotate_head(&mut self) -> Option<Arc<Signal>> {
        let head = self.tokens.pop_front()?;
        self.tokens.push_back(head.clone());
        Some(head)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Signal>> {
        self.tokens.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Arc<Signal> {
        Arc::new(Signal::new())
    }

    #[test]
    fn test_append_and_len() {
        let mut queue = WaiterQueue::new();
        assert!(queue.is_empty());

        queue.append(token());
        queue.append(token());

        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_remove_is_by_identity() {
        let mut queue = WaiterQueue::new();
        let a = token();
        let b = token();
        queue.append(a.clone());
        queue.append(b.clone());

        // A token that was never appended is ignored.
        queue.remove(&token());
        assert_eq!(queue.len(), 2);

        queue.remove(&a);
        assert_eq!(queue.len(), 1);
        assert!(Arc::ptr_eq(queue.iter().next().unwrap(), &b));

        // Removing twice is a no-op.
        queue.remove(&a);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_rotate_head_round_robins() {
        let mut queue = WaiterQueue::new();
        let a = token();
        let b = token();
        let c = token();
        queue.append(a.clone());
        queue.append(b.clone());
        queue.append(c.clone());

        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &a));
        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &b));
        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &c));
        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &a));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_rotate_empty() {
        let mut queue = WaiterQueue::new();
        assert!(queue.rotate_head().is_none());
    }

    #[test]
    fn test_clear() {
        let mut queue = WaiterQueue::new();
        queue.append(token());
        queue.append(token());
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_tail_then_append() {
        let mut queue = WaiterQueue::new();
        let a = token();
        let b = token();
        queue.append(a.clone());
        queue.append(b.clone());

        queue.remove(&b);
        let c = token();
        queue.append(c.clone());

        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &a));
        assert!(Arc::ptr_eq(&queue.rotate_head().unwrap(), &c));
    }
}
