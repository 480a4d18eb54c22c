//! Single-writer funnel for fetches completed off the owning thread.
//!
//! Fetchers that run on worker threads send their [`PageOutcome`] through a
//! [`PageSender`]; the thread owning the store drains the [`PageInbox`] and
//! applies outcomes one at a time.

use std::sync::mpsc::{self, Receiver, Sender};

use super::request::PageOutcome;

/// Receiving end, owned alongside the store.
#[derive(Debug)]
pub struct PageInbox<R> {
    tx: Sender<PageOutcome<R>>,
    rx: Receiver<PageOutcome<R>>,
}

/// Cloneable sending end handed to fetch workers.
#[derive(Debug)]
pub struct PageSender<R> {
    tx: Sender<PageOutcome<R>>,
}

impl<R> Clone for PageSender<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R> PageSender<R> {
    /// Deliver an outcome. Returns false if the inbox is gone.
    pub fn send(&self, outcome: PageOutcome<R>) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

impl<R> Default for PageInbox<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PageInbox<R> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> PageSender<R> {
        PageSender {
            tx: self.tx.clone(),
        }
    }

    /// Take every outcome delivered so far without blocking.
    pub fn drain(&self) -> Vec<PageOutcome<R>> {
        self.rx.try_iter().collect()
    }

    /// Block until one outcome arrives.
    pub fn recv(&self) -> Option<PageOutcome<R>> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PageRequest;

    #[test]
    fn test_outcomes_cross_threads() {
        let inbox = PageInbox::<u32>::new();
        let handles: Vec<_> = (0..4usize)
            .map(|page| {
                let sender = inbox.sender();
                std::thread::spawn(move || {
                    let request = PageRequest { page, api_page: 0 };
                    sender.send(PageOutcome::success(request, 80, vec![1, 2]))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok_and(|sent| sent));
        }
        let mut pages: Vec<usize> = inbox.drain().iter().map(|o| o.request.page).collect();
        pages.sort_unstable();
        assert_eq!(pages, vec![0, 1, 2, 3]);
        assert!(inbox.drain().is_empty());
    }
}
