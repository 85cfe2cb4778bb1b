//! Sequential page streaming for non-interactive consumers.

use async_stream::try_stream;
use futures_util::Stream;

use bazaar_core::{Page, PageSource, Result};

/// Stream every page of `source` in order, starting at page 1.
///
/// Ends after the last reported page or the first empty page, and stops at
/// the first error. Unlike [`ListController`](crate::ListController), no
/// de-duplication is applied.
pub fn pages<S: PageSource>(
    source: &S,
    filters: S::Filters,
    page_size: u32,
) -> impl Stream<Item = Result<Page<S::Item>>> + Send + '_ {
    try_stream! {
        let mut page = 1;
        loop {
            let next = source.fetch_page(page, page_size, &filters).await?;
            let last = page >= next.total_pages || next.items.is_empty();
            yield next;
            if last {
                break;
            }
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use bazaar_core::Keyed;
    use bazaar_core::error::ProtocolError;
    use futures_util::{StreamExt, pin_mut};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Follower(u32);

    impl Keyed for Follower {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }
    }

    struct Followers {
        total_pages: u32,
        fail_at: Option<u32>,
        requested: AtomicU32,
    }

    #[async_trait]
    impl PageSource for Followers {
        type Item = Follower;
        type Filters = ();

        async fn fetch_page(&self, page: u32, page_size: u32, _: &()) -> Result<Page<Follower>> {
            self.requested.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(page) {
                return Err(ProtocolError::new(500, None, None).into());
            }
            let first = (page - 1) * page_size;
            let items = (first..first + page_size).map(Follower).collect();
            Ok(Page::new(items, self.total_pages))
        }
    }

    #[tokio::test]
    async fn streams_until_last_page() {
        let source = Followers {
            total_pages: 3,
            fail_at: None,
            requested: AtomicU32::new(0),
        };
        let stream = pages(&source, (), 2);
        pin_mut!(stream);

        let mut seen = Vec::new();
        while let Some(page) = stream.next().await {
            seen.extend(page.unwrap().items.into_iter().map(|f| f.0));
        }

        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(source.requested.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_after_first_error() {
        let source = Followers {
            total_pages: 5,
            fail_at: Some(2),
            requested: AtomicU32::new(0),
        };
        let results: Vec<_> = pages(&source, (), 2).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(source.requested.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_sequence_yields_one_empty_page() {
        let source = Followers {
            total_pages: 0,
            fail_at: None,
            requested: AtomicU32::new(0),
        };
        let results: Vec<_> = pages(&source, (), 2).collect().await;
        assert_eq!(results.len(), 1);
    }
}
