use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mediadb_graphql::{
    CancelReason, CancellationSignal, GraphqlClientError, MSG_SERVICE_BUSY,
};
use mediadb_loader::{
    IncrementalLoader, LoaderOptions, LoaderPhase, PageFetch, PageRequest, PageResult,
};
use mediadb_testkit::init_test_tracing;
use reqwest::StatusCode;
use tokio::sync::{mpsc, oneshot};

type Reply = oneshot::Sender<Result<PageResult<u32>, GraphqlClientError>>;

/// Page source driven by the test: every fetch is handed to the test, which
/// answers it when it chooses. Fetches resolve early with a cancellation once
/// their signal fires, like the real client does.
struct ScriptedPages {
    requests: mpsc::UnboundedSender<(PageRequest, Reply)>,
}

struct Script {
    requests: mpsc::UnboundedReceiver<(PageRequest, Reply)>,
}

impl Script {
    async fn next(&mut self) -> (PageRequest, Reply) {
        self.requests.recv().await.expect("loader dropped")
    }

    fn assert_idle(&mut self) {
        assert!(self.requests.try_recv().is_err(), "unexpected fetch");
    }
}

fn scripted() -> (ScriptedPages, Script) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ScriptedPages { requests: tx }, Script { requests: rx })
}

impl PageFetch<u32> for ScriptedPages {
    fn fetch(
        &self,
        request: PageRequest,
    ) -> futures_util::future::BoxFuture<'static, Result<PageResult<u32>, GraphqlClientError>>
    {
        let (reply, response) = oneshot::channel();
        let signal = request.signal.clone();
        let _ = self.requests.send((request, reply));
        Box::pin(async move {
            tokio::select! {
                reason = signal.cancelled() => Err(GraphqlClientError::Cancelled { reason }),
                result = response => result.unwrap_or(Err(GraphqlClientError::Cancelled {
                    reason: CancelReason::External,
                })),
            }
        })
    }
}

fn page_of(page: u32, per_page: u32, count: u32, has_next_page: bool) -> PageResult<u32> {
    let first = (page - 1) * per_page + 1;
    PageResult::new((first..first + count).collect(), has_next_page)
}

fn busy() -> GraphqlClientError {
    GraphqlClientError::HttpStatus {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: String::new(),
        retry_after: None,
    }
}

fn options(per_page: u32) -> LoaderOptions {
    LoaderOptions::default().with_per_page(per_page)
}

#[tokio::test]
async fn initial_load_populates_first_page() {
    init_test_tracing();
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(3));
    assert_eq!(loader.snapshot().phase, LoaderPhase::Idle);

    tokio::join!(loader.load_initial(), async {
        let (request, reply) = script.next().await;
        assert_eq!((request.page, request.per_page), (1, 3));
        assert_eq!(loader.snapshot().phase, LoaderPhase::LoadingInitial);
        reply.send(Ok(page_of(1, 3, 3, true))).unwrap();
    });

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2, 3]);
    assert_eq!(snapshot.page, 2);
    assert!(snapshot.has_more);
    assert!(!snapshot.loading_initial);
    assert_eq!(snapshot.phase, LoaderPhase::Ready);
}

#[tokio::test]
async fn show_more_appends_until_a_short_page() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    tokio::join!(loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 2);
        assert!(loader.snapshot().loading_more);
        reply.send(Ok(page_of(2, 2, 1, true))).unwrap();
    });

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2, 3]);
    assert!(snapshot.ended);
    assert!(!snapshot.has_more);
    assert_eq!(snapshot.phase, LoaderPhase::Ended);

    loader.show_more().await;
    script.assert_idle();
}

#[tokio::test]
async fn full_pages_continue_until_upstream_says_last() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    assert!(!loader.snapshot().ended);

    tokio::join!(loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 2);
        reply.send(Ok(page_of(2, 2, 2, true))).unwrap();
    });
    let snapshot = loader.snapshot();
    assert!(!snapshot.ended);
    assert!(snapshot.has_more);

    tokio::join!(loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 3);
        reply.send(Ok(page_of(3, 2, 2, false))).unwrap();
    });
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2, 3, 4, 5, 6]);
    assert!(snapshot.ended);
    assert_eq!(snapshot.phase, LoaderPhase::Ended);
}

#[tokio::test]
async fn upstream_end_flag_stops_paging() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, false))).unwrap();
    });

    assert!(loader.snapshot().ended);
    loader.show_more().await;
    script.assert_idle();
}

#[tokio::test]
async fn overlapping_show_more_issues_one_fetch() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });

    tokio::join!(loader.show_more(), loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 2);
        reply.send(Ok(page_of(2, 2, 2, true))).unwrap();
    });
    script.assert_idle();

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2, 3, 4]);
    assert_eq!(snapshot.page, 3);
}

#[tokio::test]
async fn show_more_is_ignored_while_initial_load_runs() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        loader.show_more().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    script.assert_idle();
    assert_eq!(loader.snapshot().items, vec![1, 2]);
}

#[tokio::test]
async fn cap_truncates_and_blocks_further_loads() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(4).with_max_items(6));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 4, 4, true))).unwrap();
    });
    tokio::join!(loader.show_more(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(2, 4, 4, true))).unwrap();
    });

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items.len(), 6);
    assert!(!snapshot.has_more);
    assert!(!loader.has_more());

    loader.show_more().await;
    script.assert_idle();
}

#[tokio::test]
async fn failed_show_more_keeps_items_and_can_retry() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    tokio::join!(loader.show_more(), async {
        let (_, reply) = script.next().await;
        reply.send(Err(busy())).unwrap();
    });

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2]);
    assert_eq!(snapshot.page, 2);
    assert_eq!(snapshot.phase, LoaderPhase::Error);
    let error = snapshot.error.unwrap();
    assert!(!error.is_cancellation);
    assert_eq!(error.user_message, MSG_SERVICE_BUSY);

    tokio::join!(loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 2);
        reply.send(Ok(page_of(2, 2, 2, true))).unwrap();
    });
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2, 3, 4]);
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn failed_initial_load_records_error() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Err(busy())).unwrap();
    });

    let snapshot = loader.snapshot();
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.loading_initial);
    assert_eq!(snapshot.phase, LoaderPhase::Error);
}

#[tokio::test]
async fn cancellation_outcome_is_not_an_error() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply
            .send(Err(GraphqlClientError::Cancelled {
                reason: CancelReason::External,
            }))
            .unwrap();
    });

    let snapshot = loader.snapshot();
    assert!(snapshot.error.is_none());
    assert!(!snapshot.loading_initial);
}

#[tokio::test]
async fn reset_discards_superseded_results() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });

    let stale_signal = Arc::new(parking_lot::Mutex::new(None::<CancellationSignal>));
    tokio::join!(
        loader.show_more(),
        async {
            let (stale, stale_reply) = script.next().await;
            *stale_signal.lock() = Some(stale.signal.clone());
            tokio::join!(loader.reset(), async {
                let (fresh, fresh_reply) = script.next().await;
                assert_eq!(fresh.page, 1);
                assert!(stale.signal.is_cancelled());
                // The stale page arriving now must not land.
                let _ = stale_reply.send(Ok(PageResult::new(vec![90, 91], true)));
                fresh_reply.send(Ok(PageResult::new(vec![10, 11], true))).unwrap();
            });
        }
    );

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![10, 11]);
    assert_eq!(snapshot.reset_tick, 1);
    assert_eq!(snapshot.page, 2);
    assert!(!snapshot.loading_more);
    assert!(stale_signal.lock().as_ref().unwrap().is_cancelled());
}

#[tokio::test]
async fn unmount_cancels_and_freezes_state() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.load_initial(), async {
        let (request, reply) = script.next().await;
        loader.unmount();
        assert!(request.signal.is_cancelled());
        let _ = reply.send(Ok(page_of(1, 2, 2, true)));
    });

    let snapshot = loader.snapshot();
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.phase, LoaderPhase::Unmounted);

    loader.show_more().await;
    loader.load_initial().await;
    loader.reset().await;
    script.assert_idle();
    assert_eq!(loader.snapshot().reset_tick, 0);
}

#[tokio::test]
async fn dropping_the_loader_cancels_in_flight_work() {
    let (pages, mut script) = scripted();
    let loader = Arc::new(IncrementalLoader::new(pages, options(2)));

    let task = {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move { loader.load_initial().await })
    };
    let (request, _reply) = script.next().await;
    task.abort();
    let _ = task.await;
    drop(loader);

    assert!(request.signal.is_cancelled());
}

#[tokio::test]
async fn dependency_changes_reload() {
    let calls = Arc::new(AtomicUsize::new(0));
    let fetch = {
        let calls = Arc::clone(&calls);
        move |request: PageRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, GraphqlClientError>(page_of(request.page, 2, 2, true)) }
        }
    };
    let loader = IncrementalLoader::new(fetch, options(2));

    loader.set_dependencies(&("trending", 2024)).await;
    loader.set_dependencies(&("trending", 2024)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    loader.show_more().await;
    assert_eq!(loader.snapshot().items.len(), 4);

    loader.set_dependencies(&("trending", 2025)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2]);
    assert_eq!(snapshot.page, 2);
}

#[tokio::test]
async fn failed_dependency_reload_restarts_from_the_first_page() {
    let (pages, mut script) = scripted();
    let loader = IncrementalLoader::new(pages, options(2));

    tokio::join!(loader.set_dependencies("airing"), async {
        let (_, reply) = script.next().await;
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    for page in 2..=3 {
        tokio::join!(loader.show_more(), async {
            let (_, reply) = script.next().await;
            reply.send(Ok(page_of(page, 2, 2, true))).unwrap();
        });
    }
    assert_eq!(loader.snapshot().page, 4);

    tokio::join!(loader.set_dependencies("finished"), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 1);
        reply.send(Err(busy())).unwrap();
    });
    let snapshot = loader.snapshot();
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.phase, LoaderPhase::Error);

    tokio::join!(loader.show_more(), async {
        let (request, reply) = script.next().await;
        assert_eq!(request.page, 1);
        reply.send(Ok(page_of(1, 2, 2, true))).unwrap();
    });
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.items, vec![1, 2]);
    assert_eq!(snapshot.page, 2);
}

#[tokio::test]
async fn subscribers_see_each_transition() {
    let fetch = |request: PageRequest| async move {
        Ok::<_, GraphqlClientError>(page_of(request.page, 2, 1, true))
    };
    let loader = IncrementalLoader::new(fetch, options(2));
    let mut updates = loader.subscribe();
    assert_eq!(updates.borrow_and_update().phase, LoaderPhase::Idle);

    loader.load_initial().await;

    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.phase, LoaderPhase::Ended);
    assert_eq!(latest.items, vec![1]);
}
