use std::cell::RefCell;
use std::rc::Rc;

use comicbook::loader::{ImageLoader, PageSource};
use comicbook::preload::{EventKind, PreloadEvent, PreloadState, Preloader};
use comicbook::test_utils::{EventLog, ScriptedLoader, placeholder_sources};

/// Five placeholder pages with a buffer of four: ready lands between the
/// fourth and fifth image, and images arrive in source order
#[test]
fn test_placeholder_book_preloads_in_order() {
    let sources = placeholder_sources();
    let preloader = Preloader::new(sources.clone()).unwrap().with_buffer_size(4);
    let log = EventLog::attach(preloader.events());

    let summary = smol::block_on(preloader.run(&ImageLoader::new())).unwrap();

    assert_eq!(summary.loaded, 5);
    assert_eq!(
        log.entries(),
        [
            "start", "image:0", "image:1", "image:2", "image:3", "ready", "image:4", "finish"
        ]
    );
    let expected: Vec<_> = sources.iter().map(PageSource::as_str).collect();
    assert_eq!(log.image_sources(), expected);
}

/// Decoded placeholder pages are 1x1 and cached at their index
#[test]
fn test_placeholder_pages_are_cached() {
    let preloader = Preloader::new(placeholder_sources()).unwrap();
    smol::block_on(preloader.run(&ImageLoader::new())).unwrap();

    for index in 0..5 {
        let page = preloader.cache().get(index).unwrap();
        assert_eq!((page.width(), page.height()), (1, 1));
    }
    assert_eq!(preloader.status().state, PreloadState::Complete);
}

/// Every image notification arrives after its page is readable from the cache
#[test]
fn test_image_event_follows_cache_insert() {
    let preloader = Preloader::new(placeholder_sources()).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let cache = preloader.cache().clone();
        let seen = seen.clone();
        preloader.events().on(EventKind::Image, move |event| {
            if let PreloadEvent::Image { index, .. } = event {
                seen.borrow_mut().push(cache.contains(*index));
            }
        });
    }

    smol::block_on(preloader.run(&ImageLoader::new())).unwrap();

    assert_eq!(*seen.borrow(), [true; 5]);
}

/// A broken source is reported and skipped; the rest of the book still loads
#[test]
fn test_broken_source_is_skipped() {
    let mut sources = placeholder_sources();
    sources.insert(2, PageSource::from("data:image/gif;base64,not-an-image"));
    let preloader = Preloader::new(sources).unwrap();
    let log = EventLog::attach(preloader.events());

    let summary = smol::block_on(preloader.run(&ImageLoader::new())).unwrap();

    assert_eq!((summary.loaded, summary.failed), (5, 1));
    assert_eq!(
        log.entries(),
        [
            "start", "image:0", "image:1", "error:2", "image:3", "image:4", "ready", "image:5",
            "finish"
        ]
    );
}

/// A missing file is reported through the error channel with its source
#[test]
fn test_missing_file_reports_source() {
    let preloader = Preloader::new(vec![PageSource::from("/no/such/page.png")]).unwrap();
    let failed = Rc::new(RefCell::new(None));
    {
        let failed = failed.clone();
        preloader.events().on(EventKind::Error, move |event| {
            if let PreloadEvent::Error { source, .. } = event {
                *failed.borrow_mut() = Some(source.as_str().to_string());
            }
        });
    }

    let summary = smol::block_on(preloader.run(&ImageLoader::new())).unwrap();

    assert_eq!(summary.loaded, 0);
    assert_eq!(failed.borrow().as_deref(), Some("/no/such/page.png"));
    assert_eq!(preloader.status().state, PreloadState::Complete);
}

/// Listeners on the same channel all run, and unsubscribed ones do not
#[test]
fn test_multiple_listeners_per_channel() {
    let preloader = Preloader::new(placeholder_sources()).unwrap();
    let first = EventLog::attach(preloader.events());
    let second = EventLog::attach(preloader.events());

    let dropped = preloader.events().on(EventKind::Image, |_| {
        panic!("unsubscribed listener was called");
    });
    assert!(preloader.events().off(dropped));

    smol::block_on(preloader.run(&ScriptedLoader::new())).unwrap();

    assert_eq!(first.entries(), second.entries());
    assert_eq!(first.entries().len(), 8);
}

/// The pipeline can run on a local executor alongside other tasks
#[test]
fn test_runs_on_local_executor() {
    let preloader = Preloader::new(placeholder_sources()).unwrap();
    let loader = ScriptedLoader::new();
    let ex = smol::LocalExecutor::new();

    let task = ex.spawn({
        let preloader = preloader.clone();
        async move { preloader.run(&loader).await }
    });
    let summary = smol::block_on(ex.run(task)).unwrap();

    assert_eq!(summary.loaded, 5);
    assert_eq!(preloader.cache().loaded(), 5);
}
