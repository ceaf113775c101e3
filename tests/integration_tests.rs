//! Integration tests for Book Resolver
//!
//! These tests drive the public resolver API end to end with in-memory
//! providers, so no network access is needed.

use book_resolver::merge::merge;
use book_resolver::models::{BookRecordBuilder, Candidate, SearchHints};
use book_resolver::query::{classify, detect_identifier, extract_fields, parse_query, QueryKind};
use book_resolver::resolver::{CascadeResolver, FastDualLookup, MultiResultAggregator};
use book_resolver::sources::mock::{make_complete_record, make_record};
use book_resolver::sources::{MockProvider, ProviderRegistry};
use book_resolver::utils::COMBINED_SOURCE;
use book_resolver::BookResolver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cascade providers by tier, plus the fast and bulk pairs
struct Fixture {
    cascade: Vec<(u8, Arc<MockProvider>)>,
    first: Arc<MockProvider>,
    second: Arc<MockProvider>,
    timeout: Duration,
}

impl Fixture {
    fn new() -> Self {
        Self {
            cascade: Vec::new(),
            first: Arc::new(MockProvider::new("first")),
            second: Arc::new(MockProvider::new("second")),
            timeout: Duration::from_secs(8),
        }
    }

    fn tier(mut self, tier: u8, provider: &Arc<MockProvider>) -> Self {
        self.cascade.push((tier, Arc::clone(provider)));
        self
    }

    fn pair(mut self, first: &Arc<MockProvider>, second: &Arc<MockProvider>) -> Self {
        self.first = Arc::clone(first);
        self.second = Arc::clone(second);
        self
    }

    fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build(self) -> BookResolver {
        let mut registry = ProviderRegistry::new();
        for (tier, provider) in self.cascade {
            registry.register(tier, provider);
        }
        let cascade = CascadeResolver::new(Arc::new(registry)).with_timeout(self.timeout);
        let fast = FastDualLookup::new(self.first.clone(), self.second.clone());
        let aggregator = MultiResultAggregator::new(fast, self.first, self.second);
        BookResolver::new(cascade, aggregator)
    }
}

#[test]
fn test_identifier_detection() {
    assert_eq!(detect_identifier("978-0-14-312774-1").as_deref(), Some("9780143127741"));
    assert_eq!(detect_identifier(" 0441013597 ").as_deref(), Some("0441013597"));
    assert!(detect_identifier("97801431277411").is_none());
    assert!(detect_identifier("044101359X").is_none());
    assert!(matches!(classify("Dune"), QueryKind::FreeText(_)));
}

#[test]
fn test_parse_title_and_author() {
    let parsed = parse_query("Sapiens by Yuval Noah Harari");
    assert_eq!(parsed.title, "Sapiens");
    assert_eq!(parsed.author.as_deref(), Some("Yuval Noah Harari"));
    assert!(parsed.hints().is_empty());
}

#[test]
fn test_parse_quoted_publisher() {
    let parsed = parse_query(r#"pub:"Penguin Press" Sapiens"#);
    assert_eq!(parsed.publisher.as_deref(), Some("Penguin Press"));
    assert_eq!(parsed.title, "Sapiens");
    assert!(parsed.author.is_none());
}

#[test]
fn test_field_extraction_is_idempotent() {
    let (hints, remainder) = extract_fields("year:1965 Dune lang:en pub:Chilton");
    assert_eq!(hints.year.as_deref(), Some("1965"));
    let (again, unchanged) = extract_fields(&remainder);
    assert!(again.is_empty());
    assert_eq!(unchanged, remainder);
}

#[test]
fn test_merge_precedence() {
    let a = BookRecordBuilder::new("a")
        .title("Dune")
        .subjects(["Fiction"])
        .page_count(412)
        .build();
    let b = BookRecordBuilder::new("b")
        .title("Dune (Deluxe)")
        .author("Frank Herbert")
        .subjects(["Fiction", "Science fiction"])
        .page_count(896)
        .build();

    let merged = merge(&a, &b);
    assert_eq!(merged.title.as_deref(), Some("Dune"));
    assert_eq!(merged.author.as_deref(), Some("Frank Herbert"));
    assert_eq!(merged.subjects.as_ref().map(Vec::len), Some(2));
    assert_eq!(merged.page_count, Some(896));
}

#[tokio::test]
async fn test_cascade_early_stop() {
    let complete = Arc::new(
        MockProvider::new("complete").with_record(make_complete_record("complete", "9780062316097")),
    );
    let lower: Vec<Arc<MockProvider>> = (2..=4)
        .map(|i| {
            Arc::new(
                MockProvider::new(format!("tier{}", i))
                    .with_record(make_record("lower", "9780062316097", "Other")),
            )
        })
        .collect();

    let resolver = Fixture::new()
        .tier(1, &complete)
        .tier(2, &lower[0])
        .tier(3, &lower[1])
        .tier(4, &lower[2])
        .build();

    let record = resolver
        .resolve_by_identifier("978-0-06-231609-7", None)
        .await
        .unwrap();

    assert_eq!(record.title.as_deref(), Some("Sapiens"));
    assert_eq!(complete.lookup_calls(), 1);
    for provider in &lower {
        assert_eq!(provider.lookup_calls(), 0);
    }
}

#[tokio::test]
async fn test_cascade_continues_until_found() {
    let partial = Arc::new(
        MockProvider::new("partial").with_record(make_record("partial", "9780062316097", "Sapiens")),
    );
    let fills = Arc::new(
        MockProvider::new("fills").with_record(
            BookRecordBuilder::new("fills")
                .author("Yuval Noah Harari")
                .page_count(443)
                .build(),
        ),
    );

    let resolver = Fixture::new().tier(1, &partial).tier(3, &fills).build();
    let record = resolver.resolve_by_identifier("9780062316097", None).await.unwrap();

    assert_eq!(record.title.as_deref(), Some("Sapiens"));
    assert_eq!(record.author.as_deref(), Some("Yuval Noah Harari"));
    assert_eq!(record.page_count, Some(443));
    assert_eq!(fills.lookup_calls(), 1);
}

#[tokio::test]
async fn test_cascade_timeout_isolation() {
    let slow = Arc::new(
        MockProvider::new("slow")
            .with_record(make_record("slow", "9780062316097", "Too late"))
            .with_delay(Duration::from_secs(5)),
    );
    let quick = Arc::new(
        MockProvider::new("quick").with_record(make_record("quick", "9780062316097", "Sapiens")),
    );

    let resolver = Fixture::new()
        .tier(1, &slow)
        .tier(1, &quick)
        .timeout(Duration::from_millis(100))
        .build();

    let started = Instant::now();
    let record = resolver.resolve_by_identifier("9780062316097", None).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(record.title.as_deref(), Some("Sapiens"));
    assert_eq!(record.data_sources, vec!["quick"]);
}

#[tokio::test]
async fn test_cascade_not_found_and_failures() {
    let failing = Arc::new(MockProvider::new("failing").failing());
    let empty = Arc::new(MockProvider::new("empty"));
    let unconfigured = Arc::new(
        MockProvider::new("unconfigured")
            .with_record(make_record("unconfigured", "9780062316097", "Hidden"))
            .unconfigured(),
    );

    let resolver = Fixture::new()
        .tier(1, &failing)
        .tier(2, &empty)
        .tier(2, &unconfigured)
        .build();

    assert!(resolver.resolve_by_identifier("9780062316097", None).await.is_none());
    assert_eq!(failing.lookup_calls(), 1);
    assert_eq!(empty.lookup_calls(), 1);
    assert_eq!(unconfigured.lookup_calls(), 0);
}

#[tokio::test]
async fn test_cascade_merge_order_is_declared_order() {
    for _ in 0..5 {
        let slow_first = Arc::new(
            MockProvider::new("a")
                .with_record(make_record("a", "9780062316097", "From a"))
                .with_delay(Duration::from_millis(30)),
        );
        let fast_second = Arc::new(
            MockProvider::new("b").with_record(make_record("b", "9780062316097", "From b")),
        );

        let resolver = Fixture::new()
            .tier(1, &slow_first)
            .tier(1, &fast_second)
            .build();
        let record = resolver.resolve_by_identifier("9780062316097", None).await.unwrap();

        assert_eq!(record.title.as_deref(), Some("From a"));
        assert_eq!(record.data_sources, vec!["a", "b"]);
    }
}

#[tokio::test]
async fn test_cascade_reports_progress() {
    let one = Arc::new(MockProvider::new("one"));
    let two = Arc::new(MockProvider::new("two"));
    let resolver = Fixture::new().tier(1, &one).tier(2, &two).build();

    let seen = Mutex::new(Vec::new());
    let sink = |current: usize, total: usize, _: &str| {
        seen.lock().unwrap().push((current, total));
    };
    resolver.resolve_by_identifier("9780062316097", Some(&sink)).await;

    assert_eq!(seen.into_inner().unwrap(), vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_fast_dual_scenario() {
    let first = Arc::new(MockProvider::new("first").with_record(
        BookRecordBuilder::new("first")
            .title("Sapiens")
            .author("Yuval Noah Harari")
            .build(),
    ));
    let second = Arc::new(MockProvider::new("second").with_record(
        BookRecordBuilder::new("second")
            .description("A brief history of humankind.")
            .subjects(["History"])
            .build(),
    ));

    let resolver = Fixture::new().pair(&first, &second).build();
    let results = resolver.search_multiple("9780143127741", None, None).await;

    assert_eq!(results.len(), 1);
    let record = &results[0];
    assert_eq!(record.title.as_deref(), Some("Sapiens"));
    assert_eq!(record.author.as_deref(), Some("Yuval Noah Harari"));
    assert_eq!(record.description.as_deref(), Some("A brief history of humankind."));
    assert_eq!(record.subjects.as_deref(), Some(&["History".to_string()][..]));
    assert_eq!(first.search_calls(), 0);

    let direct = resolver.lookup_fast("978-0-14-312774-1").await.unwrap();
    assert_eq!(direct.title, record.title);
}

#[tokio::test]
async fn test_search_combines_shared_identifier() {
    let first = Arc::new(MockProvider::new("first").with_candidates(vec![Candidate::new(
        make_record("first", "9780062316097", "Sapiens"),
    )]));
    let second = Arc::new(MockProvider::new("second").with_candidates(vec![
        Candidate::new(make_record("second", "9780062316097", "Sapiens: A Brief History")),
        Candidate::new(make_record("second", "", "Sapiens: A Graphic History")).source_id("second:1"),
    ]));

    let resolver = Fixture::new().pair(&first, &second).build();
    let results = resolver
        .search_multiple("Sapiens by Harari", None, None)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source.as_deref(), Some(COMBINED_SOURCE));
    assert_eq!(results[0].title.as_deref(), Some("Sapiens"));
    assert_eq!(results[0].data_sources, vec!["first", "second"]);
    assert_eq!(results[1].title.as_deref(), Some("Sapiens: A Graphic History"));

    let request = first.last_search().unwrap();
    assert_eq!(request.title, "Sapiens");
    assert_eq!(request.author.as_deref(), Some("Harari"));
}

#[tokio::test]
async fn test_search_combines_isbn10_with_isbn13() {
    let first = Arc::new(MockProvider::new("first").with_candidates(vec![Candidate::new(
        BookRecordBuilder::new("first")
            .title("Sapiens")
            .isbn13("9780143127741")
            .build(),
    )]));
    let second = Arc::new(MockProvider::new("second").with_candidates(vec![Candidate::new(
        make_record("second", "0143127748", "Sapiens (paperback)"),
    )]));

    let resolver = Fixture::new().pair(&first, &second).build();
    let results = resolver.search_multiple("Sapiens", None, None).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].source.as_deref(), Some(COMBINED_SOURCE));
    assert_eq!(results[0].isbn10.as_deref(), Some("0143127748"));
}

#[tokio::test]
async fn test_search_caps_results() {
    let candidates = |prefix: &str, base: u64| -> Vec<Candidate> {
        (0..40)
            .map(|i| {
                Candidate::new(make_record(prefix, &(base + i).to_string(), &format!("{}{}", prefix, i)))
            })
            .collect()
    };
    let first = Arc::new(MockProvider::new("first").with_candidates(candidates("first", 9780000000000)));
    let second =
        Arc::new(MockProvider::new("second").with_candidates(candidates("second", 9781000000000)));

    let resolver = Fixture::new().pair(&first, &second).build();
    let results = resolver.search_multiple("history", None, None).await;

    assert_eq!(results.len(), 50);
    assert_eq!(second.editions_calls(), 0);
}

#[tokio::test]
async fn test_search_edition_expansion_keeps_existing_entries() {
    let work = Candidate::new(
        BookRecordBuilder::new("second")
            .title("Dune")
            .isbn13("9780441013593")
            .publisher("Ace")
            .work_key("/works/OL893415W")
            .build(),
    )
    .work_key("/works/OL893415W");
    let second = Arc::new(
        MockProvider::new("second")
            .with_candidates(vec![work])
            .with_editions(vec![
                make_record("second", "9780441013593", "Dune (edition copy)"),
                make_record("second", "9780340960196", "Dune (Hodder)"),
            ]),
    );
    let first = Arc::new(MockProvider::new("first"));

    let resolver = Fixture::new().pair(&first, &second).build();
    let hints = SearchHints::new().language("en");
    let results = resolver.search_multiple("Dune", None, Some(&hints)).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title.as_deref(), Some("Dune"));
    assert_eq!(results[0].publisher.as_deref(), Some("Ace"));
    assert_eq!(results[1].title.as_deref(), Some("Dune (Hodder)"));
    assert_eq!(
        second.last_search().unwrap().hints.language.as_deref(),
        Some("en")
    );
}

#[tokio::test]
async fn test_search_with_all_providers_failing() {
    let first = Arc::new(MockProvider::new("first").failing());
    let second = Arc::new(MockProvider::new("second").failing());

    let resolver = Fixture::new().pair(&first, &second).build();
    assert!(resolver.search_multiple("Dune", None, None).await.is_empty());
    assert!(resolver.lookup_fast("0441013597").await.is_none());
}
