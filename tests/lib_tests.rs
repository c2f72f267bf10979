use anyhow::{Result, bail};
use pagerun::{
    CancelToken, ErrorPolicy, Job, JobError, Packer, Page, Range, Record, Row, Stager, Value,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// --- test stages ---

/// Packs `total_rows` rows of `[page number, row index]` into the page.
struct Fill;

impl Stager for Fill {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        for i in 0..page.total_rows {
            let row = page.row_type.pack(vec![
                Value::Integer(page.number as i64),
                Value::Integer(i as i64),
            ]);
            page.rows.push(row);
        }
        Ok(())
    }

    fn paginate_query(&self, page: &Page) -> String {
        format!("fill {} rows", page.total_rows)
    }
}

/// Fails on the listed page numbers.
struct FailOn(Vec<usize>);

impl Stager for FailOn {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        if self.0.contains(&page.number) {
            bail!("bad page {}", page.number);
        }
        Ok(())
    }

    fn paginate_query(&self, _page: &Page) -> String {
        String::new()
    }

    fn name(&self) -> &str {
        "fail-on"
    }
}

/// Counts calls.
#[derive(Default)]
struct Counter(Arc<AtomicUsize>);

impl Stager for Counter {
    fn query_page(&self, _page: &mut Page) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn paginate_query(&self, _page: &Page) -> String {
        String::new()
    }
}

/// Cancels `token` when it sees page `at`.
struct CancelAt {
    at: usize,
    token: CancelToken,
}

impl Stager for CancelAt {
    fn query_page(&self, page: &mut Page) -> Result<()> {
        if page.number == self.at {
            self.token.cancel();
        }
        Ok(())
    }

    fn paginate_query(&self, _page: &Page) -> String {
        String::new()
    }
}

fn numbers(pages: &[Page]) -> Vec<usize> {
    pages.iter().map(|p| p.number).collect()
}

fn capacities(pages: &[Page]) -> Vec<usize> {
    pages.iter().map(|p| p.total_rows).collect()
}

fn paginated(max_rows: usize, page_size: usize, workers: usize) -> Job {
    let mut job = Job::new("id", page_size, workers);
    job.paginate(max_rows).unwrap();
    job
}

// --- paginate ---

#[test]
fn test_paginate_25_rows_by_10() {
    let job = paginated(25, 10, 1);
    assert_eq!(job.total_pages, 3);
    assert_eq!(numbers(&job.pages), vec![1, 2, 3]);
    assert_eq!(capacities(&job.pages), vec![10, 10, 5]);
}

#[test]
fn test_paginate_exact_division_ends_with_empty_page() {
    let job = paginated(20, 10, 1);
    assert_eq!(job.total_pages, 3);
    assert_eq!(capacities(&job.pages), vec![10, 10, 0]);
}

#[test]
fn test_paginate_default_range_covers_total_pages() {
    for max_rows in 1..=60 {
        for page_size in 1..=12 {
            let job = paginated(max_rows, page_size, 1);
            assert_eq!(job.pages.len(), max_rows / page_size + 1);
            assert_eq!(job.pages.len(), job.total_pages);
            let last = job.pages.last().unwrap();
            assert_eq!(last.total_rows, max_rows % page_size);
            assert!(job.pages[..job.pages.len() - 1]
                .iter()
                .all(|p| p.total_rows == page_size));
        }
    }
}

#[test]
fn test_paginate_rejects_zero_rows() {
    let mut job = Job::new("id", 10, 1);
    let err = job.paginate(0).unwrap_err();
    assert!(matches!(err, JobError::InvalidArgument(_)));
    assert!(job.pages.is_empty());
}

#[test]
fn test_paginate_page_count_matches_explicit_range() {
    for (start, stop) in [(1, 1), (2, 4), (3, 3), (5, 12)] {
        let mut job = Job::new("id", 10, 1);
        job.page_range = Range::new(start, stop);
        job.paginate(100).unwrap();
        assert_eq!(job.pages.len(), stop - start + 1);
        assert_eq!(job.pages.first().unwrap().number, start);
        assert_eq!(job.pages.last().unwrap().number, stop);
    }
}

#[test]
fn test_paginate_rejects_inverted_range() {
    let mut job = Job::new("id", 10, 1);
    job.page_range = Range::new(4, 2);
    assert!(matches!(
        job.paginate(100),
        Err(JobError::InvalidArgument(_))
    ));
}

#[test]
fn test_paginate_rejects_start_past_last_page() {
    let mut job = Job::new("id", 10, 1);
    job.page_range = Range::new(5, 0);
    assert!(matches!(
        job.paginate(25),
        Err(JobError::InvalidArgument(_))
    ));
    assert!(job.pages.is_empty());
    assert_eq!(job.resolved_range, Range::default());
}

#[test]
fn test_paginate_is_idempotent() {
    let mut job = Job::new("order_id", 7, 1);
    job.paginate(50).unwrap();
    let first: Vec<(usize, usize, String)> = job
        .pages
        .iter()
        .map(|p| (p.number, p.total_rows, p.index_field.clone()))
        .collect();
    job.paginate(50).unwrap();
    let second: Vec<(usize, usize, String)> = job
        .pages
        .iter()
        .map(|p| (p.number, p.total_rows, p.index_field.clone()))
        .collect();
    assert_eq!(first, second);
    assert!(first.iter().all(|(_, _, field)| field == "order_id"));
}

#[test]
fn test_paginate_defaults_page_size() {
    let job = paginated(25, 0, 1);
    assert_eq!(job.page_size, 10);
    assert_eq!(job.pages.len(), 3);
}

// --- run ---

#[test]
fn test_run_returns_every_page_once() {
    for workers in [1, 2, 3, 8] {
        let job = paginated(95, 10, workers).with_stage(Fill);
        let pages = job.run().unwrap();
        assert_eq!(pages.len(), 10);
        let seen: BTreeSet<usize> = pages.iter().map(|p| p.number).collect();
        assert_eq!(seen, (1..=10).collect::<BTreeSet<_>>());
        let rows: usize = pages.iter().map(|p| p.rows.len()).sum();
        assert_eq!(rows, 95);
    }
}

#[test]
fn test_run_more_workers_than_pages() {
    let job = paginated(5, 10, 16).with_stage(Fill);
    let pages = job.run().unwrap();
    assert_eq!(numbers(&pages), vec![1]);
    assert_eq!(pages[0].rows.len(), 5);
}

#[test]
fn test_run_stage_error_fails_run() {
    let job = paginated(50, 10, 1)
        .with_stage(Fill)
        .with_stage(FailOn(vec![2, 4]));
    match job.run() {
        Err(JobError::Stage(err)) => {
            assert_eq!(err.page, 2);
            assert_eq!(err.stage, "fail-on");
            assert_eq!(err.message, "bad page 2");
        }
        other => panic!("expected stage error, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_run_stage_error_with_many_workers() {
    let job = paginated(200, 10, 4).with_stage(FailOn(vec![7]));
    match job.run() {
        Err(JobError::Stage(err)) => assert_eq!(err.page, 7),
        other => panic!("expected stage error, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_run_collect_all_keeps_failed_pages() {
    let mut job = paginated(50, 10, 3)
        .with_stage(FailOn(vec![3, 5]))
        .with_stage(Fill);
    job.error_policy = ErrorPolicy::CollectAll;
    let pages = job.run().unwrap();
    assert_eq!(pages.len(), 6);
    let mut failed: Vec<usize> = pages
        .iter()
        .filter(|p| p.has_errors())
        .map(|p| p.number)
        .collect();
    failed.sort();
    assert_eq!(failed, vec![3, 5]);
    // Fill runs after the failing stage and still fills the page.
    let page3 = pages.iter().find(|p| p.number == 3).unwrap();
    assert_eq!(page3.rows.len(), 10);
    assert_eq!(page3.errors[0].stage, "fail-on");
}

#[test]
fn test_later_stages_run_after_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let job = paginated(10, 10, 1)
        .with_stage(FailOn(vec![1]))
        .with_stage(Counter(Arc::clone(&calls)));
    let page = job.process_page(job.pages[0].clone());
    assert_eq!(page.errors.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_process_page_runs_stages_in_order() {
    let job = paginated(3, 10, 1)
        .with_stage(Fill)
        .with_stage(FailOn(vec![]));
    let page = job.process_page(job.pages[0].clone());
    assert_eq!(page.rows.len(), 3);
    assert_eq!(page.rows[2].unpack(), vec![Value::Integer(1), Value::Integer(2)]);
    assert!(!page.has_errors());
}

#[test]
fn test_run_without_paginate_fails() {
    let job = Job::new("id", 10, 2).with_stage(Fill);
    assert!(matches!(job.run(), Err(JobError::NotPaginated)));
}

#[test]
fn test_run_zero_workers_rejected() {
    let job = paginated(25, 10, 0).with_stage(Fill);
    assert!(matches!(job.run(), Err(JobError::InvalidArgument(_))));
}

#[test]
fn test_run_cancelled_before_start() {
    let job = paginated(100, 10, 2).with_stage(Fill);
    job.cancel_token().cancel();
    match job.run() {
        Err(JobError::Cancelled { completed }) => assert_eq!(completed, 0),
        other => panic!("expected cancel, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_run_cancelled_mid_run() {
    let job = paginated(100, 10, 1);
    let token = job.cancel_token();
    let job = job.with_stage(CancelAt { at: 2, token });
    match job.run() {
        Err(JobError::Cancelled { completed }) => assert!(completed <= 2),
        other => panic!("expected cancel, got {:?}", other.map(|p| p.len())),
    }
}

#[test]
fn test_run_again_after_reset_cancel() {
    let mut job = paginated(30, 10, 2).with_stage(Fill);
    job.cancel_token().cancel();
    assert!(job.run().is_err());
    job.reset_cancel();
    assert_eq!(job.run().unwrap().len(), 4);
}

#[test]
fn test_run_is_repeatable() {
    let job = paginated(42, 5, 3).with_stage(Fill);
    let a = job.run().unwrap();
    let b = job.run().unwrap();
    assert_eq!(a.len(), b.len());
    // The job's own pages are descriptors; runs work on copies.
    assert!(job.pages.iter().all(|p| p.rows.is_empty()));
}

// --- row codec ---

/// Row type that keeps only the first value.
#[derive(Debug)]
struct FirstOnly(Value);

impl Packer for FirstOnly {
    fn unpack(&self) -> Vec<Value> {
        vec![self.0.clone()]
    }

    fn pack(&self, values: Vec<Value>) -> Row {
        Arc::new(FirstOnly(values.into_iter().next().unwrap_or_default()))
    }
}

#[test]
fn test_custom_row_type_is_used_for_packing() {
    let mut job = Job::new("id", 4, 2);
    job.row_type = Arc::new(FirstOnly(Value::Null));
    job.paginate(6).unwrap();
    let pages = job.with_stage(Fill).run().unwrap();
    for page in &pages {
        for row in &page.rows {
            assert_eq!(row.unpack(), vec![Value::Integer(page.number as i64)]);
        }
    }
}

#[test]
fn test_record_round_trips_values() {
    let values = vec![
        Value::Null,
        Value::Integer(-3),
        Value::Real(1.5),
        Value::Text("x".into()),
        Value::Blob(vec![0xab, 0x01]),
    ];
    let row = Record::default().pack(values.clone());
    assert_eq!(row.unpack(), values);
    let fields: Vec<String> = values.iter().map(Value::to_field).collect();
    assert_eq!(fields, vec!["", "-3", "1.5", "x", "ab01"]);
}
