//! Paginator: turn a total row count into page descriptors.

use log::{debug, error};

use crate::error::{JobError, JobResult};
use crate::types::{Page, Range, Row};
use crate::utils::config::DEFAULT_PAGE_SIZE;

/// Resolved layout of a paginated row range.
#[derive(Clone, Debug)]
pub struct Pagination {
    pub page_size: usize,
    pub total_pages: usize,
    pub range: Range,
    pub pages: Vec<Page>,
}

/// Page size with the default applied.
pub fn effective_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

/// Always `floor(max_rows / page_size) + 1`, even when the division is exact.
/// An exact division therefore ends in a zero-capacity page.
pub fn total_pages(max_rows: usize, page_size: usize) -> usize {
    max_rows / page_size + 1
}

/// Fill range defaults: start 1, stop `total_pages`. A range that is inverted, either as
/// given or once defaults are filled, is rejected.
pub fn resolve_range(range: Range, total_pages: usize) -> JobResult<Range> {
    let resolved = Range {
        start: range.start.max(1),
        stop: if range.stop < 1 {
            total_pages
        } else {
            range.stop
        },
    };
    if resolved.is_empty() {
        return Err(JobError::InvalidArgument(format!(
            "page range start {} is after stop {} ({} total pages)",
            resolved.start, resolved.stop, total_pages
        )));
    }
    Ok(resolved)
}

/// Build page descriptors for `max_rows` rows. Fails when `max_rows < 1`.
pub fn paginate(
    max_rows: usize,
    page_size: usize,
    range: Range,
    index_field: &str,
    row_type: &Row,
) -> JobResult<Pagination> {
    if max_rows < 1 {
        let err = JobError::InvalidArgument("max rows must be at least 1".to_string());
        error!("{}", err);
        return Err(err);
    }
    let page_size = effective_page_size(page_size);
    let total_pages = total_pages(max_rows, page_size);
    let range = resolve_range(range, total_pages)?;

    let mut pages = Vec::with_capacity(range.len());
    for number in range.start..=range.stop {
        let capacity = if number == total_pages {
            max_rows % page_size
        } else {
            page_size
        };
        pages.push(Page::new(number, capacity, index_field, row_type.clone()));
    }

    debug!(
        "paginated {} rows: page size {}, {} total pages, range {}..={} ({} pages)",
        max_rows,
        page_size,
        total_pages,
        range.start,
        range.stop,
        pages.len()
    );

    Ok(Pagination {
        page_size,
        total_pages,
        range,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::default_row_type;

    fn capacities(p: &Pagination) -> Vec<usize> {
        p.pages.iter().map(|page| page.total_rows).collect()
    }

    #[test]
    fn test_total_pages_adds_one_even_on_exact_division() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(20, 10), 3);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(9, 3), 4);
    }

    #[test]
    fn test_zero_page_size_defaults_to_ten() {
        let p = paginate(25, 0, Range::default(), "id", &default_row_type()).unwrap();
        assert_eq!(p.page_size, 10);
        assert_eq!(capacities(&p), vec![10, 10, 5]);
    }

    #[test]
    fn test_resolve_range_defaults() {
        assert_eq!(resolve_range(Range::default(), 7).unwrap(), Range::new(1, 7));
        assert_eq!(resolve_range(Range::new(3, 0), 7).unwrap(), Range::new(3, 7));
        assert_eq!(resolve_range(Range::new(0, 2), 7).unwrap(), Range::new(1, 2));
    }

    #[test]
    fn test_resolve_range_rejects_inverted() {
        assert!(matches!(
            resolve_range(Range::new(5, 2), 7),
            Err(JobError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_resolve_range_rejects_start_past_default_stop() {
        assert!(matches!(
            resolve_range(Range::new(5, 0), 3),
            Err(JobError::InvalidArgument(_))
        ));
        assert_eq!(resolve_range(Range::new(3, 0), 3).unwrap(), Range::new(3, 3));
    }

    #[test]
    fn test_stop_past_total_pages_uses_full_capacity() {
        let p = paginate(25, 10, Range::new(2, 5), "id", &default_row_type()).unwrap();
        let numbers: Vec<usize> = p.pages.iter().map(|page| page.number).collect();
        assert_eq!(numbers, vec![2, 3, 4, 5]);
        assert_eq!(capacities(&p), vec![10, 5, 10, 10]);
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(matches!(
            paginate(0, 10, Range::default(), "id", &default_row_type()),
            Err(JobError::InvalidArgument(_))
        ));
    }
}
