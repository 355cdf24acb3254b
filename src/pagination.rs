//! Page bounds for article listings.
//!
//! An empty result is still "page 1 of 1", and out-of-range requests clamp
//! silently instead of failing.

/// Number of pages needed for `total` items, never less than one.
///
/// A `limit` of zero is treated as one item per page.
pub fn compute_total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let pages = total.div_ceil(limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page into `[1, total_pages]`.
pub fn clamp_page(requested: u32, total_pages: u32) -> u32 {
    requested.clamp(1, total_pages.max(1))
}

/// The items of `page` (1-based, clamped) when showing `limit` per page.
pub fn page_slice<T: Clone>(items: &[T], page: u32, limit: u32) -> Vec<T> {
    let limit = limit.max(1) as usize;
    let page = clamp_page(page, compute_total_pages(items.len() as u64, limit as u32)) as usize;
    items.iter().skip((page - 1) * limit).take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_is_at_least_one() {
        assert_eq!(compute_total_pages(0, 20), 1);
        assert_eq!(compute_total_pages(1, 20), 1);
        assert_eq!(compute_total_pages(20, 20), 1);
        assert_eq!(compute_total_pages(21, 20), 2);
        assert_eq!(compute_total_pages(57, 10), 6);
    }

    #[test]
    fn test_total_pages_matches_ceiling_division() {
        for total in 1..200u64 {
            for limit in 1..25u32 {
                let expected = ((total as f64) / (limit as f64)).ceil() as u32;
                assert_eq!(compute_total_pages(total, limit), expected, "total={total} limit={limit}");
            }
        }
    }

    #[test]
    fn test_zero_limit_does_not_divide_by_zero() {
        assert_eq!(compute_total_pages(5, 0), 5);
    }

    #[test]
    fn test_clamp_page_bounds_and_idempotence() {
        for total_pages in 1..10u32 {
            for requested in 0..15u32 {
                let clamped = clamp_page(requested, total_pages);
                assert!((1..=total_pages).contains(&clamped));
                assert_eq!(clamp_page(clamped, total_pages), clamped);
            }
        }
        assert_eq!(clamp_page(0, 0), 1);
    }

    #[test]
    fn test_page_slice() {
        let items: Vec<u32> = (1..=45).collect();
        assert_eq!(page_slice(&items, 1, 20), (1..=20).collect::<Vec<_>>());
        assert_eq!(page_slice(&items, 3, 20), (41..=45).collect::<Vec<_>>());
        // Beyond the last page clamps to it.
        assert_eq!(page_slice(&items, 9, 20), (41..=45).collect::<Vec<_>>());
        assert!(page_slice::<u32>(&[], 1, 20).is_empty());
    }
}
