//! Offset pagination for the product-search API.
//!
//! The API reports `meta.pagination.totalCount` and accepts `limit` +
//! `offset`. It refuses offsets past a fixed ceiling, so the number of
//! products requested is capped before pages are planned.

/// The pages to request for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// Total the API reported.
    pub reported_total: u64,
    /// `min(total_cap, reported_total)`.
    pub effective_total: u64,
    pub page_size: u32,
    pub page_count: u32,
}

impl PagePlan {
    /// Plans `ceil(min(total_cap, reported_total) / page_size)` pages.
    ///
    /// A zero `page_size` plans no pages.
    #[must_use]
    pub fn new(reported_total: u64, page_size: u32, total_cap: u32) -> Self {
        let effective_total = reported_total.min(u64::from(total_cap));
        let page_count = if page_size == 0 {
            0
        } else {
            effective_total.div_ceil(u64::from(page_size))
        };
        Self {
            reported_total,
            effective_total,
            page_size,
            page_count: u32::try_from(page_count).unwrap_or(u32::MAX),
        }
    }

    /// Offset of the 0-based `page`.
    #[must_use]
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page) * u64::from(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_three_pages_for_130_products() {
        let plan = PagePlan::new(130, 60, 1000);
        assert_eq!(plan.effective_total, 130);
        assert_eq!(plan.page_count, 3);
        let offsets: Vec<u64> = (0..plan.page_count).map(|p| plan.offset(p)).collect();
        assert_eq!(offsets, vec![0, 60, 120]);
    }

    #[test]
    fn zero_reported_total_plans_no_pages() {
        let plan = PagePlan::new(0, 60, 1000);
        assert_eq!(plan.page_count, 0);
    }

    #[test]
    fn cap_below_page_size_plans_exactly_one_page() {
        let plan = PagePlan::new(5000, 60, 40);
        assert_eq!(plan.effective_total, 40);
        assert_eq!(plan.page_count, 1);
    }

    #[test]
    fn cap_limits_large_catalogs() {
        let plan = PagePlan::new(4321, 60, 1000);
        assert_eq!(plan.effective_total, 1000);
        // ceil(1000 / 60) = 17
        assert_eq!(plan.page_count, 17);
        assert_eq!(plan.offset(16), 960);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let plan = PagePlan::new(120, 12, 1000);
        assert_eq!(plan.page_count, 10);
    }

    #[test]
    fn zero_page_size_plans_nothing() {
        let plan = PagePlan::new(100, 0, 1000);
        assert_eq!(plan.page_count, 0);
    }
}
