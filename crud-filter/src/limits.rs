//! Validation limits.
//!
//! # Environment Variables
//!
//! Process-wide defaults can be tuned once at startup:
//!
//! | Variable                       | Default | Description                      |
//! |--------------------------------|---------|----------------------------------|
//! | `CRUD_FILTER_MAX_ORDER_FIELDS` | 5       | Maximum sort keys per request    |
//! | `CRUD_FILTER_MAX_PAGE_SIZE`    | 1000    | Maximum rows per page            |
//!
//! Values are read on first use and cached for the lifetime of the process.
//! Unset, unparsable or zero values fall back to the defaults.

use std::sync::OnceLock;

/// Default maximum number of sort keys.
pub const DEFAULT_MAX_ORDER_FIELDS: usize = 5;

/// Default maximum page size.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

static ENV_LIMITS: OnceLock<Limits> = OnceLock::new();

/// Upper bounds applied by the order and page validators.
///
/// ```
/// use crud_filter::Limits;
///
/// let limits = Limits::new().max_page_size(500);
/// assert_eq!(limits.page_size_limit(), 500);
/// assert_eq!(limits.order_fields_limit(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Limits {
    /// Maximum number of sort keys.
    pub max_order_fields: usize,
    /// Maximum rows per page.
    pub max_page_size: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

impl Limits {
    /// Built-in defaults (5 sort keys, 1000 rows per page).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_order_fields: DEFAULT_MAX_ORDER_FIELDS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Process defaults, with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        *ENV_LIMITS.get_or_init(|| Self {
            max_order_fields: env_limit("CRUD_FILTER_MAX_ORDER_FIELDS")
                .unwrap_or(DEFAULT_MAX_ORDER_FIELDS),
            max_page_size: env_limit("CRUD_FILTER_MAX_PAGE_SIZE").unwrap_or(DEFAULT_MAX_PAGE_SIZE),
        })
    }

    /// Set the maximum number of sort keys.
    #[must_use]
    pub const fn max_order_fields(mut self, max: usize) -> Self {
        self.max_order_fields = max;
        self
    }

    /// Set the maximum page size.
    #[must_use]
    pub const fn max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max;
        self
    }

    /// The sort key limit.
    #[must_use]
    pub const fn order_fields_limit(&self) -> usize {
        self.max_order_fields
    }

    /// The page size limit.
    #[must_use]
    pub const fn page_size_limit(&self) -> u32 {
        self.max_page_size
    }
}

fn env_limit<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value = std::env::var(name).ok()?.trim().parse::<T>().ok()?;
    if value == T::default() {
        tracing::debug!(name, "ignoring zero limit override");
        return None;
    }
    Some(value)
}
