/// Database models
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication lookups
/// - `campaign`: Marketing campaigns, owned by their creator
/// - `lead`: Prospective customers tracked through a sales pipeline
///
/// # Example
///
/// ```no_run
/// use leadline_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "Jane".to_string(),
///     last_name: "Doe".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod campaign;
pub mod lead;
pub mod user;

/// Default page size for list queries
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for list queries
pub const MAX_LIMIT: i64 = 100;

/// Clamps a requested page size into `1..=MAX_LIMIT`, defaulting to
/// [`DEFAULT_LIMIT`] when absent.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Normalizes a requested offset, defaulting to 0 and rejecting negatives.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Conversion rate as a percentage: won / total × 100.
///
/// A zero total yields 0.0 rather than a division error.
pub fn conversion_rate(won_count: i64, total_count: i64) -> f64 {
    if total_count > 0 {
        won_count as f64 / total_count as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_default() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
    }

    #[test]
    fn test_clamp_limit_over_max() {
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(MAX_LIMIT + 1)), MAX_LIMIT);
    }

    #[test]
    fn test_clamp_limit_in_range() {
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(MAX_LIMIT)), MAX_LIMIT);
    }

    #[test]
    fn test_clamp_limit_non_positive() {
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
    }

    #[test]
    fn test_clamp_offset() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(25)), 25);
        assert_eq!(clamp_offset(Some(-1)), 0);
    }

    #[test]
    fn test_conversion_rate_zero_total() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(5, 0), 0.0);
    }

    #[test]
    fn test_conversion_rate() {
        assert_eq!(conversion_rate(1, 4), 25.0);
        assert_eq!(conversion_rate(3, 3), 100.0);
        assert_eq!(conversion_rate(0, 10), 0.0);
        assert!((conversion_rate(1, 3) - 33.333333333333336).abs() < 1e-9);
    }
}
