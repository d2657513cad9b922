//! Book model: stock counters and rating aggregates

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Lending status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Active,
    /// Never eligible for new checkouts, whatever its stock says
    Retired,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Active => "active",
            BookStatus::Retired => "retired",
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Active
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BookStatus::Active),
            "retired" => Ok(BookStatus::Retired),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Running `(count, sum)` of review ratings with the derived average.
///
/// The average is never recomputed from the reviews themselves; every review
/// mutation shifts count and sum, and the average is rederived from those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RatingAggregate {
    pub count: i32,
    pub sum: i64,
    pub average: Decimal,
}

impl RatingAggregate {
    pub fn new(count: i32, sum: i64) -> Self {
        Self {
            count,
            sum,
            average: Self::average_of(count, sum),
        }
    }

    /// `sum / count` rounded half away from zero to 2 places, or 0 when empty
    pub fn average_of(count: i32, sum: i64) -> Decimal {
        if count <= 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(sum) / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Shift the aggregate by `count_delta` reviews totalling `sum_delta`.
    /// Returns `None` if the count would go negative.
    pub fn shifted(&self, count_delta: i32, sum_delta: i64) -> Option<Self> {
        let count = self.count.checked_add(count_delta)?;
        if count < 0 {
            return None;
        }
        let sum = if count == 0 { 0 } else { self.sum + sum_delta };
        Some(Self::new(count, sum))
    }
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub status: BookStatus,
    pub rating_count: i32,
    pub rating_sum: i64,
    #[schema(value_type = String)]
    pub rating_average: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// A book can be lent out when it is active and has a copy on the shelf
    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Active && self.available_copies > 0
    }

    pub fn rating(&self) -> RatingAggregate {
        RatingAggregate {
            count: self.rating_count,
            sum: self.rating_sum,
            average: self.rating_average,
        }
    }

    pub fn set_rating(&mut self, rating: RatingAggregate) {
        self.rating_count = rating.count;
        self.rating_sum = rating.sum;
        self.rating_average = rating.average;
    }

    /// Copies currently out on loan
    pub fn on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Available copies after resizing a book's stock to `new_total`: the shelf
/// count moves by the same delta as the total, clamped to `[0, new_total]`.
pub fn resized_available(total: i32, available: i32, new_total: i32) -> i32 {
    let delta = new_total - total;
    (available + delta).clamp(0, new_total.max(0))
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
}

/// Resize inventory request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResizeInventory {
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: i32,
}
