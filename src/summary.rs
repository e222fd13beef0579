//! The month-period summary: income, expenses and balance for one calendar
//! month.
//!
//! A [Period] is a calendar month. Its date interval is half-open,
//! `[first_of_month, first_of_next_month)`, so a transaction dated on the
//! first of the next month never leaks into the previous month's totals.

use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use crate::{Error, category::CategoryType, transaction::CategorisedTransaction};

/// A calendar month, e.g. March 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    year: i32,
    month: Month,
}

/// Years outside this range make the next-month rollover fall outside the
/// dates `time` can represent.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9998;

impl Period {
    /// Create a period from a year and a month number (1 = January).
    ///
    /// # Errors
    /// This function will return an [Error::InvalidPeriod] if the month is
    /// not in 1-12 or the year is outside the range 1-9998.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let month = Month::try_from(month)
            .map_err(|_| Error::InvalidPeriod(format!("{year:04}-{month:02}")))?;

        if !YEAR_RANGE.contains(&year) {
            return Err(Error::InvalidPeriod(format!(
                "{year:04}-{:02}",
                u8::from(month)
            )));
        }

        Ok(Self { year, month })
    }

    /// Parse a period from the `YYYY-MM` form used by the ledger page's
    /// `month` query parameter and by month form inputs.
    ///
    /// # Errors
    /// This function will return an [Error::InvalidPeriod] if `raw` is not
    /// a four digit year and a two digit month separated by a hyphen, or if
    /// the month number is invalid.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let (year, month) =
            sscanf::sscanf!(raw, "{u16:/[0-9][0-9][0-9][0-9]/}-{u8:/[0-9][0-9]/}")
                .ok_or_else(|| Error::InvalidPeriod(raw.to_string()))?;

        Self::new(year as i32, month)
    }

    /// The current calendar month, preferring the local UTC offset and
    /// falling back to UTC when the local offset cannot be determined.
    pub fn current() -> Self {
        let today = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date();

        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// The half-open date interval `[first_of_month, first_of_next_month)`
    /// covered by this period. December rolls over into January of the next
    /// year.
    pub fn date_interval(self) -> (Date, Date) {
        let (next_year, next_month) = match self.month {
            Month::December => (self.year + 1, Month::January),
            month => (self.year, month.next()),
        };

        (
            first_day(self.year, self.month),
            first_day(next_year, next_month),
        )
    }

    /// The previous calendar month. Saturates at January of year 1.
    pub fn previous(self) -> Self {
        match (self.year, self.month) {
            (1, Month::January) => self,
            (year, Month::January) => Self {
                year: year - 1,
                month: Month::December,
            },
            (year, month) => Self {
                year,
                month: month.previous(),
            },
        }
    }

    /// The next calendar month. Saturates at December of year 9998.
    pub fn next(self) -> Self {
        match (self.year, self.month) {
            (9998, Month::December) => self,
            (year, Month::December) => Self {
                year: year + 1,
                month: Month::January,
            },
            (year, month) => Self {
                year,
                month: month.next(),
            },
        }
    }

    /// The `YYYY-MM` form used in URLs and month form inputs.
    pub fn query_value(self) -> String {
        format!("{:04}-{:02}", self.year, u8::from(self.month))
    }

    /// A human readable label such as "March 2024".
    pub fn label(self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

fn first_day(year: i32, month: Month) -> Date {
    // Total for any year in YEAR_RANGE, which Period::new guarantees.
    Date::from_calendar_date(year, month, 1)
        .expect("the first day of a month is always a valid date")
}

/// The income, expense and balance totals for one [Period].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSummary {
    /// The sum of the amounts of income transactions in the period.
    pub total_income: Decimal,
    /// The sum of the amounts of expense transactions in the period.
    pub total_expense: Decimal,
}

impl MonthSummary {
    /// Income minus expenses. Negative when more money went out than came in.
    pub fn balance(self) -> Decimal {
        self.total_income - self.total_expense
    }
}

/// Compute the month summary for `period` over `transactions`.
///
/// Transactions outside the period's half-open date interval are ignored.
/// Transactions without a category belong to neither partition and
/// contribute to neither total.
pub fn compute_summary(transactions: &[CategorisedTransaction], period: Period) -> MonthSummary {
    let (start, end) = period.date_interval();

    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;

    for transaction in transactions {
        if transaction.date < start || transaction.date >= end {
            continue;
        }

        match transaction.category_type {
            Some(CategoryType::Income) => total_income += transaction.amount.value(),
            Some(CategoryType::Expense) => total_expense += transaction.amount.value(),
            None => {}
        }
    }

    MonthSummary {
        total_income,
        total_expense,
    }
}


#[cfg(test)]
mod summary_tests {
    use rust_decimal::Decimal;
    use time::Date;
    use time::macros::date;

    use crate::{
        category::{CategoryName, CategoryType},
        summary::{Period, compute_summary},
        transaction::{Amount, CategorisedTransaction, PaymentMethod},
    };

    fn categorised(
        amount: Decimal,
        date: Date,
        category_type: Option<CategoryType>,
    ) -> CategorisedTransaction {
        CategorisedTransaction {
            id: 1,
            amount: Amount::new_unchecked(amount),
            date,
            description: String::new(),
            payment_method: PaymentMethod::Cash,
            category_id: category_type.map(|_| 1),
            category_name: category_type.map(|_| CategoryName::new_unchecked("Test")),
            category_type,
        }
    }

    #[test]
    fn summary_of_no_transactions_is_zero() {
        let summary = compute_summary(&[], Period::parse("2024-03").unwrap());

        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.balance(), Decimal::ZERO);
    }

    #[test]
    fn summary_partitions_by_category_type() {
        let transactions = [
            categorised(
                Decimal::new(250000, 2),
                date!(2024 - 03 - 01),
                Some(CategoryType::Income),
            ),
            categorised(
                Decimal::new(7550, 2),
                date!(2024 - 03 - 10),
                Some(CategoryType::Expense),
            ),
            categorised(
                Decimal::new(2450, 2),
                date!(2024 - 03 - 20),
                Some(CategoryType::Expense),
            ),
        ];

        let summary = compute_summary(&transactions, Period::parse("2024-03").unwrap());

        assert_eq!(summary.total_income, Decimal::new(250000, 2));
        assert_eq!(summary.total_expense, Decimal::new(10000, 2));
        assert_eq!(summary.balance(), Decimal::new(240000, 2));
    }

    #[test]
    fn summary_interval_is_half_open() {
        let transactions = [
            // First day of the month is included.
            categorised(
                Decimal::ONE,
                date!(2024 - 03 - 01),
                Some(CategoryType::Income),
            ),
            // Last day of the month is included.
            categorised(
                Decimal::ONE,
                date!(2024 - 03 - 31),
                Some(CategoryType::Income),
            ),
            // First day of the next month is excluded.
            categorised(
                Decimal::ONE,
                date!(2024 - 04 - 01),
                Some(CategoryType::Income),
            ),
            // Last day of the previous month is excluded.
            categorised(
                Decimal::ONE,
                date!(2024 - 02 - 29),
                Some(CategoryType::Income),
            ),
        ];

        let summary = compute_summary(&transactions, Period::parse("2024-03").unwrap());

        assert_eq!(summary.total_income, Decimal::TWO);
    }

    #[test]
    fn summary_ignores_uncategorised_transactions() {
        let transactions = [
            categorised(Decimal::ONE_HUNDRED, date!(2024 - 03 - 10), None),
            categorised(
                Decimal::ONE,
                date!(2024 - 03 - 10),
                Some(CategoryType::Expense),
            ),
        ];

        let summary = compute_summary(&transactions, Period::parse("2024-03").unwrap());

        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ONE);
    }

    #[test]
    fn summary_sums_are_exact() {
        let transactions: Vec<CategorisedTransaction> = (0..10)
            .map(|_| {
                categorised(
                    Decimal::new(10, 2),
                    date!(2024 - 03 - 10),
                    Some(CategoryType::Expense),
                )
            })
            .collect();

        let summary = compute_summary(&transactions, Period::parse("2024-03").unwrap());

        // 0.10 added ten times is exactly 1.00, with no float drift.
        assert_eq!(summary.total_expense, Decimal::new(100, 2));
    }
}
