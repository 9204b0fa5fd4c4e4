//! CSV export of a month of expenses.

use std::io::Write;

use engine::StoredExpense;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    row: i64,
    date: String,
    month: String,
    description: &'a str,
    value: String,
    category: &'a str,
    subcategory: &'a str,
    details: &'a str,
}

impl<'a> From<&'a StoredExpense> for ExportRow<'a> {
    fn from(expense: &'a StoredExpense) -> Self {
        let record = &expense.record;
        Self {
            row: expense.row,
            date: record.date.format("%Y-%m-%d").to_string(),
            month: record.month.to_string(),
            description: &record.description,
            value: record.value.to_string(),
            category: &record.category,
            subcategory: &record.subcategory,
            details: record.details.as_deref().unwrap_or(""),
        }
    }
}

/// Writes one line per expense, preceded by a header. Returns the number of
/// expenses written.
pub fn write_csv<W: Write>(expenses: &[StoredExpense], writer: W) -> Result<usize, csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for expense in expenses {
        out.serialize(ExportRow::from(expense))?;
    }
    out.flush()?;
    Ok(expenses.len())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use engine::ExpenseRecord;

    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let expenses = vec![
            StoredExpense {
                row: 4,
                record: ExpenseRecord::new(
                    date,
                    "Food",
                    "Groceries",
                    "Milk and bread",
                    "12.50".parse().unwrap(),
                    Some("Corner shop, cash".to_string()),
                ),
            },
            StoredExpense {
                row: 7,
                record: ExpenseRecord::new(
                    date,
                    "Home",
                    "Rent",
                    "March",
                    "700".parse().unwrap(),
                    None,
                ),
            },
        ];

        let mut buf = Vec::new();
        let written = write_csv(&expenses, &mut buf).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "row,date,month,description,value,category,subcategory,details",
                "4,2024-03-09,Mar,Milk and bread,12.50,Food,Groceries,\"Corner shop, cash\"",
                "7,2024-03-09,Mar,March,700.00,Home,Rent,",
            ]
        );
    }

    #[test]
    fn empty_month_writes_nothing() {
        let mut buf = Vec::new();
        assert_eq!(write_csv(&[], &mut buf).unwrap(), 0);
        assert!(buf.is_empty());
    }
}
