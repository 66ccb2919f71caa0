// src/transform.rs
use tracing::debug;

use crate::data_types::{CellCoord, OrderField, OrderRecord, RawGrid, Summary};
use crate::error::LocateError;

/// Sheet row holding the summary counters (I2:K2).
const SUMMARY_ROW: usize = 1;
const SUMMARY_COLUMNS: [usize; 3] = [8, 9, 10];

/// Data row `id` lives on sheet row `id + 2`: one for the header, one for 1-based numbering.
const FIRST_DATA_SHEET_ROW: usize = 2;

/// Reads an integer the way the sheet's users type them: `"12"`, `" 7 pcs"`, `"3.5"`.
/// Anything without leading digits is 0.
pub fn parse_int(text: &str) -> i64 {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    match digits[..end].parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

pub fn parse(grid: &RawGrid) -> (Vec<OrderRecord>, Summary) {
    if grid.is_empty() {
        return (Vec::new(), Summary::default());
    }

    let summary = match grid.get(SUMMARY_ROW) {
        Some(row) => {
            let [total, pending, shipped] = SUMMARY_COLUMNS.map(|i| parse_int(cell(row, i)));
            Summary {
                total_orders: total,
                pending_design: pending,
                shipped,
            }
        }
        None => Summary::default(),
    };

    let records: Vec<OrderRecord> = grid
        .iter()
        .skip(1)
        .enumerate()
        .map(|(id, row)| {
            let mut record = OrderRecord {
                id,
                ..OrderRecord::default()
            };
            for field in OrderField::all() {
                record.apply(field, cell(row, field.column()));
            }
            record
        })
        .collect();

    debug!(rows = grid.len(), records = records.len(), "parsed sheet grid");
    (records, summary)
}

pub fn locate(id: usize, field: OrderField) -> CellCoord {
    CellCoord {
        row: id + FIRST_DATA_SHEET_ROW,
        col: field.column(),
    }
}

/// Like [`locate`] for callers holding a field name; unknown names are rejected
/// rather than falling back to the order number column.
// The app itself only passes `OrderField`; this is the entry point for name-keyed edits.
#[cfg_attr(not(test), allow(dead_code))]
pub fn locate_by_name(id: usize, field: &str) -> Result<CellCoord, LocateError> {
    OrderField::from_name(field)
        .map(|f| locate(id, f))
        .ok_or_else(|| LocateError::UnknownField(field.to_string()))
}

impl OrderRecord {
    /// The field as it would be written to its cell.
    pub fn field_text(&self, field: OrderField) -> String {
        match field {
            OrderField::OrderNumber => self.order_number.clone(),
            OrderField::PurchaseOrder => self.purchase_order.clone(),
            OrderField::ChildDetails => self.child_details.clone(),
            OrderField::DesignType => self.design_type.clone(),
            OrderField::Quantity => self.quantity.to_string(),
            OrderField::TrackingNumber => self.tracking_number.clone(),
            OrderField::Status => self.status.clone(),
            OrderField::Notes => self.notes.clone(),
        }
    }

    /// Sets the field from cell text, with the same parsing `parse` uses.
    pub fn apply(&mut self, field: OrderField, text: &str) {
        let text = text.to_string();
        match field {
            OrderField::OrderNumber => self.order_number = text,
            OrderField::PurchaseOrder => self.purchase_order = text,
            OrderField::ChildDetails => self.child_details = text,
            OrderField::DesignType => self.design_type = text,
            OrderField::Quantity => self.quantity = parse_int(&text),
            OrderField::TrackingNumber => self.tracking_number = text,
            OrderField::Status => self.status = text,
            OrderField::Notes => self.notes = text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn scenario_grid() -> RawGrid {
        vec![
            row(&["h", "h", "h", "h", "h", "h", "h", "h", "h", "h", "h"]),
            row(&["d", "", "", "", "", "", "", "", "5", "2", "1"]),
            row(&["O1", "P1", "C1", "D1", "3", "T1", "รอดำเนินการ", "N1"]),
        ]
    }

    #[test]
    fn empty_grid_is_not_an_error() {
        let (records, summary) = parse(&Vec::new());
        assert!(records.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn ids_follow_data_row_positions() {
        let mut grid = vec![row(&["header"])];
        for i in 0..5 {
            grid.push(row(&[&format!("O{i}"), "", "", "", "1"]));
        }

        let (records, _) = parse(&grid);
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.id, i);
            assert_eq!(record.order_number, format!("O{i}"));
        }
    }

    #[test]
    fn short_rows_fall_back_to_defaults() {
        let grid = vec![row(&["header"]), row(&["O9", "P9"]), Vec::new()];
        let (records, _) = parse(&grid);

        assert_eq!(records[0].order_number, "O9");
        assert_eq!(records[0].purchase_order, "P9");
        assert_eq!(records[0].child_details, "");
        assert_eq!(records[0].quantity, 0);
        assert_eq!(records[0].notes, "");
        assert_eq!(records[1], OrderRecord { id: 1, ..OrderRecord::default() });
    }

    #[test]
    fn quantity_parsing_never_fails() {
        assert_eq!(parse_int("12"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int(" 7 pcs"), 7);
        assert_eq!(parse_int("3.9"), 3);
        assert_eq!(parse_int("-4"), -4);
        assert_eq!(parse_int("-"), 0);
    }

    #[test]
    fn scenario_reads_summary_and_orders() {
        let (records, summary) = parse(&scenario_grid());

        assert_eq!(
            summary,
            Summary {
                total_orders: 5,
                pending_design: 2,
                shipped: 1
            }
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_number, "d");

        let order = &records[1];
        assert_eq!(order.id, 1);
        assert_eq!(order.order_number, "O1");
        assert_eq!(order.purchase_order, "P1");
        assert_eq!(order.quantity, 3);
        assert_eq!(order.status, "รอดำเนินการ");
        assert_eq!(order.notes, "N1");
    }

    #[test]
    fn header_only_grid_has_zero_summary() {
        let (records, summary) = parse(&vec![row(&["h"; 11])]);
        assert!(records.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn summary_is_taken_verbatim_from_cells() {
        let grid = vec![
            row(&["h"]),
            row(&["", "", "", "", "", "", "", "", "99", "x", ""]),
        ];
        let (records, summary) = parse(&grid);
        assert_eq!(records.len(), 1);
        assert_eq!(summary.total_orders, 99);
        assert_eq!(summary.pending_design, 0);
        assert_eq!(summary.shipped, 0);
    }

    #[test]
    fn locate_maps_id_and_field_to_sheet_cell() {
        assert_eq!(locate(3, OrderField::Status), CellCoord { row: 5, col: 6 });
        assert_eq!(locate(0, OrderField::OrderNumber), CellCoord { row: 2, col: 0 });
        assert_eq!(locate(0, OrderField::Notes).a1(), "H2");
    }

    #[test]
    fn locate_by_name_rejects_unknown_fields() {
        assert_eq!(locate_by_name(3, "status"), Ok(CellCoord { row: 5, col: 6 }));
        assert_eq!(
            locate_by_name(3, "customer"),
            Err(LocateError::UnknownField("customer".to_string()))
        );
    }

    #[test]
    fn write_then_reread_keeps_field_value() {
        let mut grid = scenario_grid();
        let (records, _) = parse(&grid);

        for record in &records {
            for field in OrderField::all() {
                let coord = locate(record.id, field);
                let target = &mut grid[coord.row - 1];
                if target.len() <= coord.col {
                    target.resize(coord.col + 1, String::new());
                }
                target[coord.col] = record.field_text(field);

                let (reread, _) = parse(&grid);
                assert_eq!(
                    reread[record.id].field_text(field),
                    record.field_text(field),
                    "field {field} of record {}",
                    record.id
                );
            }
        }
    }

    #[test]
    fn apply_uses_cell_parsing() {
        let mut record = OrderRecord::default();
        record.apply(OrderField::Quantity, "8 ชิ้น");
        record.apply(OrderField::Status, "จัดส่งแล้ว");
        assert_eq!(record.quantity, 8);
        assert_eq!(record.status, "จัดส่งแล้ว");
        assert_eq!(record.field_text(OrderField::Quantity), "8");
    }
}
