// src/data_types.rs
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};

/// Rows of cell text exactly as the sheet returned them.
pub type RawGrid = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Local(PathBuf),
    Cloud { spreadsheet_id: String },
}

impl DataSource {
    pub fn describe(&self) -> String {
        match self {
            DataSource::Local(dir) => format!("Local folder {}", dir.display()),
            DataSource::Cloud { spreadsheet_id } => format!("Google Sheets {spreadsheet_id}"),
        }
    }
}

/// An editable column of the order sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    OrderNumber,
    PurchaseOrder,
    ChildDetails,
    DesignType,
    Quantity,
    TrackingNumber,
    Status,
    Notes,
}

pub struct ColumnSpec {
    pub field: OrderField,
    pub index: usize,
    pub name: &'static str,
    pub header: &'static str,
}

/// Field to column mapping, used for both reading rows and locating writes.
pub static COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec { field: OrderField::OrderNumber, index: 0, name: "orderNumber", header: "เลขออเดอร์" },
    ColumnSpec { field: OrderField::PurchaseOrder, index: 1, name: "purchaseOrder", header: "เลขคำสั่งซื้อ" },
    ColumnSpec { field: OrderField::ChildDetails, index: 2, name: "childDetails", header: "ชื่อเด็กพร้อมรายละเอียด" },
    ColumnSpec { field: OrderField::DesignType, index: 3, name: "designType", header: "แบบที่" },
    ColumnSpec { field: OrderField::Quantity, index: 4, name: "quantity", header: "จำนวน" },
    ColumnSpec { field: OrderField::TrackingNumber, index: 5, name: "trackingNumber", header: "เลขพัสดุ" },
    ColumnSpec { field: OrderField::Status, index: 6, name: "status", header: "สถานะ" },
    ColumnSpec { field: OrderField::Notes, index: 7, name: "notes", header: "หมายเหตุ" },
];

impl OrderField {
    fn column_spec(self) -> &'static ColumnSpec {
        // COLUMNS is ordered like the enum
        &COLUMNS[self as usize]
    }

    pub fn column(self) -> usize {
        self.column_spec().index
    }

    pub fn name(self) -> &'static str {
        self.column_spec().name
    }

    pub fn header(self) -> &'static str {
        self.column_spec().header
    }

    // only reached through `transform::locate_by_name`
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_name(name: &str) -> Option<OrderField> {
        COLUMNS.iter().find(|c| c.name == name).map(|c| c.field)
    }

    pub fn all() -> impl Iterator<Item = OrderField> {
        COLUMNS.iter().map(|c| c.field)
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The six status values offered by the status picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Designing,
    AwaitingApproval,
    PreparingShipment,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Designing,
        OrderStatus::AwaitingApproval,
        OrderStatus::PreparingShipment,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "รอดำเนินการ",
            OrderStatus::Designing => "กำลังออกแบบ",
            OrderStatus::AwaitingApproval => "รอการอนุมัติ",
            OrderStatus::PreparingShipment => "เตรียมจัดส่ง",
            OrderStatus::Shipped => "จัดส่งแล้ว",
            OrderStatus::Cancelled => "ยกเลิก",
        }
    }

    /// Sheet text that is not one of the six labels has no status.
    pub fn from_label(label: &str) -> Option<OrderStatus> {
        Self::ALL.into_iter().find(|s| s.label() == label.trim())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRecord {
    /// Position among the data rows. Reassigned on every fetch.
    pub id: usize,
    pub order_number: String,
    pub purchase_order: String,
    pub child_details: String,
    pub design_type: String,
    pub quantity: i64,
    pub tracking_number: String,
    pub status: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_orders: i64,
    pub pending_design: i64,
    pub shipped: i64,
}

/// A spreadsheet cell: `row` is the 1-based sheet row, `col` the 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub fn column_letters(&self) -> String {
        let mut n = self.col + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        letters.iter().rev().collect()
    }

    pub fn a1(&self) -> String {
        format!("{}{}", self.column_letters(), self.row)
    }
}

#[derive(Debug, Clone)]
pub struct SheetSnapshot {
    pub tab: String,
    pub records: Vec<OrderRecord>,
    pub summary: Summary,
    pub fetched_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_table_matches_enum_order() {
        for (i, column) in COLUMNS.iter().enumerate() {
            assert_eq!(column.index, i);
            assert_eq!(column.field as usize, i);
            assert_eq!(OrderField::from_name(column.name), Some(column.field));
        }
    }

    #[test]
    fn unknown_field_name_has_no_column() {
        assert_eq!(OrderField::from_name("customer"), None);
        assert_eq!(OrderField::from_name("Status"), None);
    }

    #[test]
    fn a1_notation_handles_multi_letter_columns() {
        assert_eq!(CellCoord { row: 5, col: 6 }.a1(), "G5");
        assert_eq!(CellCoord { row: 2, col: 0 }.a1(), "A2");
        assert_eq!(CellCoord { row: 9, col: 25 }.a1(), "Z9");
        assert_eq!(CellCoord { row: 3, col: 26 }.a1(), "AA3");
    }

    #[test]
    fn status_labels_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(OrderStatus::from_label("shipped"), None);
    }
}
