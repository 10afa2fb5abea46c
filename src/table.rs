//! Navigable table over a release's assets.

use crate::release::{AssetRecord, ReleaseRecord};
use crate::size::human_readable_size;

/// Column headers and widths of the asset table.
pub const COLUMNS: [(&str, u16); 2] = [("Asset Name", 50), ("Size", 20)];

/// One rendered row: asset name and its size in binary units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRow {
    pub name: String,
    pub size: String,
}

/// The assets of one release plus the cursor and focus over them.
///
/// The cursor always points at a valid row, or at 0 when there are none.
/// Navigation is ignored while the table is unfocused.
#[derive(Debug, Clone)]
pub struct AssetTable {
    assets: Vec<AssetRecord>,
    rows: Vec<AssetRow>,
    cursor: usize,
    focused: bool,
}

impl AssetTable {
    pub fn build(release: &ReleaseRecord) -> Self {
        let rows = release
            .assets
            .iter()
            .map(|asset| AssetRow {
                name: asset.name.clone(),
                size: human_readable_size(asset.size, 1024),
            })
            .collect();

        Self {
            assets: release.assets.clone(),
            rows,
            cursor: 0,
            focused: true,
        }
    }

    pub fn rows(&self) -> &[AssetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The asset under the cursor, or `None` for a release without assets.
    pub fn cursor_asset(&self) -> Option<&AssetRecord> {
        self.assets.get(self.cursor)
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn toggle_focus(&mut self) {
        self.focused = !self.focused;
    }

    /// Move the cursor by `delta` rows, clamped to the table.
    pub fn move_cursor(&mut self, delta: isize) {
        if !self.focused || self.is_empty() {
            return;
        }
        let last = self.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    pub fn select_first(&mut self) {
        if self.focused {
            self.cursor = 0;
        }
    }

    pub fn select_last(&mut self) {
        if self.focused {
            self.cursor = self.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(assets: &[(&str, u64)]) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: "v1".into(),
            title: None,
            published_at: None,
            assets: assets
                .iter()
                .map(|(name, size)| AssetRecord {
                    name: (*name).into(),
                    size: *size,
                    download_url: format!("https://example.com/{name}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rows_follow_asset_order() {
        let table = AssetTable::build(&release(&[("a.zip", 100), ("b.tar", 2048)]));
        let rows: Vec<_> = table
            .rows()
            .iter()
            .map(|r| (r.name.as_str(), r.size.as_str()))
            .collect();
        assert_eq!(rows, [("a.zip", "100 B"), ("b.tar", "2.00 kB")]);
        assert!(table.is_focused());
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut table = AssetTable::build(&release(&[("a", 1), ("b", 2), ("c", 3)]));
        table.move_cursor(-1);
        assert_eq!(table.cursor(), 0);

        table.move_cursor(1);
        table.move_cursor(1);
        table.move_cursor(1);
        assert_eq!(table.cursor(), 2);
        assert_eq!(table.cursor_asset().unwrap().name, "c");

        table.move_cursor(-10);
        assert_eq!(table.cursor(), 0);
        table.move_cursor(isize::MAX);
        assert_eq!(table.cursor(), 2);
    }

    #[test]
    fn test_first_and_last() {
        let mut table = AssetTable::build(&release(&[("a", 1), ("b", 2), ("c", 3)]));
        table.select_last();
        assert_eq!(table.cursor(), 2);
        table.select_first();
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn test_unfocused_ignores_navigation() {
        let mut table = AssetTable::build(&release(&[("a", 1), ("b", 2)]));
        table.toggle_focus();
        assert!(!table.is_focused());

        table.move_cursor(1);
        table.select_last();
        assert_eq!(table.cursor(), 0);

        table.toggle_focus();
        assert!(table.is_focused());
        table.move_cursor(1);
        assert_eq!(table.cursor(), 1);
    }

    #[test]
    fn test_empty_release() {
        let mut table = AssetTable::build(&release(&[]));
        assert!(table.is_empty());
        assert!(table.cursor_asset().is_none());
        table.move_cursor(1);
        table.select_last();
        assert_eq!(table.cursor(), 0);
    }
}
