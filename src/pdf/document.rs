//! 报表文档模型
//!
//! 报表只由固定的几类块组成，不支持任意排版。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone)]
pub struct TableColumn {
    pub title: String,
    pub weight: f32, // 相对宽度
    pub align: Align,
}

impl TableColumn {
    pub fn new(title: impl Into<String>, weight: f32) -> Self {
        Self {
            title: title.into(),
            weight,
            align: Align::Left,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 缺少的单元格补空，多余的丢弃
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Heading(String),
    Fields(Vec<(String, String)>),
    Table(Table),
    Text(String),
    Spacer(f32), // 毫米
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub footer: Option<String>,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            footer: None,
            blocks: Vec::new(),
        }
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Heading(text.into()));
        self
    }

    pub fn fields<K, V>(&mut self, pairs: Vec<(K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.blocks.push(Block::Fields(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn table(&mut self, table: Table) -> &mut Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Text(text.into()));
        self
    }

    pub fn spacer(&mut self, mm: f32) -> &mut Self {
        self.blocks.push(Block::Spacer(mm));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_and_trims() {
        let mut table = Table::new(vec![TableColumn::new("A", 1.0), TableColumn::new("B", 1.0)]);
        table.push_row(["only"]);
        table.push_row(["1", "2", "3"]);
        assert_eq!(table.rows[0], vec!["only".to_string(), String::new()]);
        assert_eq!(table.rows[1], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_builder_keeps_block_order() {
        let mut doc = ReportDocument::new("Attendance Report");
        doc.heading("Student").fields(vec![("Name", "Ann")]).spacer(4.0);
        assert!(matches!(doc.blocks[0], Block::Heading(_)));
        assert!(matches!(doc.blocks[1], Block::Fields(_)));
        assert!(matches!(doc.blocks[2], Block::Spacer(_)));
    }
}
