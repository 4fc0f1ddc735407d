use crate::domain::model::{ContentBlock, Table};
use crate::utils::error::{ReportError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn separator_cell() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:?-+:?$").expect("static separator regex"))
}

/// 把章節內容切成段落與表格；含 `|` 的連續行視為一個表格
pub fn split_blocks(content: &str) -> Result<Vec<ContentBlock>> {
    let mut blocks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut in_table = false;

    for line in content.trim().lines() {
        if line.contains('|') {
            if !in_table {
                flush_paragraph(&mut buffer, &mut blocks);
                in_table = true;
            }
            buffer.push(line.trim());
        } else {
            if in_table {
                blocks.push(ContentBlock::Table(parse_table_block(&buffer)?));
                buffer.clear();
                in_table = false;
            }
            buffer.push(line);
        }
    }

    if in_table {
        blocks.push(ContentBlock::Table(parse_table_block(&buffer)?));
    } else {
        flush_paragraph(&mut buffer, &mut blocks);
    }

    Ok(blocks)
}

fn flush_paragraph(buffer: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    let text = buffer.join("\n");
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(ContentBlock::Paragraph(text.to_string()));
    }
    buffer.clear();
}

fn parse_table_block(lines: &[&str]) -> Result<Table> {
    let table = parse_markdown_table(&lines.join("\n"))?;
    Ok(clean_table(table))
}

pub fn parse_markdown_table(markdown: &str) -> Result<Table> {
    let rows: Vec<&str> = markdown
        .trim()
        .lines()
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .collect();

    if rows.len() < 3 {
        return Err(ReportError::ValidationError {
            message: format!(
                "Invalid table markdown: insufficient rows (need header, separator and data, got {})",
                rows.len()
            ),
        });
    }

    let separator_ok = rows[1]
        .split('|')
        .map(str::trim)
        .all(|cell| cell.is_empty() || separator_cell().is_match(cell));
    if !separator_ok {
        return Err(ReportError::ValidationError {
            message: format!(
                "Invalid table markdown: separator row must contain only '---' cells, got '{}'",
                rows[1]
            ),
        });
    }

    let split = |row: &str| -> Vec<String> { row.split('|').map(|c| c.trim().to_string()).collect() };
    let mut header = split(rows[0]);
    let mut data: Vec<Vec<String>> = rows[2..].iter().map(|row| split(row)).collect();

    let max_cols = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    header.resize(max_cols, String::new());
    for row in &mut data {
        row.resize(max_cols, String::new());
    }

    tracing::debug!("Markdown table parsed: {} columns, {} rows", max_cols, data.len());
    Ok(Table { header, rows: data })
}

/// 移除整欄皆為空白的欄位（通常來自行首/行尾的 `|`）
pub fn clean_table(table: Table) -> Table {
    let keep: Vec<usize> = (0..table.column_count())
        .filter(|&col| {
            std::iter::once(&table.header)
                .chain(table.rows.iter())
                .any(|row| !row[col].trim().is_empty())
        })
        .collect();

    if keep.is_empty() {
        return table;
    }

    let project = |row: &[String]| -> Vec<String> { keep.iter().map(|&c| row[c].clone()).collect() };
    Table {
        header: project(&table.header),
        rows: table.rows.iter().map(|row| project(row)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDINGS: &str = "| Symbol | Shares | Loss |\n|---|---|---|\n| XYZ | 10 | -100.00 |\n| ABC | 5 | -20.50 |";

    #[test]
    fn test_parse_and_clean_piped_table() {
        let table = clean_table(parse_markdown_table(HOLDINGS).unwrap());
        assert_eq!(table.header, vec!["Symbol", "Shares", "Loss"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["ABC", "5", "-20.50"]);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let md = "a | b | c\n--- | --- | ---\n1 | 2\n1 | 2 | 3 | 4";
        let table = parse_markdown_table(md).unwrap();
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.header[3], "");
        assert_eq!(table.rows[0], vec!["1", "2", "", ""]);
    }

    #[test]
    fn test_parse_rejects_insufficient_rows() {
        let err = parse_markdown_table("| a | b |\n|---|---|").unwrap_err();
        assert!(err.to_string().contains("insufficient rows"));
    }

    #[test]
    fn test_parse_rejects_bad_separator() {
        let err = parse_markdown_table("| a | b |\n| x | y |\n| 1 | 2 |").unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn test_parse_accepts_alignment_colons() {
        let table = parse_markdown_table("| a | b |\n|:---|---:|\n| 1 | 2 |").unwrap();
        assert_eq!(clean_table(table).header, vec!["a", "b"]);
    }

    #[test]
    fn test_clean_keeps_all_blank_table() {
        let table = Table {
            header: vec![String::new(), String::new()],
            rows: vec![vec![String::new(), String::new()]],
        };
        assert_eq!(clean_table(table.clone()), table);
    }

    #[test]
    fn test_split_blocks_text_table_text() {
        let content = format!("Intro line one\nline two\n{}\nClosing remark", HOLDINGS);
        let blocks = split_blocks(&content).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0],
            ContentBlock::Paragraph("Intro line one\nline two".to_string())
        );
        match &blocks[1] {
            ContentBlock::Table(t) => assert_eq!(t.rows.len(), 2),
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(blocks[2], ContentBlock::Paragraph("Closing remark".to_string()));
    }

    #[test]
    fn test_split_blocks_plain_text_only() {
        let blocks = split_blocks("  \n Just words.\n\n").unwrap();
        assert_eq!(blocks, vec![ContentBlock::Paragraph("Just words.".to_string())]);
        assert!(split_blocks("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_blocks_stray_pipe_fails() {
        // 單獨一行含 `|` 的文字會被當成表格，行數不足即失敗
        assert!(split_blocks("Growth | Value tilt").is_err());
    }
}
