use crate::flatten::types::{Row, Sheet, Workbook};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes each sheet of a workbook to its own JSON Lines file, padding the
/// columns a row omits so downstream tabular tooling sees a rectangle.
pub struct SheetWriter {
    output_dir: PathBuf,
}

impl SheetWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        Ok(SheetWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    /// Write the main sheet and every sub-sheet, one `<name>.jsonl` each.
    pub fn write_workbook(&self, main_sheet_name: &str, book: &Workbook) -> Result<()> {
        self.write_sheet(main_sheet_name, &book.main_sheet)?;
        for (name, sheet) in &book.sub_sheets {
            self.write_sheet(name, sheet)?;
        }
        Ok(())
    }

    fn write_sheet(&self, name: &str, sheet: &Sheet) -> Result<()> {
        let path = self.output_dir.join(format!("{name}.jsonl"));
        let mut file =
            File::create(&path).context(format!("Failed to create file: {}", path.display()))?;
        for row in &sheet.rows {
            let line = serde_json::to_string(&pad_row(sheet, row))
                .context("Failed to serialize row")?;
            writeln!(file, "{line}").context("Failed to write row")?;
        }
        Ok(())
    }
}

/// A simpler writer that streams every row to a single output, tagging each
/// with the sheet it belongs to.
pub struct SingleWriter<W: Write> {
    writer: W,
}

impl<W: Write> SingleWriter<W> {
    pub fn new(writer: W) -> Self {
        SingleWriter { writer }
    }

    pub fn write_workbook(&mut self, main_sheet_name: &str, book: &Workbook) -> Result<()> {
        self.write_sheet(main_sheet_name, &book.main_sheet)?;
        for (name, sheet) in &book.sub_sheets {
            self.write_sheet(name, sheet)?;
        }
        Ok(())
    }

    fn write_sheet(&mut self, name: &str, sheet: &Sheet) -> Result<()> {
        for row in &sheet.rows {
            let mut output = pad_row(sheet, row);
            output.insert("_sheet".to_string(), Value::String(name.to_string()));
            let line = serde_json::to_string(&output).context("Failed to serialize row")?;
            writeln!(self.writer, "{line}").context("Failed to write row")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

/// Emit the row's cells in sheet column order, with an empty string for
/// every column the row omits.
fn pad_row(sheet: &Sheet, row: &Row) -> Row {
    sheet
        .columns
        .iter()
        .map(|column| {
            let cell = row
                .get(column)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            (column.clone(), cell)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{FlattenConfig, Flattener};
    use serde_json::json;

    #[test]
    fn test_single_writer_pads_and_tags() {
        let book = Flattener::new(FlattenConfig::default())
            .flatten_root(&json!([
                {"testA": "x", "testB": "y"},
                {"testA": "z"}
            ]))
            .unwrap();

        let mut buffer = Vec::new();
        let mut writer = SingleWriter::new(&mut buffer);
        writer.write_workbook("main", &book).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"_sheet\":\"main\""));
        // The second row pads the column it omits.
        assert!(lines[1].contains("\"testB\":\"\""));
    }

    #[test]
    fn test_sheet_writer_one_file_per_sheet() {
        let book = Flattener::new(FlattenConfig::default())
            .flatten_root(&json!([
                {"ocid": "ocds-1", "awards": [{"testC": "x"}]}
            ]))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let writer = SheetWriter::new(dir.path()).unwrap();
        writer.write_workbook("main", &book).unwrap();

        assert!(dir.path().join("main.jsonl").exists());
        let awards = std::fs::read_to_string(dir.path().join("awards.jsonl")).unwrap();
        assert!(awards.contains("\"ocid\":\"ocds-1\""));
        assert!(awards.contains("\"testC\":\"x\""));
    }
}
