use crate::record::{Assets, Record};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use pest::iterators::Pair;
use pest::Parser;

use std::fs;
use std::path::Path;

#[derive(Parser)]
#[grammar = "sheet.pest"]
pub struct SheetParser;

/// Output of an import: new records and every account key used while
/// building them. Each key used in `records` appears in `detected_keys`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportBatch {
    pub records: Vec<Record>,
    pub detected_keys: Vec<String>,
}

pub trait ImportSource {
    fn import(&self) -> Result<ImportBatch>;
}

/// Comma or tab separated sheet with a header row.
///
/// `date`, `income`, `mpf` and `note` columns are recognised by name in any
/// letter case, `total` and `gain` columns are skipped since both are
/// derived, and any other column is an account key.
#[derive(Clone, Debug)]
pub struct SheetImport {
    input: String,
}

impl SheetImport {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path)
            .with_context(|| format!("reading sheet `{}'", path.display()))?;
        Ok(Self::new(input))
    }
}

impl ImportSource for SheetImport {
    fn import(&self) -> Result<ImportBatch> {
        parse_sheet(&self.input)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Column {
    Date,
    Income,
    Mpf,
    Note,
    Derived,
    Asset(String),
}

impl Column {
    fn from_header(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "date" => Column::Date,
            "income" => Column::Income,
            "mpf" => Column::Mpf,
            "note" => Column::Note,
            "total" | "gain" => Column::Derived,
            _ => Column::Asset(name.to_string()),
        }
    }
}

struct Row {
    line: usize,
    cells: Vec<String>,
}

impl Row {
    fn parse(token: Pair<Rule>) -> Row {
        let line = token.as_span().start_pos().line_col().0;
        let cells = token.into_inner().map(cell_str).collect();
        Row { line, cells }
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

fn cell_str(cell: Pair<Rule>) -> String {
    match cell.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => inner
            .into_inner()
            .next()
            .map(|q| q.as_str().replace("\"\"", "\""))
            .unwrap_or_default(),
        Some(inner) => inner.as_str().trim().to_string(),
        None => String::new(),
    }
}

pub fn parse_sheet(input: &str) -> Result<ImportBatch> {
    let sheet = SheetParser::parse(Rule::sheet, input)?
        .next()
        .ok_or(anyhow!("empty sheet"))?;

    let mut rows = sheet
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::row)
        .map(Row::parse)
        .filter(|row| !row.is_blank());

    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(ImportBatch::default()),
    };
    let columns = parse_header(&header)?;

    let mut batch = ImportBatch {
        records: Vec::new(),
        detected_keys: columns
            .iter()
            .filter_map(|col| match col {
                Column::Asset(key) => Some(key.clone()),
                _ => None,
            })
            .collect(),
    };

    for row in rows {
        batch.records.push(parse_row(&columns, &header, &row)?);
    }

    Ok(batch)
}

fn parse_header(header: &Row) -> Result<Vec<Column>> {
    let mut columns: Vec<Column> = Vec::with_capacity(header.cells.len());
    for name in &header.cells {
        if name.is_empty() {
            return Err(anyhow!(format!(
                "line {}: empty column name in header",
                header.line
            )));
        }
        let column = Column::from_header(name);
        if column != Column::Derived && columns.contains(&column) {
            return Err(anyhow!(format!(
                "line {}: duplicate column `{}'",
                header.line, name
            )));
        }
        columns.push(column);
    }

    if !columns.contains(&Column::Date) {
        return Err(anyhow!(format!(
            "line {}: sheet has no `date' column",
            header.line
        )));
    }

    Ok(columns)
}

fn parse_row(columns: &[Column], header: &Row, row: &Row) -> Result<Record> {
    if row.cells.len() > columns.len() {
        return Err(anyhow!(format!(
            "line {}: row has {} cells, header has {}",
            row.line,
            row.cells.len(),
            columns.len()
        )));
    }

    let mut date: Option<NaiveDate> = None;
    let mut assets = Assets::new();
    let mut income = 0f64;
    let mut mpf = 0f64;
    let mut note = None;

    for (idx, cell) in row.cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        let name = &header.cells[idx];
        match &columns[idx] {
            Column::Date => {
                date = Some(
                    NaiveDate::parse_from_str(cell, "%Y-%m-%d").with_context(|| {
                        format!("line {}, column `{}': invalid date `{}'", row.line, name, cell)
                    })?,
                )
            }
            Column::Income => income = parse_number(cell, row.line, name)?,
            Column::Mpf => mpf = parse_number(cell, row.line, name)?,
            Column::Note => note = Some(cell.clone()),
            Column::Derived => {}
            Column::Asset(key) => {
                assets.insert(key.clone(), parse_number(cell, row.line, name)?);
            }
        }
    }

    let date = date.ok_or(anyhow!(format!("line {}: missing date", row.line)))?;
    let mut record = Record::new(date, assets);
    record.set_income(income);
    record.set_mpf(mpf);
    record.set_note(note);
    Ok(record)
}

fn parse_number(cell: &str, line: usize, name: &str) -> Result<f64> {
    cell.replace(',', "")
        .parse::<f64>()
        .with_context(|| format!("line {}, column `{}': invalid number `{}'", line, name, cell))
}
