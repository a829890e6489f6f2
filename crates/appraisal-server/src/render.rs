//! Plain-text [`ReportRenderer`].

use appraisal_core::report::{Block, COLUMNS, Report, ReportRenderer};

const WIDTH: usize = 78;
const COLUMN_WIDTHS: [usize; 4] = [18, 8, 28, 12];

/// Renders reports as fixed-width UTF-8 text. Page breaks become form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

fn row(cells: &[&str; 4]) -> String {
  cells
    .iter()
    .zip(COLUMN_WIDTHS)
    .map(|(cell, width)| format!("{cell:<width$}"))
    .collect::<Vec<_>>()
    .join(" ")
    .trim_end()
    .to_owned()
}

impl ReportRenderer for TextRenderer {
  fn content_type(&self) -> &'static str { "text/plain; charset=utf-8" }

  fn extension(&self) -> &'static str { "txt" }

  fn render(&self, report: &Report) -> Vec<u8> {
    let mut out = String::new();
    for block in &report.blocks {
      match block {
        Block::Title(t) => {
          out.push_str(format!("{t:^WIDTH$}").trim_end());
          out.push_str("\n\n");
        }
        Block::Heading(h) => {
          out.push_str(h);
          out.push('\n');
          out.push_str(&"-".repeat(h.chars().count()));
          out.push('\n');
        }
        Block::Line(l) => {
          out.push_str(l);
          out.push('\n');
        }
        Block::TableHeader => {
          out.push_str(&row(&COLUMNS));
          out.push('\n');
        }
        Block::TableRow(cells) => {
          let [stage, score, reviewer, date] = cells;
          out.push_str(&row(&[stage, score, reviewer, date].map(String::as_str)));
          out.push('\n');
        }
        Block::Note(n) => {
          out.push_str("    ");
          out.push_str(n);
          out.push('\n');
        }
        Block::Rule => {
          out.push_str(&"=".repeat(WIDTH));
          out.push('\n');
        }
        Block::PageBreak => out.push('\u{c}'),
      }
    }
    out.into_bytes()
  }
}
