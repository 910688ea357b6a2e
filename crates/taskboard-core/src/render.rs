use std::io::{
  self,
  IsTerminal,
  Write
};

use anyhow::anyhow;
use taskboard_shared::Severity;
use unicode_width::UnicodeWidthStr;

use crate::board::{
  BoardView,
  CardView,
  ColumnView,
  SummaryChips
};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
  color: bool
}

impl Renderer {
  pub fn new(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let color_cfg = cfg
      .get("color")
      .unwrap_or_else(|| "on".to_string());
    let color = match color_cfg
      .to_ascii_lowercase()
      .as_str()
    {
      | "on" | "yes" | "true" | "1" => true,
      | "off" | "no" | "false" | "0" => {
        false
      }
      | other => {
        return Err(anyhow!(
          "invalid color setting: {other}"
        ));
      }
    };

    Ok(Self {
      color: color
        && io::stdout().is_terminal()
    })
  }

  pub fn plain() -> Self {
    Self {
      color: false
    }
  }

  #[tracing::instrument(skip_all)]
  pub fn print_board(
    &self,
    view: &BoardView
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    self.write_board(&mut out, view)
  }

  pub fn print_column(
    &self,
    column: &ColumnView
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    self.write_column(&mut out, column)
  }

  pub fn write_board<W: Write>(
    &self,
    mut out: W,
    view: &BoardView
  ) -> anyhow::Result<()> {
    for (idx, column) in
      view.columns.iter().enumerate()
    {
      if idx > 0 {
        writeln!(out)?;
      }
      self.write_column(&mut out, column)?;
    }

    if !view.busy.is_empty() {
      let busy = view
        .busy
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ");
      writeln!(out)?;
      writeln!(out, "in flight: {busy}")?;
    }
    for (kind, message) in
      &view.operation_errors
    {
      writeln!(
        out,
        "{} {message}",
        self.paint(
          &format!("{} failed:", kind.as_str()),
          "31"
        )
      )?;
    }
    Ok(())
  }

  pub fn write_column<W: Write>(
    &self,
    mut out: W,
    column: &ColumnView
  ) -> anyhow::Result<()> {
    let mut heading = format!(
      "{} ({})",
      column.title, column.footer
    );
    if column.overdue_count > 0 {
      heading.push_str(&format!(
        ", {} overdue",
        column.overdue_count
      ));
    }
    if column.loading {
      heading.push_str(" [loading]");
    } else if column.refreshing {
      heading.push_str(" [refreshing]");
    }
    writeln!(out, "{}", self.paint(&heading, "1"))?;

    if let Some(err) = column.error.as_deref() {
      writeln!(
        out,
        "{}",
        self.paint(&format!("! {err}"), "31")
      )?;
    }

    if column.cards.is_empty() {
      writeln!(out, "  (no tasks)")?;
      return Ok(());
    }

    let headers = vec![
      "ID".to_string(),
      "Pri".to_string(),
      "Due".to_string(),
      "Title".to_string(),
      "Assignees".to_string(),
      "Tags".to_string(),
    ];
    let rows = column
      .cards
      .iter()
      .map(|card| self.card_row(card))
      .collect();
    write_table(&mut out, headers, rows)
  }

  fn card_row(
    &self,
    card: &CardView
  ) -> Vec<String> {
    let mut due =
      card.due_label.clone().unwrap_or_default();
    if let Some(label) =
      card.overdue_label.as_deref()
    {
      if due.is_empty() {
        due = label.to_string();
      } else {
        due = format!("{due}, {label}");
      }
    }
    let due = match card.severity() {
      | Some(severity) => self.paint(
        &due,
        severity_color(severity)
      ),
      | None => due
    };

    vec![
      self.paint(card.id.as_str(), "33"),
      card.priority.as_str().to_string(),
      due,
      card.title.clone(),
      card.assignees.join(", "),
      card
        .tags
        .iter()
        .map(|tag| format!("+{tag}"))
        .collect::<Vec<_>>()
        .join(" "),
    ]
  }

  #[tracing::instrument(skip(self, card))]
  pub fn print_card(
    &self,
    card: &CardView
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    self.write_card(&mut out, card)
  }

  pub fn write_card<W: Write>(
    &self,
    mut out: W,
    card: &CardView
  ) -> anyhow::Result<()> {
    writeln!(out, "id        {}", card.id)?;
    writeln!(out, "title     {}", card.title)?;
    writeln!(
      out,
      "status    {}",
      card.status.label()
    )?;
    writeln!(
      out,
      "priority  {}",
      card.priority.as_str()
    )?;
    writeln!(out, "category  {}", card.category)?;
    if !card.tags.is_empty() {
      writeln!(
        out,
        "tags      {}",
        card.tags.join(", ")
      )?;
    }
    if let Some(due) = card.due_label.as_deref()
    {
      writeln!(out, "due       {due}")?;
    }
    if let Some(label) =
      card.overdue_label.as_deref()
    {
      let label = match card.severity() {
        | Some(severity) => self.paint(
          &format!(
            "{label} ({})",
            severity.as_str()
          ),
          severity_color(severity)
        ),
        | None => label.to_string()
      };
      writeln!(out, "overdue   {label}")?;
    }
    if let Some(estimate) =
      card.estimate_label.as_deref()
    {
      writeln!(out, "estimate  {estimate}")?;
    }
    if !card.assignees.is_empty() {
      writeln!(
        out,
        "assigned  {}",
        card.assignees.join(", ")
      )?;
    }
    if let Some(by) = card.assigner.as_deref() {
      writeln!(out, "by        {by}")?;
    }
    writeln!(
      out,
      "updated   {}",
      card.updated_label
    )?;
    Ok(())
  }

  pub fn print_chips(
    &self,
    chips: &SummaryChips
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    let labels = chips
      .labels()
      .into_iter()
      .map(|label| format!("[{label}]"))
      .collect::<Vec<_>>()
      .join(" ");
    writeln!(out, "{labels}")?;
    Ok(())
  }

  fn paint(
    &self,
    text: &str,
    code: &str
  ) -> String {
    if !self.color {
      return text.to_string();
    }
    format!("\x1b[{code}m{text}\x1b[0m")
  }
}

fn severity_color(
  severity: Severity
) -> &'static str {
  match severity {
    | Severity::Critical => "1;31",
    | Severity::High => "31",
    | Severity::Medium => "33",
    | Severity::Low => "36"
  }
}

fn write_table<W: Write>(
  mut writer: W,
  headers: Vec<String>,
  rows: Vec<Vec<String>>
) -> anyhow::Result<()> {
  let column_count = headers.len();
  let mut widths = vec![0usize; column_count];

  for (idx, header) in
    headers.iter().enumerate()
  {
    widths[idx] = widths[idx].max(
      UnicodeWidthStr::width(header.as_str())
    );
  }

  for row in &rows {
    for (idx, cell) in row.iter().enumerate()
    {
      widths[idx] = widths[idx].max(
        UnicodeWidthStr::width(
          strip_ansi(cell).as_str()
        )
      );
    }
  }

  for (header, width) in
    headers.iter().zip(&widths)
  {
    write!(
      writer,
      "  {header:width$}",
      width = *width
    )?;
  }
  writeln!(writer)?;

  for width in &widths {
    write!(
      writer,
      "  {:-<width$}",
      "",
      width = *width
    )?;
  }
  writeln!(writer)?;

  for row in rows {
    for (cell, width) in row.iter().zip(&widths)
    {
      let visible = UnicodeWidthStr::width(
        strip_ansi(cell).as_str()
      );
      let padding =
        width.saturating_sub(visible);
      write!(
        writer,
        "  {cell}{}",
        " ".repeat(padding)
      )?;
    }
    writeln!(writer)?;
  }

  Ok(())
}

fn strip_ansi(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut escaped = false;

  for ch in s.chars() {
    if escaped {
      if ch == 'm' {
        escaped = false;
      }
      continue;
    }

    if ch == '\x1b' {
      escaped = true;
      continue;
    }

    out.push(ch);
  }

  out
}
