use terminal_size::{terminal_size, Height, Width};

const MAX_COL_WIDTH: usize = 48;
const MIN_COL_WIDTH: usize = 4;

/// ASCII table with per-column widths, shrunk to fit the terminal.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Table {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
            width: get_terminal_width(),
        }
    }

    pub fn max_width(mut self, w: usize) -> Self { self.width = w; self }

    pub fn push_row(&mut self, cells: Vec<String>) { self.rows.push(cells); }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let sep = build_separator(&widths);
        let mut out = String::new();
        out.push_str(&sep);
        out.push('\n');
        out.push_str(&build_row_header(&self.headers, &widths));
        out.push('\n');
        out.push_str(&sep);
        out.push('\n');
        for r in &self.rows {
            out.push_str(&build_row(r, &widths));
            out.push('\n');
        }
        out.push_str(&sep);
        out.push('\n');
        out.push_str(&format!("rows: {}", self.rows.len()));
        out
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|s| visible_len(s).min(MAX_COL_WIDTH)).collect();
        for r in &self.rows {
            for (i, cell) in r.iter().enumerate().take(widths.len()) {
                let w = visible_len(cell);
                if w > widths[i] { widths[i] = w.min(MAX_COL_WIDTH); }
            }
        }
        // each column costs its width plus " | "
        let total = |ws: &[usize]| ws.iter().map(|w| w + 3).sum::<usize>() + 1;
        while total(&widths) > self.width {
            let Some((idx, &w)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else { break };
            if w <= MIN_COL_WIDTH { break; }
            widths[idx] -= 1;
        }
        widths
    }
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_h))) if w > 4 => (w - 4) as usize,
        _ => 120,
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(visible_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn build_row_header(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        let pad = w.saturating_sub(visible_len(&text));
        s.push(' ');
        s.push_str(&text);
        s.push_str(&" ".repeat(pad));
        s.push(' ');
        s.push('|');
    }
    s
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    // newlines would break the row layout
    let flat: String = s.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
    let len = flat.chars().count();
    if len <= max { return flat; }
    if max <= 1 { return "…".to_string(); }
    flat.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+,_%".contains(ch) { continue; }
        return false;
    }
    has_digit
}

/// Visible chars, skipping ANSI CSI sequences.
fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() { break; }
            }
            continue;
        }
        count += 1;
    }
    count
}
