//! Presentational renderers. Each takes already-loaded data and returns text;
//! none of them talk to the backend or hold state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime};

use crate::cli::table::{truncate, Table};
use crate::model::{AnalysisResult, Auditoria, BrandManual, Contenido, Estado};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Warning,
    Bad,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 0.7 {
            ScoreBand::Good
        } else if score >= 0.4 {
            ScoreBand::Warning
        } else {
            ScoreBand::Bad
        }
    }
}

/// Conformity score as a whole percentage; a missing score counts as zero.
pub fn score_percent(score: Option<f64>) -> u32 {
    let pct = (score.unwrap_or(0.0) * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Calendar date of a backend timestamp, or the raw text when it does not parse.
pub fn format_date(ts: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    ts.to_string()
}

pub fn estado_badge(e: Estado) -> &'static str {
    match e {
        Estado::Pendiente => "Pendiente",
        Estado::Aprobado => "Aprobado",
        Estado::Rechazado => "Rechazado",
    }
}

pub fn content_list(items: &[Contenido], selected: Option<&str>, empty_message: &str) -> String {
    if items.is_empty() {
        return empty_message.to_string();
    }
    let mut t = Table::new(&["", "id", "titulo", "tipo", "estado", "fecha", "extracto"]);
    for c in items {
        let mark = if selected == Some(c.id.as_str()) { "*" } else { "" };
        let excerpt = c.contenido_text.as_deref().map(|s| truncate(s, 150)).unwrap_or_default();
        t.push_row(vec![
            mark.to_string(),
            c.id.clone(),
            c.titulo.clone(),
            c.tipo.as_str().to_string(),
            estado_badge(c.estado).to_string(),
            format_date(&c.created_at),
            excerpt,
        ]);
    }
    t.render()
}

pub fn content_detail(c: &Contenido) -> String {
    let mut out = format!(
        "{}\n  id: {}\n  tipo: {}\n  estado: {}\n  manual: {}\n  creado: {}\n",
        c.titulo,
        c.id,
        c.tipo.as_str(),
        estado_badge(c.estado),
        c.brand_manual_id,
        format_date(&c.created_at)
    );
    if let Some(r) = c.rechazo_razon.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!("  motivo de rechazo: {}\n", r));
    }
    match c.contenido_text.as_deref() {
        Some(text) if !text.is_empty() => {
            out.push_str("\n");
            out.push_str(text);
            out.push('\n');
        }
        _ => out.push_str("\n  (sin contenido generado)\n"),
    }
    out
}

pub fn manual_list(items: &[BrandManual], empty_message: &str) -> String {
    if items.is_empty() {
        return empty_message.to_string();
    }
    let mut t = Table::new(&["id", "nombre", "producto", "tono", "version"]);
    for m in items {
        t.push_row(vec![m.id.clone(), m.nombre.clone(), m.producto.clone(), m.tono.clone(), m.version.to_string()]);
    }
    t.render()
}

/// Audit list. Expanded records show the audited content, the analysis and,
/// when already fetched, the image reference.
pub fn audit_list(
    audits: &[Auditoria],
    contenidos: &[Contenido],
    expanded: &HashSet<String>,
    images: &HashMap<String, String>,
) -> String {
    if audits.is_empty() {
        return "No hay auditorías registradas".to_string();
    }
    let by_id: HashMap<&str, &Contenido> = contenidos.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut t = Table::new(&["id", "contenido", "score", "resultado", "fecha"]);
    for a in audits {
        let titulo = by_id.get(a.contenido_id.as_str()).map(|c| c.titulo.clone()).unwrap_or_else(|| "Contenido desconocido".to_string());
        t.push_row(vec![
            a.id.clone(),
            titulo,
            format!("{}%", score_percent(a.score_conformidad)),
            if a.cumple() { "Cumple".to_string() } else { "No cumple".to_string() },
            format_date(&a.created_at),
        ]);
    }
    let mut out = t.render();
    for a in audits.iter().filter(|a| expanded.contains(&a.id)) {
        out.push_str(&format!("\n\n== auditoría {} ==\n", a.id));
        if let Some(c) = by_id.get(a.contenido_id.as_str()) {
            out.push_str(&format!("Contenido auditado: {} ({})\n", c.titulo, c.tipo.as_str()));
        }
        if let Some(text) = a.gemini_analysis.as_deref().filter(|s| !s.is_empty()) {
            out.push_str("Análisis:\n");
            out.push_str(text);
            out.push('\n');
        }
        match images.get(&a.id) {
            Some(img) => out.push_str(&format!("Imagen: {}\n", describe_image(img))),
            None => out.push_str("Imagen: no cargada\n"),
        }
    }
    out
}

pub fn analysis_summary(r: &AnalysisResult) -> String {
    let band = match ScoreBand::of(r.score) {
        ScoreBand::Good => "alto",
        ScoreBand::Warning => "medio",
        ScoreBand::Bad => "bajo",
    };
    format!(
        "Score de conformidad: {}% ({})\nResultado: {}\n\n{}",
        score_percent(Some(r.score)),
        band,
        if r.auditoria.cumple() { "Cumple" } else { "No cumple" },
        r.analisis
    )
}

pub fn stats_cards(cards: &[(&str, usize)]) -> String {
    let mut t = Table::new(&cards.iter().map(|(l, _)| *l).collect::<Vec<_>>());
    t.push_row(cards.iter().map(|(_, v)| v.to_string()).collect());
    t.render()
}

/// Short description of a `data:` URL without dumping the payload.
fn describe_image(data_url: &str) -> String {
    match data_url.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((meta, payload)) => format!("{} ({} bytes base64)", meta, payload.len()),
        None => format!("{} chars", data_url.len()),
    }
}
