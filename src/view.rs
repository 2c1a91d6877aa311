//! Pure view arithmetic: pagination windows, bar scaling, cloud layout.
//!
//! Everything here is deterministic given its inputs (the clouds take the RNG
//! as an argument) so it can be unit-tested and benchmarked without a server.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::seq::SliceRandom;

/// One slot in the pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Num(u32),
    Gap,
}

/// Window of page numbers shown around the current page.
///
/// Totals of seven or fewer pages list every page. Larger totals always pin
/// the first and last page, keep a window of one page around the current one
/// clamped to `[2, total - 1]`, and insert a gap marker on the sides that
/// were elided. The strip never exceeds seven numbered slots.
pub fn page_range(current: u32, total: u32) -> Vec<PageToken> {
    if total <= 7 {
        return (1..=total).map(PageToken::Num).collect();
    }

    let mut tokens = vec![PageToken::Num(1)];
    if current > 3 {
        tokens.push(PageToken::Gap);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    for page in start..=end {
        tokens.push(PageToken::Num(page));
    }

    if current < total - 2 {
        tokens.push(PageToken::Gap);
    }
    tokens.push(PageToken::Num(total));
    tokens
}

/// Active listing filters. Only non-empty, trimmed values count; an absent
/// field never reaches the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtro {
    pub anio: Option<String>,
    pub modalidad: Option<String>,
    pub tipo_pieza: Option<String>,
    pub agrupacion: Option<String>,
}

impl Filtro {
    pub fn new(
        anio: Option<&str>,
        modalidad: Option<&str>,
        tipo_pieza: Option<&str>,
        agrupacion: Option<&str>,
    ) -> Self {
        Self {
            anio: presente(anio),
            modalidad: presente(modalidad),
            tipo_pieza: presente(tipo_pieza),
            agrupacion: presente(agrupacion),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anio.is_none()
            && self.modalidad.is_none()
            && self.tipo_pieza.is_none()
            && self.agrupacion.is_none()
    }

    /// `key=value` pairs in wire order, percent-encoded.
    pub fn pares(&self) -> Vec<(&'static str, &str)> {
        let mut pares = Vec::new();
        if let Some(anio) = self.anio.as_deref() {
            pares.push(("anio", anio));
        }
        if let Some(modalidad) = self.modalidad.as_deref() {
            pares.push(("modalidad", modalidad));
        }
        if let Some(tipo) = self.tipo_pieza.as_deref() {
            pares.push(("tipo_pieza", tipo));
        }
        if let Some(agrupacion) = self.agrupacion.as_deref() {
            pares.push(("agrupacion", agrupacion));
        }
        pares
    }

    /// Query string for the corpus API listing, page and page size included.
    pub fn query_string(&self, page: u32, per_page: u32) -> String {
        let mut query = String::new();
        for (clave, valor) in self.pares() {
            push_param(&mut query, clave, valor);
        }
        push_param(&mut query, "page", &page.to_string());
        push_param(&mut query, "per_page", &per_page.to_string());
        query
    }

    /// Local `/explorar` href preserving the filter set.
    pub fn href(&self, page: u32) -> String {
        let mut query = String::new();
        for (clave, valor) in self.pares() {
            push_param(&mut query, clave, valor);
        }
        if page > 1 {
            push_param(&mut query, "page", &page.to_string());
        }
        if query.is_empty() {
            "/explorar".to_string()
        } else {
            format!("/explorar?{query}")
        }
    }
}

fn presente(valor: Option<&str>) -> Option<String> {
    valor
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn push_param(query: &mut String, clave: &str, valor: &str) {
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(clave);
    query.push('=');
    query.push_str(&encode_component(valor));
}

pub fn encode_component(valor: &str) -> String {
    utf8_percent_encode(valor, NON_ALPHANUMERIC).to_string()
}

/// One horizontal bar, width precomputed as a percentage of the maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub value: u64,
    pub pct: String,
}

/// Scales each value against the maximum of the sequence. An empty input
/// yields no rows, so the caller never divides by zero.
pub fn bar_rows<I>(datos: I) -> Vec<BarRow>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let datos: Vec<(String, u64)> = datos.into_iter().collect();
    let max = match datos.iter().map(|(_, v)| *v).max() {
        Some(max) if max > 0 => max,
        _ => return Vec::new(),
    };
    datos
        .into_iter()
        .map(|(label, value)| BarRow {
            pct: format!("{:.1}", value as f64 / max as f64 * 100.0),
            label,
            value,
        })
        .collect()
}

const NUBE_COLORES: [&str; 6] = [
    "var(--accent)",
    "var(--accent-light)",
    "var(--gold)",
    "var(--success)",
    "var(--text-secondary)",
    "var(--text-muted)",
];

const MININUBE_COLORES: [&str; 5] = [
    "var(--accent)",
    "var(--gold)",
    "var(--accent-light)",
    "var(--success)",
    "var(--text-secondary)",
];

/// One laid-out cloud term.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudWord {
    pub palabra: String,
    pub frecuencia: u64,
    pub font_rem: String,
    pub color: &'static str,
    pub bold: bool,
}

/// Vocabulary cloud layout: font from 0.7rem to 2.5rem, six-step palette
/// indexed by inverted rank, bold above the midpoint, shuffled on every call.
pub fn cloud_words<R: Rng>(items: &[(String, u64)], rng: &mut R) -> Vec<CloudWord> {
    layout_cloud(items, rng, 0.7, 1.8, &NUBE_COLORES, true)
}

/// Compact cloud used for the corpus-level frequency lists (regional lexicon,
/// keywords, meters, rhyme types). Smaller range, five colors, no bolding.
pub fn mini_cloud_words<R: Rng>(items: &[(String, u64)], rng: &mut R) -> Vec<CloudWord> {
    layout_cloud(items, rng, 0.65, 1.3, &MININUBE_COLORES, false)
}

fn layout_cloud<R: Rng>(
    items: &[(String, u64)],
    rng: &mut R,
    base_rem: f64,
    span_rem: f64,
    colores: &'static [&'static str],
    pesar: bool,
) -> Vec<CloudWord> {
    if items.is_empty() {
        return Vec::new();
    }
    let max = items.iter().map(|(_, f)| *f).max().unwrap_or(0);
    let min = items.iter().map(|(_, f)| *f).min().unwrap_or(0);
    // With a flat distribution the ratio collapses to zero instead of
    // dividing by zero.
    let rango = (max - min).max(1) as f64;

    let mut palabras: Vec<CloudWord> = items
        .iter()
        .map(|(palabra, frecuencia)| {
            let ratio = (frecuencia - min) as f64 / rango;
            let indice = ((1.0 - ratio) * (colores.len() - 1) as f64).floor() as usize;
            CloudWord {
                palabra: palabra.clone(),
                frecuencia: *frecuencia,
                font_rem: format!("{:.2}", base_rem + ratio * span_rem),
                color: colores[indice.min(colores.len() - 1)],
                bold: pesar && ratio > 0.5,
            }
        })
        .collect();
    palabras.shuffle(rng);
    palabras
}

/// Years above 70% of the busiest year get the highlight treatment.
pub fn timeline_destacados(totales: &[u64]) -> Vec<bool> {
    let max = totales.iter().copied().max().unwrap_or(0);
    let umbral = max as f64 * 0.7;
    totales.iter().map(|t| *t as f64 > umbral).collect()
}

/// Thousands grouping the way es-ES locales print integers (dot separator).
pub fn numero_es(n: u64) -> String {
    let digitos = n.to_string();
    let mut salida = String::with_capacity(digitos.len() + digitos.len() / 3);
    for (i, c) in digitos.chars().enumerate() {
        if i > 0 && (digitos.len() - i) % 3 == 0 {
            salida.push('.');
        }
        salida.push(c);
    }
    salida
}

/// Char-boundary truncation with an ellipsis for the random-lyric preview.
pub fn truncar(texto: &str, max_chars: usize) -> String {
    if texto.chars().count() <= max_chars {
        return texto.to_string();
    }
    let mut corto: String = texto.chars().take(max_chars).collect();
    corto.push_str("...");
    corto
}

/// Escapes content-derived text for the handful of pages assembled with
/// `format!` instead of a template.
pub fn escape_html(texto: &str) -> String {
    let mut salida = String::with_capacity(texto.len());
    for c in texto.chars() {
        match c {
            '&' => salida.push_str("&amp;"),
            '<' => salida.push_str("&lt;"),
            '>' => salida.push_str("&gt;"),
            '"' => salida.push_str("&quot;"),
            '\'' => salida.push_str("&#39;"),
            _ => salida.push(c),
        }
    }
    salida
}

/// Tier color for the 0-100 poetic score badge.
pub fn score_color(score: i64) -> &'static str {
    if score >= 70 {
        "var(--success)"
    } else if score >= 40 {
        "var(--gold)"
    } else {
        "var(--text-muted)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn nums(tokens: &[PageToken]) -> Vec<i64> {
        tokens
            .iter()
            .map(|t| match t {
                PageToken::Num(n) => *n as i64,
                PageToken::Gap => -1,
            })
            .collect()
    }

    #[test]
    fn page_range_small_totals_list_everything() {
        assert_eq!(nums(&page_range(1, 1)), vec![1]);
        assert_eq!(nums(&page_range(4, 7)), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn page_range_middle_has_two_gaps() {
        assert_eq!(nums(&page_range(10, 20)), vec![1, -1, 9, 10, 11, -1, 20]);
    }

    #[test]
    fn page_range_near_start_skips_leading_gap() {
        assert_eq!(nums(&page_range(2, 20)), vec![1, 2, 3, -1, 20]);
        assert_eq!(nums(&page_range(3, 20)), vec![1, 2, 3, 4, -1, 20]);
    }

    #[test]
    fn page_range_near_end_skips_trailing_gap() {
        assert_eq!(nums(&page_range(19, 20)), vec![1, -1, 18, 19, 20]);
        assert_eq!(nums(&page_range(20, 20)), vec![1, -1, 19, 20]);
    }

    #[test]
    fn page_range_never_exceeds_seven_numbers() {
        for total in [8u32, 20, 500] {
            for current in 1..=total.min(40) {
                let numerados = page_range(current, total)
                    .iter()
                    .filter(|t| matches!(t, PageToken::Num(_)))
                    .count();
                assert!(numerados <= 7, "current={current} total={total}");
            }
        }
    }

    #[test]
    fn filtro_keeps_only_non_empty_fields() {
        let filtro = Filtro::new(Some("2020"), Some(""), None, Some("   "));
        assert_eq!(filtro.anio.as_deref(), Some("2020"));
        assert!(filtro.modalidad.is_none());
        assert!(filtro.agrupacion.is_none());
        assert_eq!(filtro.pares(), vec![("anio", "2020")]);
    }

    #[test]
    fn filtro_trims_and_encodes() {
        let filtro = Filtro::new(None, Some(" Comparsa "), None, Some("Los de Cádiz"));
        assert_eq!(filtro.modalidad.as_deref(), Some("Comparsa"));
        assert_eq!(
            filtro.query_string(2, 50),
            "modalidad=Comparsa&agrupacion=Los%20de%20C%C3%A1diz&page=2&per_page=50"
        );
    }

    #[test]
    fn filtro_href_omits_first_page() {
        let vacio = Filtro::default();
        assert_eq!(vacio.href(1), "/explorar");
        assert_eq!(vacio.href(3), "/explorar?page=3");
        let filtro = Filtro::new(Some("1998"), None, None, None);
        assert_eq!(filtro.href(1), "/explorar?anio=1998");
    }

    #[test]
    fn bar_rows_scale_against_max() {
        let rows = bar_rows(vec![
            ("a".to_string(), 10),
            ("b".to_string(), 5),
            ("c".to_string(), 2),
        ]);
        assert_eq!(rows[0].pct, "100.0");
        assert_eq!(rows[1].pct, "50.0");
        assert_eq!(rows[2].pct, "20.0");
    }

    #[test]
    fn bar_rows_empty_input_draws_nothing() {
        assert!(bar_rows(Vec::new()).is_empty());
        assert!(bar_rows(vec![("x".to_string(), 0)]).is_empty());
    }

    #[test]
    fn cloud_extremes_hit_font_bounds() {
        let items = vec![
            ("grande".to_string(), 90),
            ("media".to_string(), 50),
            ("chica".to_string(), 10),
        ];
        let mut rng = SmallRng::seed_from_u64(7);
        let palabras = cloud_words(&items, &mut rng);
        let grande = palabras.iter().find(|w| w.palabra == "grande").unwrap();
        let chica = palabras.iter().find(|w| w.palabra == "chica").unwrap();
        assert_eq!(grande.font_rem, "2.50");
        assert!(grande.bold);
        assert_eq!(grande.color, "var(--accent)");
        assert_eq!(chica.font_rem, "0.70");
        assert!(!chica.bold);
        assert_eq!(chica.color, "var(--text-muted)");
    }

    #[test]
    fn cloud_flat_frequencies_do_not_divide_by_zero() {
        let items = vec![("una".to_string(), 4), ("otra".to_string(), 4)];
        let mut rng = SmallRng::seed_from_u64(1);
        let palabras = cloud_words(&items, &mut rng);
        for palabra in &palabras {
            assert_eq!(palabra.font_rem, "0.70");
        }
    }

    #[test]
    fn cloud_order_is_reshuffled_per_render() {
        let items: Vec<(String, u64)> = (0..40).map(|i| (format!("p{i}"), i + 1)).collect();
        let mut rng_a = SmallRng::seed_from_u64(3);
        let mut rng_b = SmallRng::seed_from_u64(4);
        let orden_a: Vec<String> = cloud_words(&items, &mut rng_a)
            .into_iter()
            .map(|w| w.palabra)
            .collect();
        let orden_b: Vec<String> = cloud_words(&items, &mut rng_b)
            .into_iter()
            .map(|w| w.palabra)
            .collect();
        assert_ne!(orden_a, orden_b);
    }

    #[test]
    fn mini_cloud_uses_compact_range() {
        let items = vec![("alta".to_string(), 30), ("baja".to_string(), 3)];
        let mut rng = SmallRng::seed_from_u64(11);
        let palabras = mini_cloud_words(&items, &mut rng);
        let alta = palabras.iter().find(|w| w.palabra == "alta").unwrap();
        assert_eq!(alta.font_rem, "1.95");
        assert!(!alta.bold);
    }

    #[test]
    fn timeline_highlights_above_seventy_percent() {
        let marcas = timeline_destacados(&[100, 71, 70, 10]);
        assert_eq!(marcas, vec![true, true, false, false]);
    }

    #[test]
    fn numero_es_groups_thousands_with_dots() {
        assert_eq!(numero_es(0), "0");
        assert_eq!(numero_es(999), "999");
        assert_eq!(numero_es(1000), "1.000");
        assert_eq!(numero_es(1234567), "1.234.567");
    }

    #[test]
    fn truncar_respects_char_boundaries() {
        assert_eq!(truncar("corta", 500), "corta");
        let larga = "ñ".repeat(600);
        let corta = truncar(&larga, 500);
        assert_eq!(corta.chars().count(), 503);
        assert!(corta.ends_with("..."));
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn score_color_tiers() {
        assert_eq!(score_color(85), "var(--success)");
        assert_eq!(score_color(70), "var(--success)");
        assert_eq!(score_color(55), "var(--gold)");
        assert_eq!(score_color(12), "var(--text-muted)");
    }
}
