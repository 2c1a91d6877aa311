//! Wire types for the lyrics-corpus API.
//!
//! Field names mirror the JSON the service emits; most columns can be NULL
//! in the archive, so almost everything is optional with a sane default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full lyric record as returned by `/api/letra/{id}` and `/api/aleatorio`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Letra {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub contenido: Option<String>,
    #[serde(default)]
    pub anio: Option<i64>,
    #[serde(default)]
    pub modalidad: Option<String>,
    #[serde(default)]
    pub tipo_pieza: Option<String>,
    #[serde(default)]
    pub agrupacion: Option<String>,
    #[serde(default)]
    pub autor: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub fuente: Option<String>,
    #[serde(default)]
    pub score_poetico: Option<i64>,
    #[serde(default)]
    pub nombre_metro: Option<String>,
    #[serde(default)]
    pub tipo_rima: Option<String>,
    #[serde(default)]
    pub versos_destacados: Option<String>,
}

impl Letra {
    /// Stored highlighted verses arrive as a JSON array encoded inside a
    /// string column. Anything unparseable counts as absent.
    pub fn versos_guardados(&self) -> Vec<String> {
        self.versos_destacados
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }
}

/// Slim row used by the paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetraResumen {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub anio: Option<i64>,
    #[serde(default)]
    pub modalidad: Option<String>,
    #[serde(default)]
    pub tipo_pieza: Option<String>,
    #[serde(default)]
    pub agrupacion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginaLetras {
    #[serde(default)]
    pub letras: Vec<LetraResumen>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "uno")]
    pub page: u32,
    #[serde(default = "uno")]
    pub total_pages: u32,
}

fn uno() -> u32 {
    1
}

/// Values available for the filter selects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filtros {
    #[serde(default)]
    pub anios: Vec<i64>,
    #[serde(default)]
    pub modalidades: Vec<String>,
    #[serde(default)]
    pub tipos_pieza: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConteoAnio {
    pub anio: i64,
    pub cantidad: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConteoModalidad {
    pub modalidad: String,
    pub cantidad: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConteoTipo {
    pub tipo: String,
    pub cantidad: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConteoAgrupacion {
    pub agrupacion: String,
    pub cantidad: u64,
}

/// Corpus-wide totals and per-dimension breakdowns (`/api/estadisticas`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Estadisticas {
    #[serde(default)]
    pub total_letras: u64,
    #[serde(default)]
    pub total_anios: u64,
    #[serde(default)]
    pub total_modalidades: u64,
    #[serde(default)]
    pub total_agrupaciones: u64,
    #[serde(default)]
    pub por_anio: Vec<ConteoAnio>,
    #[serde(default)]
    pub por_modalidad: Vec<ConteoModalidad>,
    #[serde(default)]
    pub por_tipo_pieza: Vec<ConteoTipo>,
    #[serde(default)]
    pub top_agrupaciones: Vec<ConteoAgrupacion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutorConteo {
    pub autor: String,
    #[serde(default)]
    pub letras: u64,
    #[serde(default)]
    pub agrupaciones: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangoConteo {
    pub rango: String,
    pub cantidad: u64,
}

/// Author ranking and quality distribution (`/api/estadisticas_avanzadas`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstadisticasAvanzadas {
    #[serde(default)]
    pub top_autores: Vec<AutorConteo>,
    #[serde(default)]
    pub distribucion_calidad: Vec<RangoConteo>,
}

/// One hit from either search endpoint. `fragmento` carries the server's
/// own `<mark>` highlight markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultadoBusqueda {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub anio: Option<i64>,
    #[serde(default)]
    pub modalidad: Option<String>,
    #[serde(default)]
    pub fragmento: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespuestaBusqueda {
    #[serde(default)]
    pub resultados: Vec<ResultadoBusqueda>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RespuestaTematica {
    #[serde(default)]
    pub resultados: Vec<ResultadoBusqueda>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub query_original: Option<String>,
    #[serde(default)]
    pub tematicas_disponibles: Vec<String>,
}

/// Aggregate profile of one group inside `/api/comparar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstiloAgrupacion {
    pub nombre: String,
    #[serde(default)]
    pub total_letras: u64,
    #[serde(default)]
    pub anios_activos: u64,
    #[serde(default)]
    pub modalidades: Option<String>,
    #[serde(default)]
    pub tipos_pieza: Vec<ConteoTipo>,
    #[serde(default)]
    pub autores: Option<String>,
    #[serde(default)]
    pub longitud_media: f64,
    #[serde(default)]
    pub calidad_media: f64,
    #[serde(default)]
    pub primer_anio: Option<i64>,
    #[serde(default)]
    pub ultimo_anio: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparacion {
    #[serde(default)]
    pub comparacion: Vec<EstiloAgrupacion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalabraFrecuencia {
    pub palabra: String,
    #[serde(default)]
    pub frecuencia: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PalabrasFrecuentes {
    #[serde(default)]
    pub palabras: Vec<PalabraFrecuencia>,
    #[serde(default)]
    pub total_textos: u64,
}

/// One year of the chronology (`/api/timeline`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitoAnual {
    pub anio: i64,
    #[serde(default)]
    pub total_letras: u64,
    #[serde(default)]
    pub agrupaciones: u64,
    #[serde(default)]
    pub modalidades: Option<String>,
    #[serde(default)]
    pub calidad_media: f64,
    #[serde(default)]
    pub top_agrupaciones: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cronologia {
    #[serde(default)]
    pub timeline: Vec<HitoAnual>,
}

// ---------------------------------------------------------------------------
// Poetic analysis payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrica {
    #[serde(default)]
    pub metro_dominante: Option<i64>,
    #[serde(default)]
    pub nombre_metro: Option<String>,
    #[serde(default)]
    pub coherencia_pct: f64,
    #[serde(default)]
    pub distribucion: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstrofaRima {
    #[serde(default)]
    pub n_versos: u64,
    #[serde(default)]
    pub esquema: Option<String>,
    #[serde(default)]
    pub tipo_rima: Option<String>,
    #[serde(default)]
    pub forma_estrofica: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rima {
    #[serde(default)]
    pub tipo_rima: Option<String>,
    #[serde(default)]
    pub esquema_predominante: Option<String>,
    #[serde(default)]
    pub estrofas: Vec<EstrofaRima>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulario {
    #[serde(default)]
    pub total_palabras: u64,
    #[serde(default)]
    pub vocabulario_unico: u64,
    #[serde(default)]
    pub densidad_lexica: f64,
    #[serde(default)]
    pub riqueza: Option<String>,
    #[serde(default)]
    pub lexico_gaditano: Vec<String>,
    #[serde(default)]
    pub palabras_clave: Vec<PalabraFrecuencia>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EjemploFigura {
    #[serde(default)]
    pub versos: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figura {
    pub figura: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub palabras: Option<Vec<PalabraFrecuencia>>,
    #[serde(default)]
    pub ejemplos: Option<Vec<EjemploFigura>>,
}

/// Per-lyric poetic analysis (`/api/analisis_poetico/{id}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalisisPoetico {
    #[serde(default)]
    pub n_estrofas: u64,
    #[serde(default)]
    pub n_versos: u64,
    #[serde(default)]
    pub longitud_media_verso: f64,
    #[serde(default)]
    pub metrica: Metrica,
    #[serde(default)]
    pub rima: Rima,
    #[serde(default)]
    pub vocabulario: Vocabulario,
    #[serde(default)]
    pub figuras_retoricas: Vec<Figura>,
    #[serde(default)]
    pub versos_destacados: Vec<String>,
    #[serde(default)]
    pub score_poetico: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetroConteo {
    pub metro: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipoRimaConteo {
    pub tipo: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsquemaConteo {
    pub esquema: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiguraConteo {
    pub figura: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicoConteo {
    pub palabra: String,
    #[serde(default)]
    pub apariciones: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetraPuntuada {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub anio: Option<i64>,
    #[serde(default)]
    pub modalidad: Option<String>,
    #[serde(default)]
    pub nombre_metro: Option<String>,
    #[serde(default)]
    pub tipo_rima: Option<String>,
    #[serde(default)]
    pub score_poetico: i64,
}

/// Corpus-level poetic statistics, the shape shared by the on-demand
/// analysis and the persisted variant once normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusPoetico {
    #[serde(default)]
    pub total_analizadas: u64,
    #[serde(default)]
    pub score_medio: f64,
    #[serde(default)]
    pub densidad_lexica_media: f64,
    #[serde(default)]
    pub metros_dominantes: Vec<MetroConteo>,
    #[serde(default)]
    pub tipos_rima: Vec<TipoRimaConteo>,
    #[serde(default)]
    pub esquemas_frecuentes: Vec<EsquemaConteo>,
    #[serde(default)]
    pub figuras_frecuentes: Vec<FiguraConteo>,
    #[serde(default)]
    pub lexico_gaditano_top: Vec<LexicoConteo>,
    #[serde(default)]
    pub palabras_clave_corpus: Vec<PalabraFrecuencia>,
    #[serde(default)]
    pub top_letras: Vec<LetraPuntuada>,
}

/// Persisted corpus statistics (`/api/estadisticas_poeticas`). Same data as
/// [`CorpusPoetico`] except the top-lyrics list travels under another key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstadisticasPoeticas {
    #[serde(default)]
    pub total_analizadas: u64,
    #[serde(default)]
    pub score_medio: f64,
    #[serde(default)]
    pub densidad_lexica_media: f64,
    #[serde(default)]
    pub metros_dominantes: Vec<MetroConteo>,
    #[serde(default)]
    pub tipos_rima: Vec<TipoRimaConteo>,
    #[serde(default)]
    pub esquemas_frecuentes: Vec<EsquemaConteo>,
    #[serde(default)]
    pub figuras_frecuentes: Vec<FiguraConteo>,
    #[serde(default)]
    pub lexico_gaditano_top: Vec<LexicoConteo>,
    #[serde(default)]
    pub palabras_clave_corpus: Vec<PalabraFrecuencia>,
    #[serde(default)]
    pub top_letras_poeticas: Vec<LetraPuntuada>,
}

impl EstadisticasPoeticas {
    pub fn into_corpus(self) -> CorpusPoetico {
        CorpusPoetico {
            total_analizadas: self.total_analizadas,
            score_medio: self.score_medio,
            densidad_lexica_media: self.densidad_lexica_media,
            metros_dominantes: self.metros_dominantes,
            tipos_rima: self.tipos_rima,
            esquemas_frecuentes: self.esquemas_frecuentes,
            figuras_frecuentes: self.figuras_frecuentes,
            lexico_gaditano_top: self.lexico_gaditano_top,
            palabras_clave_corpus: self.palabras_clave_corpus,
            top_letras: self.top_letras_poeticas,
        }
    }
}

/// Body for `POST /api/analizar_corpus`. Empty filters stay off the wire.
#[derive(Debug, Clone, Serialize)]
pub struct PeticionCorpus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_pieza: Option<String>,
    pub limit: u32,
}
