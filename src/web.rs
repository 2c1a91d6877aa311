//! HTTP face of the archive: every tab of the browsing interface rendered
//! server-side from the corpus API.
//!
//! Handlers follow one pattern: fetch (through the per-concern caches where
//! the tab allows it), precompute a display payload, render a template. All
//! content-derived text goes through the template engine's escaping; the only
//! `|safe` interpolation is the search service's own highlight markup.

use crate::api::{ApiError, CorpusClient};
use crate::cache::TicketedCache;
use crate::model::{
    AnalisisPoetico, CorpusPoetico, Cronologia, Estadisticas, EstadisticasAvanzadas,
    EstadisticasPoeticas, EstiloAgrupacion, Filtros, Letra, LetraResumen, PaginaLetras,
    PalabrasFrecuentes, PeticionCorpus, ResultadoBusqueda,
};
use crate::view::{self, BarRow, Filtro, PageToken, encode_component, escape_html};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Form, Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

const PER_PAGE: u32 = 50;
const CORPUS_SAMPLE_LIMIT: u32 = 300;
const TOP_AGRUPACIONES_CHART: usize = 15;
const TIMELINE_TAGS: usize = 3;
const ESTROFAS_VISIBLES: usize = 6;
const LEXICO_VISIBLE: usize = 20;
const PALABRAS_CLAVE_VISIBLES: usize = 12;
const PREVIEW_CHARS: usize = 500;

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub api_base: String,
    pub api_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_base: "http://127.0.0.1:5000".to_string(),
            api_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("client setup failed: {0}")]
    Client(#[from] ApiError),
}

pub struct AppState {
    client: CorpusClient,
    stats: Arc<TicketedCache<Estadisticas>>,
    timeline: Arc<TicketedCache<Cronologia>>,
    palabras: Arc<TicketedCache<PalabrasFrecuentes>>,
    poeticas: Arc<TicketedCache<CorpusPoetico>>,
}

impl AppState {
    pub fn new(client: CorpusClient) -> Self {
        Self {
            client,
            stats: TicketedCache::new(1),
            timeline: TicketedCache::new(1),
            palabras: TicketedCache::new(8),
            poeticas: TicketedCache::new(1),
        }
    }

    /// Basic stats, fetched once per process and reused across every tab.
    async fn estadisticas(&self) -> Result<Estadisticas, ApiError> {
        self.stats
            .obtener("basicas", || self.client.estadisticas())
            .await
    }

    async fn chrome(&self, active: &'static str) -> Chrome {
        let stats = self.estadisticas().await.ok().map(|s| StatStrip {
            letras: view::numero_es(s.total_letras),
            anios: s.total_anios,
            modalidades: s.total_modalidades,
            agrupaciones: view::numero_es(s.total_agrupaciones),
        });
        Chrome {
            tabs: TABS,
            active,
            stats,
        }
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let client = CorpusClient::new(config.api_base.clone(), config.api_timeout)?;
    let state = Arc::new(AppState::new(client));
    let router = build_router(state);
    info!(%config.addr, api = %config.api_base, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(explorar))
        .route("/explorar", get(explorar))
        .route("/buscar", get(buscar))
        .route("/letra/:id", get(detalle))
        .route("/letra/:id/analisis", get(analisis))
        .route("/comparar", get(comparar))
        .route("/estadisticas", get(estadisticas))
        .route("/descubrir", get(descubrir))
        .route("/aleatorio", get(aleatorio))
        .route("/cronologia", get(cronologia))
        .route("/poetica", get(poetica))
        .route("/poetica/analizar", post(poetica_analizar))
        .route("/assets/app.css", get(app_css))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "cancionero-web" }))
}

async fn app_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], APP_CSS)
}

// ---------------------------------------------------------------------------
// Shared page furniture
// ---------------------------------------------------------------------------

struct Tab {
    clave: &'static str,
    href: &'static str,
    titulo: &'static str,
}

const TABS: &[Tab] = &[
    Tab {
        clave: "explorar",
        href: "/explorar",
        titulo: "Explorar",
    },
    Tab {
        clave: "buscar",
        href: "/buscar",
        titulo: "Buscar",
    },
    Tab {
        clave: "comparar",
        href: "/comparar",
        titulo: "Comparar",
    },
    Tab {
        clave: "estadisticas",
        href: "/estadisticas",
        titulo: "Estadísticas",
    },
    Tab {
        clave: "descubrir",
        href: "/descubrir",
        titulo: "Descubrir",
    },
    Tab {
        clave: "aleatorio",
        href: "/aleatorio",
        titulo: "Al azar",
    },
    Tab {
        clave: "cronologia",
        href: "/cronologia",
        titulo: "Cronología",
    },
    Tab {
        clave: "poetica",
        href: "/poetica",
        titulo: "Poética",
    },
];

struct StatStrip {
    letras: String,
    anios: u64,
    modalidades: u64,
    agrupaciones: String,
}

struct Chrome {
    tabs: &'static [Tab],
    active: &'static str,
    stats: Option<StatStrip>,
}

struct Etiqueta {
    clase: &'static str,
    texto: String,
}

struct Enlace {
    href: String,
    texto: String,
}

struct Opcion {
    valor: String,
    seleccionada: bool,
}

struct Selects {
    anios: Vec<Opcion>,
    modalidades: Vec<Opcion>,
    tipos: Vec<Opcion>,
}

impl Selects {
    fn new(filtros: &Filtros, filtro: &Filtro) -> Self {
        Self {
            anios: filtros
                .anios
                .iter()
                .map(|a| {
                    let valor = a.to_string();
                    Opcion {
                        seleccionada: filtro.anio.as_deref() == Some(valor.as_str()),
                        valor,
                    }
                })
                .collect(),
            modalidades: opciones(&filtros.modalidades, filtro.modalidad.as_deref()),
            tipos: opciones(&filtros.tipos_pieza, filtro.tipo_pieza.as_deref()),
        }
    }
}

fn opciones(valores: &[String], actual: Option<&str>) -> Vec<Opcion> {
    valores
        .iter()
        .map(|v| Opcion {
            valor: v.clone(),
            seleccionada: actual == Some(v.as_str()),
        })
        .collect()
}

struct Grafica {
    titulo: &'static str,
    filas: Vec<BarRow>,
}

struct NubeItem {
    palabra: String,
    href: String,
    titulo: String,
    font_rem: String,
    color: &'static str,
    bold: bool,
}

fn nube_items(pares: &[(String, u64)], mini: bool) -> Vec<NubeItem> {
    let mut rng = rand::thread_rng();
    let palabras = if mini {
        view::mini_cloud_words(pares, &mut rng)
    } else {
        view::cloud_words(pares, &mut rng)
    };
    palabras
        .into_iter()
        .map(|w| NubeItem {
            href: format!("/buscar?q={}", encode_component(&w.palabra)),
            titulo: if mini {
                format!("{}: {}", w.palabra, w.frecuencia)
            } else {
                format!("{}: {} veces", w.palabra, w.frecuencia)
            },
            palabra: w.palabra,
            font_rem: w.font_rem,
            color: w.color,
            bold: w.bold,
        })
        .collect()
}

/// Service errors surface the server's wording verbatim; everything else gets
/// the panel's Spanish context in front of the error chain.
fn mensaje_panel(contexto: &str, err: &ApiError) -> String {
    match err {
        ApiError::Service(mensaje) => mensaje.clone(),
        otro => format!("{contexto}: {otro}"),
    }
}

fn respond<T: Template>(template: T) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(err.to_string())),
    )
}

fn render_error_page(mensaje: impl Into<String>) -> String {
    let mensaje = mensaje.into();
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Error</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <main class="pagina-error">
      <h1>Algo ha salido mal</h1>
      <p class="empty-state">{mensaje}</p>
      <a class="pag-btn" href="/explorar">Volver al archivo</a>
    </main>
  </body>
</html>"#,
        mensaje = escape_html(&mensaje),
    )
}

// ---------------------------------------------------------------------------
// Explorar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ExplorarParams {
    anio: Option<String>,
    modalidad: Option<String>,
    tipo_pieza: Option<String>,
    agrupacion: Option<String>,
    page: Option<u32>,
}

struct PageLink {
    etiqueta: String,
    href: Option<String>,
    actual: bool,
}

struct Listado {
    resumen: String,
    pagina_info: String,
    letras: Vec<LetraResumen>,
    paginacion: Vec<PageLink>,
    prev: Option<String>,
    next: Option<String>,
}

impl Listado {
    fn new(filtro: &Filtro, pagina: PaginaLetras) -> Self {
        let mut paginacion = Vec::new();
        let mut prev = None;
        let mut next = None;
        if pagina.total_pages > 1 {
            for token in view::page_range(pagina.page, pagina.total_pages) {
                paginacion.push(match token {
                    PageToken::Num(n) if n == pagina.page => PageLink {
                        etiqueta: n.to_string(),
                        href: None,
                        actual: true,
                    },
                    PageToken::Num(n) => PageLink {
                        etiqueta: n.to_string(),
                        href: Some(filtro.href(n)),
                        actual: false,
                    },
                    PageToken::Gap => PageLink {
                        etiqueta: "...".to_string(),
                        href: None,
                        actual: false,
                    },
                });
            }
            if pagina.page > 1 {
                prev = Some(filtro.href(pagina.page - 1));
            }
            if pagina.page < pagina.total_pages {
                next = Some(filtro.href(pagina.page + 1));
            }
        }
        Self {
            resumen: format!("{} letras encontradas", view::numero_es(pagina.total)),
            pagina_info: format!("Página {} de {}", pagina.page, pagina.total_pages),
            letras: pagina.letras,
            paginacion,
            prev,
            next,
        }
    }
}

async fn explorar(
    State(state): State<SharedState>,
    Query(params): Query<ExplorarParams>,
) -> Html<String> {
    let filtro = Filtro::new(
        params.anio.as_deref(),
        params.modalidad.as_deref(),
        params.tipo_pieza.as_deref(),
        params.agrupacion.as_deref(),
    );
    let page = params.page.unwrap_or(1).max(1);
    let chrome = state.chrome("explorar").await;
    let filtros = state.client.filtros().await.unwrap_or_default();
    let selects = Selects::new(&filtros, &filtro);
    let agrupacion = filtro.agrupacion.clone().unwrap_or_default();
    let (listado, error) = match state.client.letras(&filtro, page, PER_PAGE).await {
        Ok(pagina) => (Some(Listado::new(&filtro, pagina)), None),
        Err(err) => (
            None,
            Some(mensaje_panel("Error al cargar las letras", &err)),
        ),
    };
    respond(ExplorarTemplate {
        chrome,
        selects,
        agrupacion,
        listado,
        error,
    })
}

// ---------------------------------------------------------------------------
// Buscar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BuscarParams {
    q: Option<String>,
    tema: Option<String>,
}

struct ResultadoCard {
    href: String,
    titulo: String,
    anio: Option<i64>,
    modalidad: Option<String>,
    fragmento: String,
}

struct Resultados {
    cabecera: String,
    items: Vec<ResultadoCard>,
}

impl Resultados {
    fn new(total: u64, consulta: &str, hits: Vec<ResultadoBusqueda>) -> Self {
        Self {
            cabecera: format!("{total} resultados para \"{consulta}\""),
            items: hits
                .into_iter()
                .map(|r| ResultadoCard {
                    href: format!("/letra/{}", r.id),
                    titulo: r.titulo,
                    anio: r.anio,
                    modalidad: r.modalidad,
                    fragmento: r.fragmento.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

async fn buscar(
    State(state): State<SharedState>,
    Query(params): Query<BuscarParams>,
) -> Html<String> {
    let chrome = state.chrome("buscar").await;
    let consulta = params
        .q
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let tematica = params.tema.as_deref().is_some_and(|t| !t.is_empty());
    let mut temas: Vec<Enlace> = Vec::new();
    // An empty query is a no-op, not an error: the page renders without any
    // request hitting the service.
    let (resultados, error) = if consulta.is_empty() {
        (None, None)
    } else if tematica {
        match state.client.buscar_tematica(&consulta).await {
            Ok(respuesta) => {
                temas = enlaces_tematicos(&respuesta.tematicas_disponibles);
                let cabecera = respuesta
                    .query_original
                    .clone()
                    .unwrap_or_else(|| consulta.clone());
                (
                    Some(Resultados::new(
                        respuesta.total,
                        &cabecera,
                        respuesta.resultados,
                    )),
                    None,
                )
            }
            Err(err) => (
                None,
                Some(mensaje_panel("Error al buscar por temática", &err)),
            ),
        }
    } else {
        match state.client.buscar(&consulta).await {
            Ok(respuesta) => {
                let cabecera = respuesta.query.clone().unwrap_or_else(|| consulta.clone());
                (
                    Some(Resultados::new(
                        respuesta.total,
                        &cabecera,
                        respuesta.resultados,
                    )),
                    None,
                )
            }
            Err(err) => (None, Some(mensaje_panel("Error al buscar", &err))),
        }
    };
    respond(BuscarTemplate {
        chrome,
        consulta,
        temas,
        resultados,
        error,
    })
}

fn enlaces_tematicos(temas: &[String]) -> Vec<Enlace> {
    temas
        .iter()
        .map(|t| Enlace {
            href: format!("/buscar?q={}&tema=1", encode_component(t)),
            texto: t.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Detalle
// ---------------------------------------------------------------------------

struct PoeticaBadge {
    texto: String,
    color: &'static str,
    metro: Option<String>,
    rima: Option<String>,
}

struct DetalleVista {
    titulo: String,
    tags: Vec<Etiqueta>,
    poetica: Option<PoeticaBadge>,
    perfiles: Vec<Enlace>,
    versos: Vec<String>,
    contenido: String,
    fuente: Option<Enlace>,
    analisis_href: String,
}

impl DetalleVista {
    fn new(letra: Letra, api_base: &str) -> Self {
        let mut tags = Vec::new();
        if let Some(anio) = letra.anio {
            tags.push(Etiqueta {
                clase: "tag anio",
                texto: anio.to_string(),
            });
        }
        if let Some(modalidad) = &letra.modalidad {
            tags.push(Etiqueta {
                clase: "tag modalidad",
                texto: modalidad.clone(),
            });
        }
        if let Some(tipo) = &letra.tipo_pieza {
            tags.push(Etiqueta {
                clase: "tag tipo",
                texto: tipo.clone(),
            });
        }
        if let Some(agrupacion) = &letra.agrupacion {
            tags.push(Etiqueta {
                clase: "tag",
                texto: agrupacion.clone(),
            });
        }
        if let Some(autor) = &letra.autor {
            tags.push(Etiqueta {
                clase: "tag autor",
                texto: format!("Autor: {autor}"),
            });
        }

        let poetica = letra
            .score_poetico
            .filter(|score| *score > 0)
            .map(|score| PoeticaBadge {
                texto: format!("Score poético: {score}/100"),
                color: view::score_color(score),
                metro: letra.nombre_metro.clone(),
                rima: letra.tipo_rima.clone(),
            });

        let mut perfiles = Vec::new();
        if let Some(autor) = &letra.autor {
            perfiles.push(Enlace {
                href: format!("{api_base}/autor/{}", encode_component(autor)),
                texto: autor.clone(),
            });
        }
        if let Some(agrupacion) = &letra.agrupacion {
            perfiles.push(Enlace {
                href: format!("{api_base}/agrupacion/{}", encode_component(agrupacion)),
                texto: agrupacion.clone(),
            });
        }

        let fuente = letra.url.clone().map(|url| Enlace {
            href: url,
            texto: letra
                .fuente
                .clone()
                .unwrap_or_else(|| "Original".to_string()),
        });

        Self {
            analisis_href: format!("/letra/{}/analisis", letra.id),
            versos: letra.versos_guardados(),
            contenido: letra
                .contenido
                .unwrap_or_else(|| "Sin contenido disponible".to_string()),
            titulo: letra.titulo,
            tags,
            poetica,
            perfiles,
            fuente,
        }
    }
}

async fn detalle(State(state): State<SharedState>, Path(id): Path<i64>) -> Html<String> {
    let chrome = state.chrome("explorar").await;
    match state.client.letra(id).await {
        Ok(letra) => respond(DetalleTemplate {
            chrome,
            vista: DetalleVista::new(letra, state.client.base_url()),
        }),
        Err(err) => Html(render_error_page(mensaje_panel(
            "Error al cargar la letra",
            &err,
        ))),
    }
}

// ---------------------------------------------------------------------------
// Análisis poético individual
// ---------------------------------------------------------------------------

struct EstrofaVista {
    esquema: String,
    info: String,
}

struct FiguraVista {
    nombre: String,
    conteo: Option<u64>,
    palabras: Option<String>,
    ejemplos: Vec<String>,
}

struct AnalisisVista {
    score: i64,
    color: &'static str,
    metro: String,
    silabas: String,
    coherencia: String,
    distribucion: Vec<String>,
    n_estrofas: u64,
    n_versos: u64,
    longitud_media: String,
    rima_tipo: String,
    esquema: String,
    estrofas: Vec<EstrofaVista>,
    total_palabras: u64,
    vocabulario_unico: u64,
    densidad: String,
    riqueza: String,
    lexico: String,
    palabras_clave: Vec<String>,
    figuras: Vec<FiguraVista>,
    versos: Vec<String>,
}

impl AnalisisVista {
    fn new(analisis: AnalisisPoetico) -> Self {
        let metrica = analisis.metrica;
        let rima = analisis.rima;
        let vocab = analisis.vocabulario;

        let estrofas = rima
            .estrofas
            .iter()
            .take(ESTROFAS_VISIBLES)
            .map(|e| {
                let forma = e
                    .forma_estrofica
                    .as_deref()
                    .map(|f| format!(" · {f}"))
                    .unwrap_or_default();
                EstrofaVista {
                    esquema: e.esquema.clone().unwrap_or_else(|| "—".to_string()),
                    info: format!(
                        "{} versos · rima {}{forma}",
                        e.n_versos,
                        e.tipo_rima.as_deref().unwrap_or("?")
                    ),
                }
            })
            .collect();

        let lexico = vocab
            .lexico_gaditano
            .iter()
            .take(LEXICO_VISIBLE)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let figuras = analisis
            .figuras_retoricas
            .into_iter()
            .map(|f| FiguraVista {
                nombre: f.figura,
                conteo: f.count,
                palabras: f.palabras.map(|ps| {
                    ps.into_iter()
                        .map(|p| p.palabra)
                        .collect::<Vec<_>>()
                        .join(", ")
                }),
                ejemplos: f
                    .ejemplos
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|e| e.versos.map(|versos| versos.join(" / ")))
                    .collect(),
            })
            .collect();

        Self {
            score: analisis.score_poetico,
            color: view::score_color(analisis.score_poetico),
            metro: metrica.nombre_metro.unwrap_or_else(|| "libre".to_string()),
            silabas: metrica
                .metro_dominante
                .map(|n| n.to_string())
                .unwrap_or_else(|| "—".to_string()),
            coherencia: format!("{}%", metrica.coherencia_pct),
            distribucion: metrica
                .distribucion
                .iter()
                .map(|(metro, cnt)| format!("{metro}: {cnt}"))
                .collect(),
            n_estrofas: analisis.n_estrofas,
            n_versos: analisis.n_versos,
            longitud_media: format!("{} chars", analisis.longitud_media_verso),
            rima_tipo: rima.tipo_rima.unwrap_or_else(|| "libre".to_string()),
            esquema: rima
                .esquema_predominante
                .unwrap_or_else(|| "—".to_string()),
            estrofas,
            total_palabras: vocab.total_palabras,
            vocabulario_unico: vocab.vocabulario_unico,
            densidad: format!("{}%", vocab.densidad_lexica),
            riqueza: vocab.riqueza.unwrap_or_else(|| "—".to_string()),
            lexico,
            palabras_clave: vocab
                .palabras_clave
                .into_iter()
                .take(PALABRAS_CLAVE_VISIBLES)
                .map(|p| p.palabra)
                .collect(),
            figuras,
            versos: analisis.versos_destacados,
        }
    }
}

async fn analisis(State(state): State<SharedState>, Path(id): Path<i64>) -> Html<String> {
    let chrome = state.chrome("explorar").await;
    match state.client.analisis_poetico(id).await {
        Ok(analisis) => respond(AnalisisTemplate {
            chrome,
            letra_href: format!("/letra/{id}"),
            vista: AnalisisVista::new(analisis),
        }),
        Err(err) => Html(render_error_page(mensaje_panel(
            "Error al analizar la letra",
            &err,
        ))),
    }
}

// ---------------------------------------------------------------------------
// Comparar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompararParams {
    a1: Option<String>,
    a2: Option<String>,
}

struct CompCard {
    nombre: String,
    total: u64,
    anios_activos: u64,
    periodo: String,
    modalidades: String,
    autores: String,
    longitud: String,
    calidad: String,
    tipos: Vec<String>,
}

impl From<EstiloAgrupacion> for CompCard {
    fn from(estilo: EstiloAgrupacion) -> Self {
        let ano = |a: Option<i64>| a.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
        Self {
            periodo: format!(
                "{} - {}",
                ano(estilo.primer_anio),
                ano(estilo.ultimo_anio)
            ),
            modalidades: estilo.modalidades.unwrap_or_else(|| "N/A".to_string()),
            autores: estilo.autores.unwrap_or_else(|| "N/A".to_string()),
            longitud: format!("{} chars", estilo.longitud_media),
            calidad: format!("{}/100", estilo.calidad_media),
            tipos: estilo
                .tipos_pieza
                .iter()
                .map(|t| format!("{} ({})", t.tipo, t.cantidad))
                .collect(),
            nombre: estilo.nombre,
            total: estilo.total_letras,
            anios_activos: estilo.anios_activos,
        }
    }
}

async fn comparar(
    State(state): State<SharedState>,
    Query(params): Query<CompararParams>,
) -> Html<String> {
    let chrome = state.chrome("comparar").await;
    let a1 = params.a1.as_deref().map(str::trim).unwrap_or_default();
    let a2 = params.a2.as_deref().map(str::trim).unwrap_or_default();
    let (cards, mensaje) = if a1.is_empty() || a2.is_empty() {
        (
            Vec::new(),
            Some("Introduce dos agrupaciones para comparar".to_string()),
        )
    } else {
        match state.client.comparar(a1, a2).await {
            Ok(comparacion) if comparacion.comparacion.len() >= 2 => (
                comparacion
                    .comparacion
                    .into_iter()
                    .map(CompCard::from)
                    .collect(),
                None,
            ),
            Ok(_) => (Vec::new(), Some("Error al comparar".to_string())),
            Err(err) => (Vec::new(), Some(mensaje_panel("Error al comparar", &err))),
        }
    };
    respond(CompararTemplate {
        chrome,
        a1: a1.to_string(),
        a2: a2.to_string(),
        cards,
        mensaje,
    })
}

// ---------------------------------------------------------------------------
// Estadísticas
// ---------------------------------------------------------------------------

async fn estadisticas(State(state): State<SharedState>) -> Html<String> {
    let chrome = state.chrome("estadisticas").await;
    // Basic stats come from the process-wide cache; the advanced bundle is
    // refetched on every visit. Both run concurrently and rendering waits
    // for the pair.
    let (basicas, avanzadas) = tokio::join!(
        state.estadisticas(),
        state.client.estadisticas_avanzadas()
    );
    let (graficas, error) = match (basicas, avanzadas) {
        (Ok(b), Ok(a)) => (graficas_corpus(&b, &a), None),
        (Err(err), _) | (_, Err(err)) => (
            Vec::new(),
            Some(mensaje_panel("Error al cargar las estadísticas", &err)),
        ),
    };
    respond(EstadisticasTemplate {
        chrome,
        graficas,
        error,
    })
}

fn graficas_corpus(basicas: &Estadisticas, avanzadas: &EstadisticasAvanzadas) -> Vec<Grafica> {
    vec![
        Grafica {
            titulo: "Letras por año",
            filas: view::bar_rows(
                basicas
                    .por_anio
                    .iter()
                    .map(|d| (d.anio.to_string(), d.cantidad)),
            ),
        },
        Grafica {
            titulo: "Por modalidad",
            filas: view::bar_rows(
                basicas
                    .por_modalidad
                    .iter()
                    .map(|d| (d.modalidad.clone(), d.cantidad)),
            ),
        },
        Grafica {
            titulo: "Por tipo de pieza",
            filas: view::bar_rows(
                basicas
                    .por_tipo_pieza
                    .iter()
                    .map(|d| (d.tipo.clone(), d.cantidad)),
            ),
        },
        Grafica {
            titulo: "Top agrupaciones",
            filas: view::bar_rows(
                basicas
                    .top_agrupaciones
                    .iter()
                    .take(TOP_AGRUPACIONES_CHART)
                    .map(|d| (d.agrupacion.clone(), d.cantidad)),
            ),
        },
        Grafica {
            titulo: "Autores más prolíficos",
            filas: view::bar_rows(
                avanzadas
                    .top_autores
                    .iter()
                    .map(|d| (d.autor.clone(), d.letras)),
            ),
        },
        Grafica {
            titulo: "Distribución de calidad",
            filas: view::bar_rows(
                avanzadas
                    .distribucion_calidad
                    .iter()
                    .map(|d| (d.rango.clone(), d.cantidad)),
            ),
        },
    ]
}

// ---------------------------------------------------------------------------
// Descubrir (nube de vocabulario)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ModalidadParams {
    modalidad: Option<String>,
}

async fn descubrir(
    State(state): State<SharedState>,
    Query(params): Query<ModalidadParams>,
) -> Html<String> {
    let chrome = state.chrome("descubrir").await;
    let modalidad = params
        .modalidad
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let filtros = state.client.filtros().await.unwrap_or_default();
    let selects = Selects::new(
        &filtros,
        &Filtro::new(None, modalidad.as_deref(), None, None),
    );
    let clave = modalidad.clone().unwrap_or_else(|| "(todas)".to_string());
    let resultado = state
        .palabras
        .obtener(&clave, || {
            state.client.palabras_frecuentes(modalidad.as_deref())
        })
        .await;
    let (palabras, error) = match resultado {
        Ok(frecuentes) => {
            let pares: Vec<(String, u64)> = frecuentes
                .palabras
                .iter()
                .map(|p| (p.palabra.clone(), p.frecuencia))
                .collect();
            (nube_items(&pares, false), None)
        }
        Err(err) => (
            Vec::new(),
            Some(mensaje_panel("Error al cargar el vocabulario", &err)),
        ),
    };
    respond(DescubrirTemplate {
        chrome,
        selects,
        palabras,
        error,
    })
}

// ---------------------------------------------------------------------------
// Cronología
// ---------------------------------------------------------------------------

struct HitoVista {
    anio: i64,
    href: String,
    destacado: bool,
    letras: String,
    agrupaciones: String,
    modalidades: String,
    calidad: String,
    tags: Vec<String>,
}

async fn cronologia(State(state): State<SharedState>) -> Html<String> {
    let chrome = state.chrome("cronologia").await;
    let resultado = state
        .timeline
        .obtener("cronologia", || state.client.timeline())
        .await;
    let (hitos, error) = match resultado {
        Ok(cronologia) => (hitos_vista(&cronologia), None),
        Err(err) => (
            Vec::new(),
            Some(mensaje_panel("Error al cargar la cronología", &err)),
        ),
    };
    respond(CronologiaTemplate {
        chrome,
        hitos,
        error,
    })
}

fn hitos_vista(cronologia: &Cronologia) -> Vec<HitoVista> {
    let totales: Vec<u64> = cronologia.timeline.iter().map(|h| h.total_letras).collect();
    let destacados = view::timeline_destacados(&totales);
    cronologia
        .timeline
        .iter()
        .zip(destacados)
        .map(|(hito, destacado)| HitoVista {
            anio: hito.anio,
            href: format!("/explorar?anio={}", hito.anio),
            destacado,
            letras: format!("{} letras", hito.total_letras),
            agrupaciones: format!("{} agrupaciones", hito.agrupaciones),
            modalidades: hito.modalidades.clone().unwrap_or_default(),
            calidad: format!("calidad media {}", hito.calidad_media),
            tags: hito
                .top_agrupaciones
                .iter()
                .take(TIMELINE_TAGS)
                .cloned()
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Poética (dashboard de corpus)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PoeticaForm {
    modalidad: Option<String>,
    anio: Option<String>,
    tipo_pieza: Option<String>,
}

struct Kpi {
    valor: String,
    etiqueta: &'static str,
}

struct TopLetra {
    href: String,
    titulo: String,
    tags: Vec<Etiqueta>,
    score: String,
}

struct PoeticaDash {
    kpis: Vec<Kpi>,
    graficas: Vec<Grafica>,
    lexico: Vec<NubeItem>,
    claves: Vec<NubeItem>,
    top_letras: Vec<TopLetra>,
}

impl PoeticaDash {
    fn new(corpus: &CorpusPoetico) -> Self {
        let kpis = vec![
            Kpi {
                valor: view::numero_es(corpus.total_analizadas),
                etiqueta: "Letras analizadas",
            },
            Kpi {
                valor: format!("{}", corpus.score_medio),
                etiqueta: "Score poético medio",
            },
            Kpi {
                valor: format!("{}%", corpus.densidad_lexica_media),
                etiqueta: "Densidad léxica media",
            },
            Kpi {
                valor: corpus
                    .metros_dominantes
                    .first()
                    .map(|m| m.metro.clone())
                    .unwrap_or_else(|| "—".to_string()),
                etiqueta: "Metro más usado",
            },
            Kpi {
                valor: corpus
                    .tipos_rima
                    .first()
                    .map(|t| t.tipo.clone())
                    .unwrap_or_else(|| "—".to_string()),
                etiqueta: "Tipo de rima dominante",
            },
            Kpi {
                valor: corpus
                    .figuras_frecuentes
                    .first()
                    .and_then(|f| f.figura.split_whitespace().next().map(str::to_string))
                    .unwrap_or_else(|| "—".to_string()),
                etiqueta: "Figura retórica más frecuente",
            },
        ];

        let graficas = vec![
            Grafica {
                titulo: "Metros dominantes",
                filas: view::bar_rows(
                    corpus
                        .metros_dominantes
                        .iter()
                        .map(|d| (d.metro.clone(), d.count)),
                ),
            },
            Grafica {
                titulo: "Tipos de rima",
                filas: view::bar_rows(
                    corpus.tipos_rima.iter().map(|d| (d.tipo.clone(), d.count)),
                ),
            },
            Grafica {
                titulo: "Esquemas de estrofa",
                filas: view::bar_rows(
                    corpus
                        .esquemas_frecuentes
                        .iter()
                        .map(|d| (d.esquema.clone(), d.count)),
                ),
            },
            Grafica {
                titulo: "Figuras retóricas",
                filas: view::bar_rows(
                    corpus
                        .figuras_frecuentes
                        .iter()
                        .map(|d| (d.figura.clone(), d.count)),
                ),
            },
        ];

        let lexico: Vec<(String, u64)> = corpus
            .lexico_gaditano_top
            .iter()
            .map(|l| (l.palabra.clone(), l.apariciones))
            .collect();
        let claves: Vec<(String, u64)> = corpus
            .palabras_clave_corpus
            .iter()
            .map(|p| (p.palabra.clone(), p.frecuencia))
            .collect();

        let top_letras = corpus
            .top_letras
            .iter()
            .map(|l| {
                let mut tags = Vec::new();
                if let Some(anio) = l.anio {
                    tags.push(Etiqueta {
                        clase: "tag anio",
                        texto: anio.to_string(),
                    });
                }
                if let Some(modalidad) = &l.modalidad {
                    tags.push(Etiqueta {
                        clase: "tag modalidad",
                        texto: modalidad.clone(),
                    });
                }
                if let Some(metro) = &l.nombre_metro {
                    tags.push(Etiqueta {
                        clase: "tag",
                        texto: metro.clone(),
                    });
                }
                if let Some(rima) = &l.tipo_rima {
                    tags.push(Etiqueta {
                        clase: "tag",
                        texto: format!("Rima {rima}"),
                    });
                }
                TopLetra {
                    href: format!("/letra/{}", l.id),
                    titulo: l.titulo.clone(),
                    tags,
                    score: format!("Score: {}/100", l.score_poetico),
                }
            })
            .collect();

        Self {
            kpis,
            graficas,
            lexico: nube_items(&lexico, true),
            claves: nube_items(&claves, true),
            top_letras,
        }
    }
}

async fn poetica(State(state): State<SharedState>) -> Html<String> {
    let chrome = state.chrome("poetica").await;
    let filtros = state.client.filtros().await.unwrap_or_default();
    let selects = Selects::new(&filtros, &Filtro::default());
    let resultado = state
        .poeticas
        .obtener("guardadas", || async {
            state
                .client
                .estadisticas_poeticas()
                .await
                .map(EstadisticasPoeticas::into_corpus)
        })
        .await;
    let (dash, aviso) = match resultado {
        Ok(corpus) if corpus.total_analizadas == 0 => (
            None,
            Some(
                "No hay letras analizadas aún. Lanza un análisis del corpus con los filtros de arriba."
                    .to_string(),
            ),
        ),
        Ok(corpus) => (Some(PoeticaDash::new(&corpus)), None),
        Err(err) => (
            None,
            Some(mensaje_panel("Error al cargar estadísticas poéticas", &err)),
        ),
    };
    respond(PoeticaTemplate {
        chrome,
        selects,
        dash,
        aviso,
    })
}

async fn poetica_analizar(
    State(state): State<SharedState>,
    Form(form): Form<PoeticaForm>,
) -> Html<String> {
    let chrome = state.chrome("poetica").await;
    let filtro = Filtro::new(
        form.anio.as_deref(),
        form.modalidad.as_deref(),
        form.tipo_pieza.as_deref(),
        None,
    );
    let filtros = state.client.filtros().await.unwrap_or_default();
    let selects = Selects::new(&filtros, &filtro);
    let peticion = PeticionCorpus {
        modalidad: filtro.modalidad.clone(),
        anio: filtro.anio.clone(),
        tipo_pieza: filtro.tipo_pieza.clone(),
        limit: CORPUS_SAMPLE_LIMIT,
    };
    // On-demand analyses are never cached: each submission re-runs the batch.
    let (dash, aviso) = match state.client.analizar_corpus(&peticion).await {
        Ok(corpus) => (Some(PoeticaDash::new(&corpus)), None),
        Err(err) => (
            None,
            Some(mensaje_panel("Error al analizar el corpus", &err)),
        ),
    };
    respond(PoeticaTemplate {
        chrome,
        selects,
        dash,
        aviso,
    })
}

// ---------------------------------------------------------------------------
// Letra aleatoria
// ---------------------------------------------------------------------------

struct AleatoriaVista {
    titulo: String,
    tags: Vec<Etiqueta>,
    preview: String,
    autor: Option<String>,
    href: String,
}

impl AleatoriaVista {
    fn new(letra: Letra) -> Self {
        let mut tags = Vec::new();
        if let Some(anio) = letra.anio {
            tags.push(Etiqueta {
                clase: "tag anio",
                texto: anio.to_string(),
            });
        }
        if let Some(modalidad) = &letra.modalidad {
            tags.push(Etiqueta {
                clase: "tag modalidad",
                texto: modalidad.clone(),
            });
        }
        if let Some(tipo) = &letra.tipo_pieza {
            tags.push(Etiqueta {
                clase: "tag tipo",
                texto: tipo.clone(),
            });
        }
        if let Some(agrupacion) = &letra.agrupacion {
            tags.push(Etiqueta {
                clase: "tag",
                texto: agrupacion.clone(),
            });
        }
        Self {
            href: format!("/letra/{}", letra.id),
            preview: view::truncar(letra.contenido.as_deref().unwrap_or(""), PREVIEW_CHARS),
            titulo: letra.titulo,
            tags,
            autor: letra.autor,
        }
    }
}

async fn aleatorio(
    State(state): State<SharedState>,
    Query(params): Query<ModalidadParams>,
) -> Html<String> {
    let chrome = state.chrome("aleatorio").await;
    let modalidad = params
        .modalidad
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let filtros = state.client.filtros().await.unwrap_or_default();
    let selects = Selects::new(
        &filtros,
        &Filtro::new(None, modalidad.as_deref(), None, None),
    );
    let (vista, mensaje) = match state.client.aleatorio(modalidad.as_deref()).await {
        Ok(letra) => (Some(AleatoriaVista::new(letra)), None),
        Err(ApiError::Service(_)) => (None, Some("No hay letras disponibles".to_string())),
        Err(err) => (None, Some(mensaje_panel("Error al cargar", &err))),
    };
    respond(AleatorioTemplate {
        chrome,
        selects,
        vista,
        mensaje,
    })
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Explorar</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="filtros" method="get" action="/explorar">
        <select name="anio">
          <option value="">Todos los años</option>
          {% for o in selects.anios %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <select name="modalidad">
          <option value="">Todas las modalidades</option>
          {% for o in selects.modalidades %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <select name="tipo_pieza">
          <option value="">Todos los tipos</option>
          {% for o in selects.tipos %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <input type="text" name="agrupacion" placeholder="Agrupación..." value="{{ agrupacion }}" />
        <button type="submit">Filtrar</button>
        <a class="btn-limpiar" href="/explorar">Limpiar</a>
      </form>

      {% if error.is_some() %}
      <div class="empty-state">{{ error.as_ref().unwrap() }}</div>
      {% endif %}

      {% if listado.is_some() %}
      {% let l = listado.as_ref().unwrap() %}
      <div class="info-bar">
        <span>{{ l.resumen }}</span>
        <span>{{ l.pagina_info }}</span>
      </div>
      {% if l.letras.len() == 0 %}
      <div class="empty-state">No se encontraron letras con esos filtros</div>
      {% endif %}
      <div class="lista">
        {% for letra in l.letras %}
        <a class="letra-card" href="/letra/{{ letra.id }}">
          <div class="titulo">{{ letra.titulo }}</div>
          <div class="meta">
            {% if letra.anio.is_some() %}<span class="tag anio">{{ letra.anio.unwrap() }}</span>{% endif %}
            {% if letra.modalidad.is_some() %}<span class="tag modalidad">{{ letra.modalidad.as_ref().unwrap() }}</span>{% endif %}
            {% if letra.tipo_pieza.is_some() %}<span class="tag tipo">{{ letra.tipo_pieza.as_ref().unwrap() }}</span>{% endif %}
            {% if letra.agrupacion.is_some() %}<span class="tag">{{ letra.agrupacion.as_ref().unwrap() }}</span>{% endif %}
          </div>
        </a>
        {% endfor %}
      </div>
      {% if l.paginacion.len() > 0 %}
      <nav class="paginacion">
        {% if l.prev.is_some() %}
        <a class="pag-btn" href="{{ l.prev.as_ref().unwrap() }}">← Anterior</a>
        {% else %}
        <span class="pag-btn disabled">← Anterior</span>
        {% endif %}
        {% for p in l.paginacion %}
        {% if p.actual %}
        <span class="pag-btn active">{{ p.etiqueta }}</span>
        {% else if p.href.is_some() %}
        <a class="pag-btn" href="{{ p.href.as_ref().unwrap() }}">{{ p.etiqueta }}</a>
        {% else %}
        <span class="pag-btn disabled">{{ p.etiqueta }}</span>
        {% endif %}
        {% endfor %}
        {% if l.next.is_some() %}
        <a class="pag-btn" href="{{ l.next.as_ref().unwrap() }}">Siguiente →</a>
        {% else %}
        <span class="pag-btn disabled">Siguiente →</span>
        {% endif %}
      </nav>
      {% endif %}
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct ExplorarTemplate {
    chrome: Chrome,
    selects: Selects,
    agrupacion: String,
    listado: Option<Listado>,
    error: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Buscar</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="buscador" method="get" action="/buscar">
        <input type="search" name="q" placeholder="Buscar en todas las letras..." value="{{ consulta }}" />
        <button type="submit">Buscar</button>
      </form>
      {% if temas.len() > 0 %}
      <div class="temas">
        {% for tema in temas %}
        <a class="tag tema" href="{{ tema.href }}">{{ tema.texto }}</a>
        {% endfor %}
      </div>
      {% endif %}

      {% if error.is_some() %}
      <div class="empty-state">{{ error.as_ref().unwrap() }}</div>
      {% endif %}

      {% if resultados.is_some() %}
      {% let r = resultados.as_ref().unwrap() %}
      {% if r.items.len() == 0 %}
      <div class="empty-state">No se encontraron resultados</div>
      {% else %}
      <div class="info-bar">{{ r.cabecera }}</div>
      {% for item in r.items %}
      <a class="resultado-item" href="{{ item.href }}">
        <div class="titulo">{{ item.titulo }}</div>
        <div class="meta">
          {% if item.anio.is_some() %}<span class="tag anio">{{ item.anio.unwrap() }}</span>{% endif %}
          {% if item.modalidad.is_some() %}<span class="tag modalidad">{{ item.modalidad.as_ref().unwrap() }}</span>{% endif %}
        </div>
        <div class="fragmento">{{ item.fragmento|safe }}</div>
      </a>
      {% endfor %}
      {% endif %}
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct BuscarTemplate {
    chrome: Chrome,
    consulta: String,
    temas: Vec<Enlace>,
    resultados: Option<Resultados>,
    error: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • {{ vista.titulo }}</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <article class="detalle">
        <h2>{{ vista.titulo }}</h2>
        <div class="meta">
          {% for tag in vista.tags %}
          <span class="{{ tag.clase }}">{{ tag.texto }}</span>
          {% endfor %}
        </div>
        {% if vista.poetica.is_some() %}
        {% let p = vista.poetica.as_ref().unwrap() %}
        <div class="detalle-poetica-tags">
          <span class="tag" style="color:{{ p.color }};border-color:{{ p.color }}">{{ p.texto }}</span>
          {% if p.metro.is_some() %}<span class="tag">{{ p.metro.as_ref().unwrap() }}</span>{% endif %}
          {% if p.rima.is_some() %}<span class="tag">Rima {{ p.rima.as_ref().unwrap() }}</span>{% endif %}
        </div>
        {% endif %}
        {% if vista.perfiles.len() > 0 %}
        <div class="detalle-perfil-links">
          {% for perfil in vista.perfiles %}
          <a class="perfil-link" href="{{ perfil.href }}" target="_blank" rel="noopener">{{ perfil.texto }}</a>
          {% endfor %}
        </div>
        {% endif %}
        {% if vista.versos.len() > 0 %}
        <div class="detalle-versos-destacados">
          <span class="versos-label">Versos destacados:</span>
          {% for verso in vista.versos %}
          <blockquote class="verso-destacado">{{ verso }}</blockquote>
          {% endfor %}
        </div>
        {% endif %}
        <div class="detalle-texto">{{ vista.contenido }}</div>
        {% if vista.fuente.is_some() %}
        {% let f = vista.fuente.as_ref().unwrap() %}
        <div class="detalle-fuente">Fuente: <a href="{{ f.href }}" target="_blank" rel="noopener">{{ f.texto }}</a></div>
        {% endif %}
        <div class="detalle-acciones">
          <a class="btn-poetico" href="{{ vista.analisis_href }}">✍ Análisis poético</a>
        </div>
      </article>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DetalleTemplate {
    chrome: Chrome,
    vista: DetalleVista,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Análisis poético</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <div class="analisis-header">
        <h2>Análisis Poético</h2>
        <div class="score-circle" style="border-color:{{ vista.color }};color:{{ vista.color }}">
          <span class="score-num">{{ vista.score }}</span>
          <span class="score-label">/ 100</span>
        </div>
      </div>

      <div class="analisis-grid">
        <div class="analisis-card">
          <h4>Métrica</h4>
          <div class="analisis-row"><span>Metro dominante</span><strong>{{ vista.metro }}</strong></div>
          <div class="analisis-row"><span>Sílabas</span><strong>{{ vista.silabas }}</strong></div>
          <div class="analisis-row"><span>Coherencia métrica</span><strong>{{ vista.coherencia }}</strong></div>
          <div class="analisis-row"><span>Distribución</span>
            <div>
              {% if vista.distribucion.len() == 0 %}
              <span class="text-muted">No analizado</span>
              {% endif %}
              {% for metro in vista.distribucion %}<span class="tag">{{ metro }}</span>{% endfor %}
            </div>
          </div>
          <div class="analisis-row"><span>Estrofas</span><strong>{{ vista.n_estrofas }}</strong></div>
          <div class="analisis-row"><span>Versos totales</span><strong>{{ vista.n_versos }}</strong></div>
          <div class="analisis-row"><span>Longitud media verso</span><strong>{{ vista.longitud_media }}</strong></div>
        </div>

        <div class="analisis-card">
          <h4>Rima</h4>
          <div class="analisis-row"><span>Tipo de rima</span><strong>{{ vista.rima_tipo }}</strong></div>
          <div class="analisis-row"><span>Esquema predominante</span><strong class="esquema-badge">{{ vista.esquema }}</strong></div>
          <h5>Por estrofa:</h5>
          <div class="estrofas-lista">
            {% if vista.estrofas.len() == 0 %}
            <span class="text-muted">No analizado</span>
            {% endif %}
            {% for estrofa in vista.estrofas %}
            <div class="estrofa-row">
              <span class="estrofa-esquema">{{ estrofa.esquema }}</span>
              <span class="estrofa-info">{{ estrofa.info }}</span>
            </div>
            {% endfor %}
          </div>
        </div>

        <div class="analisis-card">
          <h4>Vocabulario</h4>
          <div class="analisis-row"><span>Total palabras</span><strong>{{ vista.total_palabras }}</strong></div>
          <div class="analisis-row"><span>Vocabulario único</span><strong>{{ vista.vocabulario_unico }}</strong></div>
          <div class="analisis-row"><span>Densidad léxica</span><strong>{{ vista.densidad }}</strong> <em class="text-muted">({{ vista.riqueza }})</em></div>
          <div class="analisis-row"><span>Léxico gaditano</span>
            {% if vista.lexico.len() > 0 %}
            <span class="text-muted">{{ vista.lexico }}</span>
            {% else %}
            <span class="text-muted">ninguno detectado</span>
            {% endif %}
          </div>
          <div class="analisis-row"><span>Palabras clave</span>
            <div>
              {% if vista.palabras_clave.len() == 0 %}
              <span class="text-muted">—</span>
              {% endif %}
              {% for palabra in vista.palabras_clave %}<span class="tag">{{ palabra }}</span>{% endfor %}
            </div>
          </div>
        </div>

        <div class="analisis-card">
          <h4>Figuras Retóricas</h4>
          {% if vista.figuras.len() == 0 %}
          <span class="text-muted">No detectadas</span>
          {% endif %}
          {% for figura in vista.figuras %}
          <div class="figura-item">
            <strong>{{ figura.nombre }}</strong>
            {% if figura.conteo.is_some() %}<span class="figura-count">({{ figura.conteo.unwrap() }})</span>{% endif %}
            {% if figura.palabras.is_some() %}<em> — {{ figura.palabras.as_ref().unwrap() }}</em>{% endif %}
            {% for ejemplo in figura.ejemplos %}
            <blockquote class="figura-ejemplo">{{ ejemplo }}</blockquote>
            {% endfor %}
          </div>
          {% endfor %}
        </div>
      </div>

      <div class="analisis-card analisis-full">
        <h4>Versos Destacados</h4>
        {% if vista.versos.len() == 0 %}
        <span class="text-muted">No disponibles</span>
        {% endif %}
        {% for verso in vista.versos %}
        <blockquote class="verso-destacado">{{ verso }}</blockquote>
        {% endfor %}
      </div>

      <div class="detalle-acciones">
        <a class="pag-btn" href="{{ letra_href }}">Volver a la letra</a>
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct AnalisisTemplate {
    chrome: Chrome,
    letra_href: String,
    vista: AnalisisVista,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Comparar</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="filtros" method="get" action="/comparar">
        <input type="text" name="a1" placeholder="Primera agrupación..." value="{{ a1 }}" />
        <input type="text" name="a2" placeholder="Segunda agrupación..." value="{{ a2 }}" />
        <button type="submit">Comparar</button>
      </form>

      {% if mensaje.is_some() %}
      <div class="empty-state">{{ mensaje.as_ref().unwrap() }}</div>
      {% endif %}

      {% if cards.len() > 0 %}
      <div class="comparar-grid">
        {% for card in cards %}
        <div class="comp-card">
          <h4>{{ card.nombre }}</h4>
          <div class="comp-row"><span class="label">Total letras</span><span class="value">{{ card.total }}</span></div>
          <div class="comp-row"><span class="label">Años activos</span><span class="value">{{ card.anios_activos }}</span></div>
          <div class="comp-row"><span class="label">Periodo</span><span class="value">{{ card.periodo }}</span></div>
          <div class="comp-row"><span class="label">Modalidad</span><span class="value">{{ card.modalidades }}</span></div>
          <div class="comp-row"><span class="label">Autores</span><span class="value">{{ card.autores }}</span></div>
          <div class="comp-row"><span class="label">Longitud media</span><span class="value">{{ card.longitud }}</span></div>
          <div class="comp-row"><span class="label">Calidad media</span><span class="value">{{ card.calidad }}</span></div>
          <div class="comp-row"><span class="label">Tipos de pieza</span><span class="value">
            {% if card.tipos.len() == 0 %}N/A{% endif %}
            {% for tipo in card.tipos %}<span class="tag tipo">{{ tipo }}</span>{% endfor %}
          </span></div>
        </div>
        {% endfor %}
      </div>
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct CompararTemplate {
    chrome: Chrome,
    a1: String,
    a2: String,
    cards: Vec<CompCard>,
    mensaje: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Estadísticas</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      {% if error.is_some() %}
      <div class="empty-state">{{ error.as_ref().unwrap() }}</div>
      {% endif %}
      <div class="charts-grid">
        {% for grafica in graficas %}
        <section class="chart-card">
          <h3>{{ grafica.titulo }}</h3>
          {% for fila in grafica.filas %}
          <div class="bar-row">
            <span class="bar-label">{{ fila.label }}</span>
            <div class="bar-track"><div class="bar-fill" style="width:{{ fila.pct }}%"></div></div>
            <span class="bar-value">{{ fila.value }}</span>
          </div>
          {% endfor %}
        </section>
        {% endfor %}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct EstadisticasTemplate {
    chrome: Chrome,
    graficas: Vec<Grafica>,
    error: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Descubrir</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="filtros" method="get" action="/descubrir">
        <select name="modalidad">
          <option value="">Todas las modalidades</option>
          {% for o in selects.modalidades %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <button type="submit">Ver vocabulario</button>
      </form>

      {% if error.is_some() %}
      <div class="empty-state">{{ error.as_ref().unwrap() }}</div>
      {% endif %}
      {% if palabras.len() == 0 && error.is_none() %}
      <div class="empty-state">No hay datos</div>
      {% endif %}
      <div class="nube">
        {% for w in palabras %}
        <a class="nube-word{% if w.bold %} fuerte{% endif %}" style="font-size:{{ w.font_rem }}rem;color:{{ w.color }}" title="{{ w.titulo }}" href="{{ w.href }}">{{ w.palabra }}</a>
        {% endfor %}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DescubrirTemplate {
    chrome: Chrome,
    selects: Selects,
    palabras: Vec<NubeItem>,
    error: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Cronología</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      {% if error.is_some() %}
      <div class="empty-state">{{ error.as_ref().unwrap() }}</div>
      {% endif %}
      {% if hitos.len() == 0 && error.is_none() %}
      <div class="empty-state">No hay datos cronológicos</div>
      {% endif %}
      <div class="timeline">
        {% for hito in hitos %}
        <a class="timeline-card{% if hito.destacado %} highlight{% endif %}" href="{{ hito.href }}">
          <div>
            <span class="timeline-anio">{{ hito.anio }}</span>
            <span class="timeline-stats">
              <span>{{ hito.letras }}</span>
              <span>{{ hito.agrupaciones }}</span>
              <span>{{ hito.modalidades }}</span>
              <span>{{ hito.calidad }}</span>
            </span>
          </div>
          <div class="timeline-agrupaciones">
            {% for tag in hito.tags %}<span class="tag">{{ tag }}</span>{% endfor %}
          </div>
        </a>
        {% endfor %}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct CronologiaTemplate {
    chrome: Chrome,
    hitos: Vec<HitoVista>,
    error: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Poética</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="filtros" method="post" action="/poetica/analizar">
        <select name="modalidad">
          <option value="">Todas las modalidades</option>
          {% for o in selects.modalidades %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <select name="anio">
          <option value="">Todos los años</option>
          {% for o in selects.anios %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <select name="tipo_pieza">
          <option value="">Todos los tipos</option>
          {% for o in selects.tipos %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <button type="submit">Analizar corpus</button>
      </form>

      {% if aviso.is_some() %}
      <div class="empty-state">{{ aviso.as_ref().unwrap() }}</div>
      {% endif %}

      {% if dash.is_some() %}
      {% let d = dash.as_ref().unwrap() %}
      <div class="kpis">
        {% for kpi in d.kpis %}
        <div class="kpi-card">
          <div class="kpi-num">{{ kpi.valor }}</div>
          <div class="kpi-label">{{ kpi.etiqueta }}</div>
        </div>
        {% endfor %}
      </div>
      <div class="charts-grid">
        {% for grafica in d.graficas %}
        <section class="chart-card">
          <h3>{{ grafica.titulo }}</h3>
          {% for fila in grafica.filas %}
          <div class="bar-row">
            <span class="bar-label">{{ fila.label }}</span>
            <div class="bar-track"><div class="bar-fill" style="width:{{ fila.pct }}%"></div></div>
            <span class="bar-value">{{ fila.value }}</span>
          </div>
          {% endfor %}
        </section>
        {% endfor %}
      </div>
      <div class="charts-grid">
        <section class="chart-card">
          <h3>Léxico gaditano</h3>
          <div class="nube mini">
            {% for w in d.lexico %}
            <a class="nube-word" style="font-size:{{ w.font_rem }}rem;color:{{ w.color }}" title="{{ w.titulo }}" href="{{ w.href }}">{{ w.palabra }}</a>
            {% endfor %}
          </div>
        </section>
        <section class="chart-card">
          <h3>Palabras clave del corpus</h3>
          <div class="nube mini">
            {% for w in d.claves %}
            <a class="nube-word" style="font-size:{{ w.font_rem }}rem;color:{{ w.color }}" title="{{ w.titulo }}" href="{{ w.href }}">{{ w.palabra }}</a>
            {% endfor %}
          </div>
        </section>
      </div>
      {% if d.top_letras.len() > 0 %}
      <section class="top-letras">
        <h3>Letras con mayor score poético</h3>
        <div class="lista">
          {% for letra in d.top_letras %}
          <a class="letra-card poetica-card" href="{{ letra.href }}">
            <div class="titulo">{{ letra.titulo }}</div>
            <div class="meta">
              {% for tag in letra.tags %}<span class="{{ tag.clase }}">{{ tag.texto }}</span>{% endfor %}
              <span class="tag score-tag">{{ letra.score }}</span>
            </div>
          </a>
          {% endfor %}
        </div>
      </section>
      {% endif %}
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct PoeticaTemplate {
    chrome: Chrome,
    selects: Selects,
    dash: Option<PoeticaDash>,
    aviso: Option<String>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="es">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Cancionero • Al azar</title>
    <link rel="stylesheet" href="/assets/app.css" />
  </head>
  <body>
    <header class="cabecera">
      <h1>Cancionero del Carnaval</h1>
      {% if chrome.stats.is_some() %}
      {% let s = chrome.stats.as_ref().unwrap() %}
      <div class="stat-strip">
        <span><strong>{{ s.letras }}</strong> letras</span>
        <span><strong>{{ s.anios }}</strong> años</span>
        <span><strong>{{ s.modalidades }}</strong> modalidades</span>
        <span><strong>{{ s.agrupaciones }}</strong> agrupaciones</span>
      </div>
      {% endif %}
      <nav class="tabs">
        {% for tab in chrome.tabs %}
        <a href="{{ tab.href }}" class="tab{% if tab.clave == chrome.active %} active{% endif %}">{{ tab.titulo }}</a>
        {% endfor %}
      </nav>
    </header>
    <main>
      <form class="filtros" method="get" action="/aleatorio">
        <select name="modalidad">
          <option value="">Todas las modalidades</option>
          {% for o in selects.modalidades %}
          <option value="{{ o.valor }}"{% if o.seleccionada %} selected{% endif %}>{{ o.valor }}</option>
          {% endfor %}
        </select>
        <button type="submit">Otra letra</button>
      </form>

      {% if mensaje.is_some() %}
      <div class="empty-state">{{ mensaje.as_ref().unwrap() }}</div>
      {% endif %}

      {% if vista.is_some() %}
      {% let v = vista.as_ref().unwrap() %}
      <article class="aleatoria">
        <div class="ale-titulo">{{ v.titulo }}</div>
        <div class="ale-meta">
          {% for tag in v.tags %}<span class="{{ tag.clase }}">{{ tag.texto }}</span>{% endfor %}
        </div>
        <div class="ale-texto">{{ v.preview }}</div>
        <div class="ale-footer">
          {% if v.autor.is_some() %}
          <span class="text-muted">Autor: {{ v.autor.as_ref().unwrap() }}</span>
          {% else %}
          <span></span>
          {% endif %}
          <a class="btn-ver" href="{{ v.href }}">Ver completa</a>
        </div>
      </article>
      {% endif %}
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct AleatorioTemplate {
    chrome: Chrome,
    selects: Selects,
    vista: Option<AleatoriaVista>,
    mensaje: Option<String>,
}

const APP_CSS: &str = r#":root {
  --bg: #15131c;
  --bg-card: #1f1c29;
  --accent: #e0433e;
  --accent-light: #f0776f;
  --gold: #d8a035;
  --success: #4caf7d;
  --text: #efeaf2;
  --text-secondary: #b2a9bd;
  --text-muted: #6f6680;
  --border: #332e40;
}
* { box-sizing: border-box; }
body {
  margin: 0;
  font-family: "Segoe UI", system-ui, sans-serif;
  background: var(--bg);
  color: var(--text);
}
a { color: inherit; text-decoration: none; }
.cabecera { padding: 1.5rem 2rem 0; border-bottom: 1px solid var(--border); }
.cabecera h1 { margin: 0 0 .5rem; font-size: 1.6rem; color: var(--accent-light); }
.stat-strip { display: flex; gap: 1.5rem; color: var(--text-secondary); font-size: .9rem; }
.stat-strip strong { color: var(--gold); }
.tabs { display: flex; gap: .25rem; margin-top: 1rem; flex-wrap: wrap; }
.tab { padding: .5rem 1rem; border-radius: 6px 6px 0 0; color: var(--text-secondary); }
.tab.active { background: var(--bg-card); color: var(--accent-light); }
main { padding: 1.5rem 2rem; max-width: 1100px; margin: 0 auto; }
.filtros, .buscador { display: flex; gap: .5rem; flex-wrap: wrap; margin-bottom: 1rem; }
.filtros select, .filtros input, .buscador input {
  background: var(--bg-card); color: var(--text);
  border: 1px solid var(--border); border-radius: 6px; padding: .5rem .75rem;
}
.buscador input { flex: 1; min-width: 16rem; }
.filtros button, .buscador button, .btn-ver, .btn-poetico, .btn-limpiar {
  background: var(--accent); color: #fff; border: 0; border-radius: 6px;
  padding: .5rem 1rem; cursor: pointer;
}
.btn-limpiar { background: var(--bg-card); border: 1px solid var(--border); color: var(--text-secondary); }
.info-bar { display: flex; justify-content: space-between; color: var(--text-secondary); margin-bottom: .75rem; }
.empty-state { padding: 2rem; text-align: center; color: var(--text-muted); }
.lista { display: grid; grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr)); gap: .75rem; }
.letra-card, .resultado-item {
  display: block; background: var(--bg-card); border: 1px solid var(--border);
  border-radius: 8px; padding: .9rem 1rem; margin-bottom: .5rem;
}
.letra-card:hover, .resultado-item:hover { border-color: var(--accent); }
.titulo { font-weight: 600; margin-bottom: .4rem; }
.meta { display: flex; flex-wrap: wrap; gap: .3rem; }
.tag {
  font-size: .72rem; padding: .1rem .5rem; border: 1px solid var(--border);
  border-radius: 999px; color: var(--text-secondary);
}
.tag.anio { color: var(--gold); border-color: var(--gold); }
.tag.modalidad { color: var(--accent-light); border-color: var(--accent-light); }
.tag.tipo { color: var(--success); border-color: var(--success); }
.tag.autor, .tag.score-tag { color: var(--gold); }
.tag.tema { cursor: pointer; }
.temas { display: flex; flex-wrap: wrap; gap: .4rem; margin-bottom: 1rem; }
.fragmento { margin-top: .4rem; color: var(--text-secondary); font-size: .85rem; }
.fragmento mark { background: transparent; color: var(--gold); }
.paginacion { display: flex; gap: .3rem; justify-content: center; margin-top: 1.25rem; flex-wrap: wrap; }
.pag-btn {
  padding: .35rem .7rem; border: 1px solid var(--border); border-radius: 6px;
  color: var(--text-secondary); background: var(--bg-card);
}
.pag-btn.active { background: var(--accent); color: #fff; border-color: var(--accent); }
.pag-btn.disabled { opacity: .4; }
.detalle h2 { color: var(--accent-light); }
.detalle-texto { white-space: pre-line; margin: 1rem 0; line-height: 1.6; }
.detalle-fuente, .detalle-perfil-links { margin: .75rem 0; color: var(--text-secondary); }
.perfil-link { margin-right: 1rem; color: var(--accent-light); }
.detalle-poetica-tags { margin: .5rem 0; display: flex; gap: .3rem; flex-wrap: wrap; }
.versos-label { color: var(--text-muted); font-size: .85rem; }
.verso-destacado, .figura-ejemplo {
  margin: .4rem 0; padding: .4rem .75rem; border-left: 3px solid var(--gold);
  color: var(--text-secondary); font-style: italic;
}
.comparar-grid, .charts-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(20rem, 1fr)); gap: 1rem; }
.comp-card, .chart-card, .analisis-card, .kpi-card {
  background: var(--bg-card); border: 1px solid var(--border); border-radius: 8px; padding: 1rem;
}
.comp-row { display: flex; justify-content: space-between; padding: .3rem 0; border-bottom: 1px dashed var(--border); }
.comp-row .label { color: var(--text-muted); }
.bar-row { display: grid; grid-template-columns: 8rem 1fr 3rem; gap: .5rem; align-items: center; padding: .2rem 0; }
.bar-label { font-size: .8rem; color: var(--text-secondary); overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.bar-track { background: var(--bg); border-radius: 4px; height: .8rem; }
.bar-fill { background: linear-gradient(90deg, var(--accent), var(--accent-light)); height: 100%; border-radius: 4px; }
.bar-value { font-size: .8rem; color: var(--text-muted); text-align: right; }
.nube { display: flex; flex-wrap: wrap; gap: .6rem 1rem; align-items: baseline; padding: 1rem 0; }
.nube-word { cursor: pointer; line-height: 1.1; }
.nube-word.fuerte { font-weight: 700; }
.timeline { display: flex; flex-direction: column; gap: .6rem; }
.timeline-card {
  display: flex; justify-content: space-between; gap: 1rem; flex-wrap: wrap;
  background: var(--bg-card); border: 1px solid var(--border); border-radius: 8px; padding: .75rem 1rem;
}
.timeline-card.highlight { border-color: var(--gold); }
.timeline-anio { font-size: 1.2rem; font-weight: 700; color: var(--gold); margin-right: 1rem; }
.timeline-stats { color: var(--text-secondary); font-size: .85rem; display: inline-flex; gap: 1rem; flex-wrap: wrap; }
.timeline-agrupaciones { display: flex; gap: .3rem; flex-wrap: wrap; }
.kpis { display: grid; grid-template-columns: repeat(auto-fit, minmax(10rem, 1fr)); gap: .75rem; margin-bottom: 1rem; }
.kpi-num { font-size: 1.4rem; font-weight: 700; color: var(--accent-light); }
.kpi-label { color: var(--text-muted); font-size: .8rem; }
.analisis-header { display: flex; justify-content: space-between; align-items: center; }
.score-circle {
  border: 3px solid; border-radius: 50%; width: 5rem; height: 5rem;
  display: flex; flex-direction: column; align-items: center; justify-content: center;
}
.score-num { font-size: 1.4rem; font-weight: 700; }
.score-label { font-size: .7rem; }
.analisis-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(18rem, 1fr)); gap: 1rem; margin: 1rem 0; }
.analisis-row { display: flex; justify-content: space-between; gap: .75rem; padding: .3rem 0; border-bottom: 1px dashed var(--border); }
.analisis-row span:first-child { color: var(--text-muted); }
.analisis-full { margin-top: 1rem; }
.esquema-badge { letter-spacing: .2em; color: var(--gold); }
.estrofa-row { display: flex; gap: 1rem; padding: .25rem 0; }
.estrofa-esquema { letter-spacing: .15em; color: var(--gold); min-width: 5rem; }
.estrofa-info { color: var(--text-secondary); font-size: .85rem; }
.figura-item { margin-bottom: .6rem; }
.figura-count { color: var(--text-muted); }
.text-muted { color: var(--text-muted); }
.aleatoria { background: var(--bg-card); border: 1px solid var(--border); border-radius: 8px; padding: 1.25rem; }
.ale-titulo { font-size: 1.2rem; font-weight: 700; margin-bottom: .5rem; }
.ale-meta { display: flex; gap: .3rem; flex-wrap: wrap; margin-bottom: .75rem; }
.ale-texto { white-space: pre-line; color: var(--text-secondary); line-height: 1.6; }
.ale-footer { display: flex; justify-content: space-between; align-items: center; margin-top: 1rem; }
.top-letras { margin-top: 1.5rem; }
.pagina-error { padding: 3rem 2rem; max-width: 36rem; margin: 0 auto; text-align: center; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{body, body::Body, http::Request};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct Contadores {
        basicas: Arc<AtomicUsize>,
        avanzadas: Arc<AtomicUsize>,
        timeline: Arc<AtomicUsize>,
        buscar: Arc<AtomicUsize>,
    }

    async fn stub_api() -> (String, Contadores) {
        let contadores = Contadores::default();
        let router = Router::new()
            .route(
                "/api/estadisticas",
                get({
                    let contadores = contadores.clone();
                    move || async move {
                        contadores.basicas.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "total_letras": 1234, "total_anios": 25,
                            "total_modalidades": 4, "total_agrupaciones": 321,
                            "por_anio": [{"anio": 1998, "cantidad": 40}, {"anio": 2001, "cantidad": 20}],
                            "por_modalidad": [{"modalidad": "Comparsa", "cantidad": 700}],
                            "por_tipo_pieza": [{"tipo": "Pasodoble", "cantidad": 500}],
                            "top_agrupaciones": [{"agrupacion": "Los Piratas", "cantidad": 31}]
                        }))
                    }
                }),
            )
            .route(
                "/api/estadisticas_avanzadas",
                get({
                    let contadores = contadores.clone();
                    move || async move {
                        contadores.avanzadas.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "top_autores": [{"autor": "Juan", "letras": 12, "agrupaciones": 3}],
                            "distribucion_calidad": [{"rango": "70-100", "cantidad": 9}]
                        }))
                    }
                }),
            )
            .route(
                "/api/filtros",
                get(|| async {
                    Json(json!({
                        "anios": [1998, 2001],
                        "modalidades": ["Comparsa", "Chirigota"],
                        "tipos_pieza": ["Pasodoble", "Cuplé"]
                    }))
                }),
            )
            .route(
                "/api/letras",
                get(|| async {
                    Json(json!({
                        "letras": [
                            {"id": 3, "titulo": "<script>alert('x')</script>", "anio": 1998,
                             "modalidad": "Comparsa", "tipo_pieza": "Pasodoble",
                             "agrupacion": "Los Piratas"},
                            {"id": 4, "titulo": "La bahía de plata", "anio": 2001}
                        ],
                        "total": 1000, "page": 10, "total_pages": 20
                    }))
                }),
            )
            .route(
                "/api/letra/3",
                get(|| async {
                    Json(json!({
                        "id": 3, "titulo": "Aires de levante", "anio": 1998,
                        "modalidad": "Comparsa", "agrupacion": "Los Piratas",
                        "autor": "Juan de Cádiz",
                        "contenido": "Viento del levante\nque mueve la bahía",
                        "score_poetico": 88, "nombre_metro": "octosílabo",
                        "tipo_rima": "consonante",
                        "versos_destacados": "[\"que mueve la bahía\"]"
                    }))
                }),
            )
            .route(
                "/api/buscar",
                get({
                    let contadores = contadores.clone();
                    move || async move {
                        contadores.buscar.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "resultados": [{"id": 3, "titulo": "Aires de levante", "anio": 1998,
                                            "fragmento": "la <mark>bahía</mark> dormida"}],
                            "total": 1, "query": "bahía"
                        }))
                    }
                }),
            )
            .route(
                "/api/comparar",
                get(|| async { Json(json!({"error": "Agrupación desconocida"})) }),
            )
            .route(
                "/api/timeline",
                get({
                    let contadores = contadores.clone();
                    move || async move {
                        contadores.timeline.fetch_add(1, Ordering::SeqCst);
                        Json(json!({
                            "timeline": [
                                {"anio": 1998, "total_letras": 100, "agrupaciones": 12,
                                 "modalidades": "Comparsa, Chirigota", "calidad_media": 55.5,
                                 "top_agrupaciones": ["Los Piratas", "La Trinchera", "Otros", "Más"]},
                                {"anio": 2001, "total_letras": 20, "agrupaciones": 4,
                                 "modalidades": "Comparsa", "calidad_media": 48.0,
                                 "top_agrupaciones": ["La Trinchera"]}
                            ]
                        }))
                    }
                }),
            )
            .route(
                "/api/palabras_frecuentes",
                get(|| async {
                    Json(json!({
                        "palabras": [{"palabra": "carnaval", "frecuencia": 90},
                                     {"palabra": "bahía", "frecuencia": 10}],
                        "total_textos": 2
                    }))
                }),
            )
            .route(
                "/api/estadisticas_poeticas",
                get(|| async { Json(json!({"total_analizadas": 0})) }),
            )
            .route(
                "/api/analizar_corpus",
                post(|| async {
                    Json(json!({
                        "total_analizadas": 42, "score_medio": 51.3,
                        "densidad_lexica_media": 44.0,
                        "metros_dominantes": [{"metro": "octosílabo", "count": 30}],
                        "tipos_rima": [{"tipo": "asonante", "count": 25}],
                        "esquemas_frecuentes": [{"esquema": "ABAB", "count": 11}],
                        "figuras_frecuentes": [{"figura": "anáfora reiterada", "count": 7}],
                        "lexico_gaditano_top": [{"palabra": "bastinazo", "apariciones": 5}],
                        "palabras_clave_corpus": [{"palabra": "libertad", "frecuencia": 8}],
                        "top_letras": [{"id": 3, "titulo": "Aires de levante", "score_poetico": 88}]
                    }))
                }),
            )
            .route(
                "/api/analisis_poetico/3",
                get(|| async {
                    Json(json!({
                        "n_estrofas": 4, "n_versos": 16, "longitud_media_verso": 31.5,
                        "metrica": {"metro_dominante": 8, "nombre_metro": "octosílabo",
                                    "coherencia_pct": 81.2, "distribucion": {"8": 13, "11": 3}},
                        "rima": {"tipo_rima": "consonante", "esquema_predominante": "ABAB",
                                 "estrofas": [{"n_versos": 4, "esquema": "ABAB",
                                               "tipo_rima": "consonante"}]},
                        "vocabulario": {"total_palabras": 120, "vocabulario_unico": 80,
                                        "densidad_lexica": 66.7, "riqueza": "alta",
                                        "lexico_gaditano": ["bastinazo"],
                                        "palabras_clave": [{"palabra": "bahía", "frecuencia": 4}]},
                        "figuras_retoricas": [],
                        "versos_destacados": ["que mueve la bahía"],
                        "score_poetico": 88
                    }))
                }),
            )
            .route(
                "/api/aleatorio",
                get(|| async {
                    Json(json!({
                        "id": 9, "titulo": "Pregón largo", "modalidad": "Chirigota",
                        "contenido": "la".repeat(400)
                    }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (base, contadores)
    }

    async fn app(base: &str) -> Router {
        let client = CorpusClient::new(base.to_string(), Duration::from_secs(5)).unwrap();
        build_router(Arc::new(AppState::new(client)))
    }

    async fn get_html(router: &Router, uri: &str) -> String {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success(), "GET {uri}");
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn explorar_renders_counts_and_pagination_window() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/explorar?page=10").await;
        assert!(html.contains("1.000 letras encontradas"));
        assert!(html.contains("Página 10 de 20"));
        assert!(html.contains("page=9"));
        assert!(html.contains("page=11"));
        assert!(html.contains(">...<"));
        assert!(html.contains("La bahía de plata"));
    }

    #[tokio::test]
    async fn explorar_escapes_content_derived_markup() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/explorar").await;
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }

    #[tokio::test]
    async fn detalle_renders_badge_verses_and_profile_links() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/letra/3").await;
        assert!(html.contains("Aires de levante"));
        assert!(html.contains("Score poético: 88/100"));
        assert!(html.contains("var(--success)"));
        assert!(html.contains("que mueve la bahía"));
        assert!(html.contains("/autor/Juan%20de%20C%C3%A1diz"));
        assert!(html.contains("/letra/3/analisis"));
    }

    #[tokio::test]
    async fn analisis_renders_four_cards_with_defaults() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/letra/3/analisis").await;
        assert!(html.contains("octosílabo"));
        assert!(html.contains("81.2%"));
        assert!(html.contains("ABAB"));
        assert!(html.contains("No detectadas"));
        assert!(html.contains("bastinazo"));
    }

    #[tokio::test]
    async fn comparar_prompts_then_surfaces_service_error() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/comparar").await;
        assert!(html.contains("Introduce dos agrupaciones para comparar"));
        let html = get_html(&router, "/comparar?a1=Los%20Piratas&a2=La%20Trinchera").await;
        assert!(html.contains("Agrupación desconocida"));
    }

    #[tokio::test]
    async fn estadisticas_fetches_basic_once_and_advanced_every_time() {
        let (base, contadores) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/estadisticas").await;
        assert!(html.contains("Letras por año"));
        assert!(html.contains("width:100.0%"));
        assert_eq!(contadores.basicas.load(Ordering::SeqCst), 1);
        assert_eq!(contadores.avanzadas.load(Ordering::SeqCst), 1);
        get_html(&router, "/estadisticas").await;
        assert_eq!(contadores.basicas.load(Ordering::SeqCst), 1);
        assert_eq!(contadores.avanzadas.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cronologia_caches_and_highlights_busy_years() {
        let (base, contadores) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/cronologia").await;
        assert!(html.contains("highlight"));
        assert!(html.contains("/explorar?anio=1998"));
        // Only three representative group tags even when the server sends more.
        assert!(!html.contains("Más"));
        get_html(&router, "/cronologia").await;
        assert_eq!(contadores.timeline.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn buscar_empty_query_never_hits_the_service() {
        let (base, contadores) = stub_api().await;
        let router = app(&base).await;
        get_html(&router, "/buscar").await;
        get_html(&router, "/buscar?q=%20%20").await;
        assert_eq!(contadores.buscar.load(Ordering::SeqCst), 0);
        let html = get_html(&router, "/buscar?q=bah%C3%ADa").await;
        assert_eq!(contadores.buscar.load(Ordering::SeqCst), 1);
        assert!(html.contains("1 resultados para"));
        assert!(html.contains("<mark>bahía</mark>"));
    }

    #[tokio::test]
    async fn descubrir_links_terms_to_search() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/descubrir").await;
        assert!(html.contains("/buscar?q=carnaval"));
        assert!(html.contains("font-size:2.50rem"));
        assert!(html.contains("font-size:0.70rem"));
    }

    #[tokio::test]
    async fn poetica_shows_notice_when_nothing_analyzed() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/poetica").await;
        assert!(html.contains("No hay letras analizadas aún"));
    }

    #[tokio::test]
    async fn poetica_analizar_renders_dashboard_from_fresh_analysis() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let response = router
            .clone()
            .oneshot(
                Request::post("/poetica/analizar")
                    .header(
                        header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(Body::from("modalidad=Comparsa&anio=&tipo_pieza="))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Letras analizadas"));
        assert!(html.contains("42"));
        // Figure KPI keeps only the first word of the figure label.
        assert!(html.contains("anáfora"));
        assert!(html.contains("Letras con mayor score poético"));
    }

    #[tokio::test]
    async fn aleatorio_truncates_long_previews() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let html = get_html(&router, "/aleatorio").await;
        assert!(html.contains("Pregón largo"));
        assert!(html.contains("..."));
        assert!(html.contains("Ver completa"));
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (base, _) = stub_api().await;
        let router = app(&base).await;
        let response = router
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload["status"], "ok");
    }
}
