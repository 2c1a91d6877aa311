//! Typed client for the remote lyrics-corpus JSON API.
//!
//! The service reports logical failures as an `{"error": "..."}` payload,
//! often with a 200 status, so every response is probed for that shape
//! before the real decode.

use crate::model::{
    AnalisisPoetico, Comparacion, CorpusPoetico, Cronologia, Estadisticas,
    EstadisticasAvanzadas, EstadisticasPoeticas, Filtros, Letra, PaginaLetras,
    PalabrasFrecuentes, PeticionCorpus, RespuestaBusqueda, RespuestaTematica,
};
use crate::view::{Filtro, encode_component};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with its own `{error}` payload. Carried verbatim
    /// so panels can surface the server's wording.
    #[error("{0}")]
    Service(String),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct ErrorProbe {
    error: Option<String>,
}

/// Client for the corpus service. Cheap to clone; all methods are read-only
/// except [`CorpusClient::analizar_corpus`], which asks the server to run a
/// batch analysis.
#[derive(Clone)]
pub struct CorpusClient {
    client: reqwest::Client,
    base_url: String,
}

impl CorpusClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn estadisticas(&self) -> Result<Estadisticas, ApiError> {
        self.get_json("/api/estadisticas").await
    }

    pub async fn estadisticas_avanzadas(&self) -> Result<EstadisticasAvanzadas, ApiError> {
        self.get_json("/api/estadisticas_avanzadas").await
    }

    /// Values available for the filter selects.
    pub async fn filtros(&self) -> Result<Filtros, ApiError> {
        self.get_json("/api/filtros").await
    }

    /// One page of the listing. Only non-empty filters reach the wire.
    pub async fn letras(
        &self,
        filtro: &Filtro,
        page: u32,
        per_page: u32,
    ) -> Result<PaginaLetras, ApiError> {
        self.get_json(&format!(
            "/api/letras?{}",
            filtro.query_string(page, per_page)
        ))
        .await
    }

    pub async fn letra(&self, id: i64) -> Result<Letra, ApiError> {
        self.get_json(&format!("/api/letra/{id}")).await
    }

    pub async fn buscar(&self, query: &str) -> Result<RespuestaBusqueda, ApiError> {
        self.get_json(&format!("/api/buscar?q={}", encode_component(query)))
            .await
    }

    pub async fn buscar_tematica(&self, tema: &str) -> Result<RespuestaTematica, ApiError> {
        self.get_json(&format!(
            "/api/buscar_tematica?q={}",
            encode_component(tema)
        ))
        .await
    }

    pub async fn comparar(&self, a1: &str, a2: &str) -> Result<Comparacion, ApiError> {
        self.get_json(&format!(
            "/api/comparar?a1={}&a2={}",
            encode_component(a1),
            encode_component(a2)
        ))
        .await
    }

    pub async fn aleatorio(&self, modalidad: Option<&str>) -> Result<Letra, ApiError> {
        self.get_json(&with_modalidad("/api/aleatorio", modalidad))
            .await
    }

    pub async fn palabras_frecuentes(
        &self,
        modalidad: Option<&str>,
    ) -> Result<PalabrasFrecuentes, ApiError> {
        self.get_json(&with_modalidad("/api/palabras_frecuentes", modalidad))
            .await
    }

    pub async fn timeline(&self) -> Result<Cronologia, ApiError> {
        self.get_json("/api/timeline").await
    }

    /// Corpus-wide poetic statistics persisted by a previous batch run.
    /// `total_analizadas == 0` means nothing has been analyzed yet.
    pub async fn estadisticas_poeticas(&self) -> Result<EstadisticasPoeticas, ApiError> {
        self.get_json("/api/estadisticas_poeticas").await
    }

    /// Triggers an on-demand batch analysis over a filtered sample.
    pub async fn analizar_corpus(
        &self,
        peticion: &PeticionCorpus,
    ) -> Result<CorpusPoetico, ApiError> {
        let url = format!("{}/api/analizar_corpus", self.base_url);
        let response = self.client.post(&url).json(peticion).send().await?;
        decode(response).await
    }

    pub async fn analisis_poetico(&self, id: i64) -> Result<AnalisisPoetico, ApiError> {
        self.get_json(&format!("/api/analisis_poetico/{id}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

fn with_modalidad(path: &str, modalidad: Option<&str>) -> String {
    match modalidad {
        Some(m) if !m.trim().is_empty() => {
            format!("{path}?modalidad={}", encode_component(m.trim()))
        }
        _ => path.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if let Ok(probe) = serde_json::from_slice::<ErrorProbe>(&bytes) {
        if let Some(error) = probe.error {
            return Err(ApiError::Service(error));
        }
    }
    if !status.is_success() {
        return Err(ApiError::Status(status));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::RawQuery;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capturas {
        query: Arc<Mutex<String>>,
        body: Arc<Mutex<serde_json::Value>>,
    }

    async fn stub_server() -> (CorpusClient, Capturas) {
        let capturas = Capturas::default();
        let router = Router::new()
            .route(
                "/api/letras",
                get({
                    let capturas = capturas.clone();
                    move |RawQuery(query): RawQuery| async move {
                        *capturas.query.lock() = query.unwrap_or_default();
                        Json(json!({
                            "letras": [{"id": 1, "titulo": "La bahía"}],
                            "total": 1, "page": 1, "total_pages": 1
                        }))
                    }
                }),
            )
            .route(
                "/api/letra/7",
                get(|| async { Json(json!({"error": "letra no encontrada"})) }),
            )
            .route(
                "/api/timeline",
                get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/api/analizar_corpus",
                post({
                    let capturas = capturas.clone();
                    move |Json(body): Json<serde_json::Value>| async move {
                        *capturas.body.lock() = body;
                        Json(json!({"total_analizadas": 3, "score_medio": 41.0}))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let client =
            CorpusClient::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        (client, capturas)
    }

    #[tokio::test]
    async fn letras_sends_filters_and_pagination() {
        let (client, capturas) = stub_server().await;
        let filtro = Filtro::new(Some("2001"), None, None, Some("Los Piratas"));
        let pagina = client.letras(&filtro, 2, 50).await.unwrap();
        assert_eq!(pagina.letras[0].titulo, "La bahía");
        assert_eq!(
            *capturas.query.lock(),
            "anio=2001&agrupacion=Los%20Piratas&page=2&per_page=50"
        );
    }

    #[tokio::test]
    async fn service_error_payload_maps_to_service_even_on_200() {
        let (client, _) = stub_server().await;
        match client.letra(7).await {
            Err(ApiError::Service(mensaje)) => assert_eq!(mensaje, "letra no encontrada"),
            otro => panic!("expected service error, got {otro:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_without_error_payload_maps_to_status() {
        let (client, _) = stub_server().await;
        match client.timeline().await {
            Err(ApiError::Status(status)) => assert_eq!(status.as_u16(), 500),
            otro => panic!("expected status error, got {otro:?}"),
        }
    }

    #[tokio::test]
    async fn analizar_corpus_keeps_empty_filters_off_the_wire() {
        let (client, capturas) = stub_server().await;
        let peticion = PeticionCorpus {
            modalidad: Some("Comparsa".to_string()),
            anio: None,
            tipo_pieza: None,
            limit: 300,
        };
        let corpus = client.analizar_corpus(&peticion).await.unwrap();
        assert_eq!(corpus.total_analizadas, 3);
        let enviado = capturas.body.lock().clone();
        assert_eq!(enviado["modalidad"], "Comparsa");
        assert_eq!(enviado["limit"], 300);
        assert!(enviado.get("anio").is_none());
        assert!(enviado.get("tipo_pieza").is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client =
            CorpusClient::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
