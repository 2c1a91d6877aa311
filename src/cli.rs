use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use cancionero_rs::api::CorpusClient;
use cancionero_rs::model::{Letra, ResultadoBusqueda};
use cancionero_rs::view;
use cancionero_rs::web::{self, WebConfig};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cancionero-rs", about = "Explora el cancionero del Carnaval", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Base URL of the corpus API service.
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    api_base: String,

    /// Request timeout in seconds for corpus API calls.
    #[arg(long, global = true, default_value_t = 30)]
    api_timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the browsing interface over HTTP.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Show one lyric by its ID.
    Letra {
        id: i64,
    },
    /// Full-text search over the whole corpus.
    Buscar {
        query: String,
        /// Use the thematic search endpoint instead of plain full-text.
        #[arg(long)]
        tematica: bool,
        /// Maximum number of hits to print.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Fetch a random lyric, optionally scoped to one modality.
    Aleatoria {
        #[arg(long)]
        modalidad: Option<String>,
    },
    /// Corpus-wide totals and per-dimension breakdowns.
    Stats,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let client = CorpusClient::new(cli.api_base.clone(), Duration::from_secs(cli.api_timeout))?;
    match cli.command {
        Command::Serve { addr } => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(
                    EnvFilter::builder()
                        .with_default_directive(LevelFilter::INFO.into())
                        .with_env_var("RUST_LOG")
                        .from_env_lossy(),
                )
                .try_init()?;
            web::serve(WebConfig {
                addr,
                api_base: cli.api_base,
                api_timeout: Duration::from_secs(cli.api_timeout),
            })
            .await?;
            Ok(())
        }
        Command::Letra { id } => handle_letra(&client, id, cli.json).await,
        Command::Buscar {
            query,
            tematica,
            limit,
        } => handle_buscar(&client, &query, tematica, limit, cli.json).await,
        Command::Aleatoria { modalidad } => {
            handle_aleatoria(&client, modalidad.as_deref(), cli.json).await
        }
        Command::Stats => handle_stats(&client, cli.json).await,
    }
}

async fn handle_letra(client: &CorpusClient, id: i64, as_json: bool) -> Result<(), Box<dyn Error>> {
    let letra = client.letra(id).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&letra)?);
    } else {
        print_letra(&letra, None);
    }
    Ok(())
}

async fn handle_buscar(
    client: &CorpusClient,
    query: &str,
    tematica: bool,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("la consulta no puede estar vacía".into());
    }
    let limit = limit.max(1);
    let (total, consulta, mut resultados) = if tematica {
        let respuesta = client.buscar_tematica(query.trim()).await?;
        let consulta = respuesta
            .query_original
            .clone()
            .unwrap_or_else(|| query.trim().to_string());
        (respuesta.total, consulta, respuesta.resultados)
    } else {
        let respuesta = client.buscar(query.trim()).await?;
        let consulta = respuesta
            .query
            .clone()
            .unwrap_or_else(|| query.trim().to_string());
        (respuesta.total, consulta, respuesta.resultados)
    };
    resultados.truncate(limit);

    if as_json {
        let payload = serde_json::json!({
            "query": consulta,
            "total": total,
            "resultados": resultados,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_resultados(total, &consulta, &resultados);
    }
    Ok(())
}

async fn handle_aleatoria(
    client: &CorpusClient,
    modalidad: Option<&str>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let letra = client.aleatorio(modalidad).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&letra)?);
    } else {
        print_letra(&letra, Some(500));
    }
    Ok(())
}

async fn handle_stats(client: &CorpusClient, as_json: bool) -> Result<(), Box<dyn Error>> {
    let stats = client.estadisticas().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Letras:       {}", view::numero_es(stats.total_letras));
    println!("Años:         {}", stats.total_anios);
    println!("Modalidades:  {}", stats.total_modalidades);
    println!("Agrupaciones: {}", view::numero_es(stats.total_agrupaciones));
    if !stats.por_modalidad.is_empty() {
        println!("\nPor modalidad:");
        for fila in &stats.por_modalidad {
            println!("- {}: {}", fila.modalidad, view::numero_es(fila.cantidad));
        }
    }
    if !stats.por_tipo_pieza.is_empty() {
        println!("\nPor tipo de pieza:");
        for fila in &stats.por_tipo_pieza {
            println!("- {}: {}", fila.tipo, view::numero_es(fila.cantidad));
        }
    }
    Ok(())
}

fn print_letra(letra: &Letra, preview_chars: Option<usize>) {
    println!("Letra: {} (ID {})", letra.titulo, letra.id);
    let mut meta = Vec::new();
    if let Some(anio) = letra.anio {
        meta.push(anio.to_string());
    }
    if let Some(modalidad) = &letra.modalidad {
        meta.push(modalidad.clone());
    }
    if let Some(tipo) = &letra.tipo_pieza {
        meta.push(tipo.clone());
    }
    if let Some(agrupacion) = &letra.agrupacion {
        meta.push(agrupacion.clone());
    }
    if !meta.is_empty() {
        println!("{}", meta.join(" · "));
    }
    if let Some(autor) = &letra.autor {
        println!("Autor: {autor}");
    }
    if let Some(score) = letra.score_poetico.filter(|s| *s > 0) {
        let mut poetica = format!("Score poético: {score}/100");
        if let Some(metro) = &letra.nombre_metro {
            poetica.push_str(&format!(" · {metro}"));
        }
        if let Some(rima) = &letra.tipo_rima {
            poetica.push_str(&format!(" · rima {rima}"));
        }
        println!("{poetica}");
    }
    if let Some(contenido) = &letra.contenido {
        let texto = match preview_chars {
            Some(max) => view::truncar(contenido, max),
            None => contenido.clone(),
        };
        println!("\n{texto}");
    }
    if let Some(url) = &letra.url {
        println!("\nFuente: {url}");
    }
}

fn print_resultados(total: u64, consulta: &str, rows: &[ResultadoBusqueda]) {
    if rows.is_empty() {
        println!("No se encontraron resultados para \"{consulta}\".");
        return;
    }
    println!("{total} resultados para \"{consulta}\":");
    let width = rows
        .iter()
        .map(|r| r.titulo.chars().count())
        .max()
        .unwrap_or(6)
        .max("TITULO".len());
    println!("{:<width$}  {:>6}  {:>4}  {}", "TITULO", "ID", "AÑO", "MODALIDAD");
    println!("{:-<width$}  ------  ----  ---------", "");
    for fila in rows {
        let anio = fila
            .anio
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        let modalidad = fila.modalidad.as_deref().unwrap_or("-");
        println!(
            "{:<width$}  {:>6}  {:>4}  {}",
            fila.titulo, fila.id, anio, modalidad
        );
        if let Some(fragmento) = &fila.fragmento {
            let plano = fragmento.replace("<mark>", "").replace("</mark>", "");
            println!("    …{}…", plano.trim());
        }
    }
}
