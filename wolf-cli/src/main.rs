mod display;
mod import;
mod interactive;
mod remote;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use wolf_core::models::{classify, outcomes_from_values};
use wolf_core::Outcome;
use wolf_engine::config::{load_config, save_config};
use wolf_engine::engine::backtest::{steps, walk_forward};
use wolf_engine::refine::{refine_or_local, Refiner};
use wolf_engine::{Engine, EngineConfig};

use crate::display::{
    display_backtest, display_classification, display_config, display_history, display_import_summary,
    display_prediction,
};
use crate::remote::{HttpRefiner, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(name = "wolf", about = "Détection de motifs couleur/taille sur un historique de tirages 0-9")]
struct Cli {
    /// Fichier de configuration du moteur
    #[arg(short, long, global = true, default_value = "wolf.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Source de l'historique : une seule à la fois.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct SourceArgs {
    /// Fichier CSV `round;value`
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Texte brut issu d'un OCR de capture d'écran
    #[arg(long)]
    ocr: Option<PathBuf>,

    /// Valeurs de la plus ancienne à la plus récente (ex: 2,4,6,8,5)
    #[arg(long)]
    values: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Prédire la couleur et la taille du prochain tirage
    Predict {
        #[command(flatten)]
        source: SourceArgs,

        /// Seed pour le repli aléatoire
        #[arg(long)]
        seed: Option<u64>,

        /// URL du service de raffinement (optionnel)
        #[arg(long)]
        refine_url: Option<String>,

        /// Délai maximal du raffinement en millisecondes
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        refine_timeout_ms: u64,

        /// Sortie JSON au lieu des tableaux
        #[arg(long)]
        json: bool,
    },

    /// Afficher la couleur et la taille d'une valeur
    Classify {
        /// Valeur du tirage (0-9)
        value: u8,
    },

    /// Afficher l'historique importé
    History {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Rejouer le moteur tirage par tirage et comparer à la majorité
    Backtest {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Gérer le fichier de configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Session interactive en mémoire
    Interactive {
        #[command(flatten)]
        source: SourceArgs,

        /// URL du service de raffinement (optionnel)
        #[arg(long)]
        refine_url: Option<String>,

        /// Délai maximal du raffinement en millisecondes
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        refine_timeout_ms: u64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Écrire la configuration par défaut
    Init {
        /// Écraser un fichier existant
        #[arg(long)]
        force: bool,
    },
    /// Afficher la configuration effective
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wolf=info,wolf_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Predict {
            source,
            seed,
            refine_url,
            refine_timeout_ms,
            json,
        } => cmd_predict(&cli.config, &source, seed, refine_url.as_deref(), refine_timeout_ms, json),
        Command::Classify { value } => cmd_classify(&cli.config, value),
        Command::History { source } => cmd_history(&cli.config, &source),
        Command::Backtest { source } => cmd_backtest(&cli.config, &source),
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(&cli.config, force),
            ConfigAction::Show => cmd_config_show(&cli.config),
        },
        Command::Interactive {
            source,
            refine_url,
            refine_timeout_ms,
        } => cmd_interactive(&cli.config, &source, refine_url.as_deref(), refine_timeout_ms),
    }
}

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// Fichier absent → valeurs par défaut, avec le seed du jour.
fn resolve_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        let config = load_config(path)?;
        info!(path = %path.display(), "configuration chargée");
        Ok(config)
    } else {
        info!(path = %path.display(), "configuration absente, valeurs par défaut");
        Ok(EngineConfig {
            seed: date_seed(),
            ..EngineConfig::default()
        })
    }
}

fn load_history(source: &SourceArgs, config: &EngineConfig) -> Result<Vec<Outcome>> {
    let palette = &config.palette;
    if let Some(file) = &source.file {
        let result = import::import_csv(file, palette)?;
        display_import_summary(&result);
        return Ok(result.history);
    }
    if let Some(ocr) = &source.ocr {
        let text = std::fs::read_to_string(ocr)
            .with_context(|| format!("Impossible de lire {:?}", ocr))?;
        let history = import::parse_ocr_text(&text, palette, import::fallback_counter())?;
        info!(rounds = history.len(), "tirages extraits du texte OCR");
        return Ok(history);
    }
    if let Some(values) = &source.values {
        let values = import::parse_values(values)?;
        return Ok(outcomes_from_values(&values, palette)?);
    }
    bail!("Aucune source : utilisez --file, --ocr ou --values");
}

fn build_refiner(url: Option<&str>, timeout_ms: u64) -> Result<Option<HttpRefiner>> {
    url.map(|u| HttpRefiner::new(u, Duration::from_millis(timeout_ms)))
        .transpose()
}

fn cmd_predict(
    config_path: &Path,
    source: &SourceArgs,
    seed: Option<u64>,
    refine_url: Option<&str>,
    refine_timeout_ms: u64,
    json: bool,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(s) = seed {
        config.seed = s;
    }
    let history = load_history(source, &config)?;
    let engine = Engine::new(config)?;

    let local = engine.predict(&history)?;
    let result = match build_refiner(refine_url, refine_timeout_ms)? {
        Some(refiner) => refine_or_local(&refiner, engine.window(&history), local),
        None => local,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        display_prediction(&result);
    }
    Ok(())
}

fn cmd_classify(config_path: &Path, value: u8) -> Result<()> {
    let config = resolve_config(config_path)?;
    let (color, size) = classify(value, &config.palette)?;
    display_classification(value, color, size, &config.palette);
    Ok(())
}

fn cmd_history(config_path: &Path, source: &SourceArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let history = load_history(source, &config)?;
    display_history(&history);
    Ok(())
}

fn cmd_backtest(config_path: &Path, source: &SourceArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let history = load_history(source, &config)?;
    let engine = Engine::new(config)?;

    let pb = ProgressBar::new(steps(&engine, &history) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Template de progression invalide")?
            .progress_chars("=> "),
    );
    let report = walk_forward(&engine, &history, || pb.inc(1))?;
    pb.finish_and_clear();

    display_backtest(&report);
    Ok(())
}

fn cmd_config_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!("{:?} existe déjà (utilisez --force pour l'écraser)", config_path);
    }
    save_config(&EngineConfig::default(), config_path)?;
    println!("Configuration écrite dans {}", config_path.display());
    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    display_config(&config);
    Ok(())
}

fn cmd_interactive(
    config_path: &Path,
    source: &SourceArgs,
    refine_url: Option<&str>,
    refine_timeout_ms: u64,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let has_source = source.file.is_some() || source.ocr.is_some() || source.values.is_some();
    let initial = if has_source { load_history(source, &config)? } else { Vec::new() };
    let engine = Engine::new(config)?;
    let refiner = build_refiner(refine_url, refine_timeout_ms)?;
    interactive::run_interactive(&engine, initial, refiner.as_ref().map(|r| r as &dyn Refiner))
}
