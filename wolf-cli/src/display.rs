use comfy_table::{presets::UTF8_FULL, Cell, Color as TermColor, ContentArrangement, Table};

use wolf_core::{Color, Outcome, Palette, Size};
use wolf_engine::engine::backtest::BacktestReport;
use wolf_engine::{EngineConfig, PredictionResult, Source};

use crate::import::ImportResult;

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Red => TermColor::Red,
        Color::Green => TermColor::Green,
        Color::Violet => TermColor::Magenta,
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_history(history: &[Outcome]) {
    if history.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Valeur", "Couleur", "Taille"]);
    // Le plus récent en haut, comme sur l'écran du jeu
    for o in history.iter().rev() {
        table.add_row(vec![
            Cell::new(o.sequence_id),
            Cell::new(o.value),
            Cell::new(o.color).fg(term_color(o.color)),
            Cell::new(o.size),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Retenus           : {}", result.history.len());
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_classification(value: u8, color: Color, size: Size, palette: &Palette) {
    let mut table = new_table(vec!["Valeur", "Couleur", "Taille", "Chiffres de la couleur"]);
    let digits = palette
        .digits_of(color)
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    table.add_row(vec![
        Cell::new(value),
        Cell::new(color).fg(term_color(color)),
        Cell::new(size),
        Cell::new(digits),
    ]);
    println!("{table}");
}

pub fn display_prediction(result: &PredictionResult) {
    println!("\n🐺 Prochain tirage\n");

    let mut table = new_table(vec!["Dimension", "Choix", "Confiance", "Scores"]);
    let color_scores = result
        .color_scores
        .iter()
        .map(|(c, s)| format!("{} {:.1}", c, s))
        .collect::<Vec<_>>()
        .join(" · ");
    let size_scores = result
        .size_scores
        .iter()
        .map(|(s, v)| format!("{} {:.1}", s, v))
        .collect::<Vec<_>>()
        .join(" · ");
    table.add_row(vec![
        Cell::new("Couleur"),
        Cell::new(result.color).fg(term_color(result.color)),
        Cell::new(format!("{}%", result.color_confidence)),
        Cell::new(color_scores),
    ]);
    table.add_row(vec![
        Cell::new("Taille"),
        Cell::new(result.size),
        Cell::new(format!("{}%", result.size_confidence)),
        Cell::new(size_scores),
    ]);
    println!("{table}");

    let origin = match result.source {
        Source::Local => "local",
        Source::Refined => "raffiné",
    };
    println!("Confiance globale : {}% ({})", result.confidence, origin);
    if result.degraded {
        println!("⚠ Historique trop courte : choix par défaut.");
    }

    if !result.rationale.is_empty() {
        println!("\nMotifs détectés :");
        for line in &result.rationale {
            println!("  • {}", line);
        }
    }
    println!("\nLa confiance mesure la force relative des motifs, ce n'est pas une probabilité.");
}

pub fn display_backtest(report: &BacktestReport) {
    if report.rounds == 0 {
        println!("Historique trop courte pour un backtest.");
        return;
    }

    println!("\n📈 Backtest walk-forward sur {} tirages\n", report.rounds);
    let mut table = new_table(vec!["", "Moteur", "Majorité", "Écart"]);
    let rows = [
        ("Couleur", report.color_rate(), report.baseline_color_rate(), report.color_hits),
        ("Taille", report.size_rate(), report.baseline_size_rate(), report.size_hits),
    ];
    for (label, engine, baseline, hits) in rows {
        let diff = engine - baseline;
        let color = if diff > 0.0 {
            TermColor::Green
        } else if diff < 0.0 {
            TermColor::Red
        } else {
            TermColor::White
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{:.1}% ({}/{})", engine * 100.0, hits, report.rounds)),
            Cell::new(format!("{:.1}%", baseline * 100.0)),
            Cell::new(format!("{:+.1} pts", diff * 100.0)).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_config(config: &EngineConfig) {
    let mut table = new_table(vec!["Paramètre", "Valeur"]);
    let w = &config.weights;
    let t = &config.thresholds;
    let rows = vec![
        ("Fenêtre", config.window.to_string()),
        ("Tirages minimum", config.min_required.to_string()),
        ("Confiance plancher", format!("{}%", config.low_data_confidence)),
        (
            "Poids (série/retard/fréq/alt/rare)",
            format!("{} / {} / {} / {} / {}", w.streak, w.gap, w.freq, w.alt, w.rare),
        ),
        (
            "Série",
            format!("min {} · pas {} · plafond ×{}", t.streak_min, t.streak_step, t.streak_cap),
        ),
        ("Retard", format!("min {} · pas {} · plafond ×{}", t.gap_min, t.gap_step, t.gap_cap)),
        ("Ratio de fréquence", t.freq_ratio.to_string()),
        ("Plancher de rareté", t.rare_floor.to_string()),
        ("Confiance", format!("{:?}", config.confidence)),
        ("Repli", format!("{:?}", config.fallback)),
        ("Graine", config.seed.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value]);
    }
    println!("{table}");

    let mut palette = new_table(vec!["Couleur", "Chiffres"]);
    for color in Color::ALL {
        let digits = config
            .palette
            .digits_of(color)
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        palette.add_row(vec![Cell::new(color).fg(term_color(color)), Cell::new(digits)]);
    }
    println!("{palette}");
}
