use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use wolf_core::{Outcome, Palette};

static PERIOD_AND_RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{10,15})[\s|:\-]*(\d)\b").expect("regex valide"));
static LONG_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8,}").expect("regex valide"));
static PERIOD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8,15})[^\d]*?(\d)\s*$").expect("regex valide"));
static TRAILING_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d)\s*$").expect("regex valide"));
static PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{8,})").expect("regex valide"));
static CLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2}:\d{2}").expect("regex valide"));
static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("regex valide"));
static SINGLE_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([0-9])\b").expect("regex valide"));

/// Nombre maximal de chiffres retenus par le dernier repli.
const MAX_LOOSE_DIGITS: usize = 20;

pub struct ImportResult {
    pub history: Vec<Outcome>,
    pub total_records: u32,
    pub skipped: u32,
    pub errors: u32,
}

fn parse_record(record: &csv::StringRecord, palette: &Palette) -> Result<Outcome> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let round = get(0)?;
    let sequence_id: u64 = round
        .parse()
        .with_context(|| format!("Impossible de parser le tirage '{}'", round))?;
    let raw = get(1)?;
    let value: u8 = raw
        .parse()
        .with_context(|| format!("Impossible de parser la valeur '{}'", raw))?;

    Ok(Outcome::classify(sequence_id, value, palette)?)
}

/// CSV `round;value` avec en-tête. Les couleurs sont toujours recalculées via
/// la palette ; l'historique est trié par tirage croissant.
pub fn import_csv(path: &Path, palette: &Palette) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut result = ImportResult {
        history: Vec::new(),
        total_records: 0,
        skipped: 0,
        errors: 0,
    };
    let mut seen = HashSet::new();

    for record_result in reader.records() {
        result.total_records += 1;
        match record_result.map_err(anyhow::Error::from).and_then(|r| parse_record(&r, palette)) {
            Ok(outcome) => {
                if seen.insert(outcome.sequence_id) {
                    result.history.push(outcome);
                } else {
                    result.skipped += 1;
                }
            }
            Err(e) => {
                warn!("Erreur ligne {}: {:#}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    result.history.sort_by_key(|o| o.sequence_id);
    Ok(result)
}

/// Valeurs séparées par des virgules ou des espaces, de la plus ancienne à la plus récente.
pub fn parse_values(input: &str) -> Result<Vec<u8>> {
    let values = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .with_context(|| format!("Valeur invalide : '{}'", s))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        bail!("Aucune valeur fournie");
    }
    Ok(values)
}

/// Tirage lu à l'écran, avec sa position dans le texte.
struct ScreenRow {
    pos: usize,
    round: u64,
    value: u8,
}

/// Lignes non vides avec leur décalage dans le texte d'origine.
fn positioned_lines(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            lines.push((offset, trimmed));
        }
        offset += raw.len() + 1;
    }
    lines
}

/// Extraction des tirages depuis le texte brut d'un OCR de capture d'écran.
/// L'écran liste le plus récent en premier : l'ordre final suit la position à
/// l'écran, inversée, jamais les identifiants (un numéro de période mal lu ne
/// doit pas déplacer son tirage). `counter` sert à fabriquer des identifiants
/// décroissants quand aucun numéro de période n'est lisible.
pub fn parse_ocr_text(text: &str, palette: &Palette, counter: u64) -> Result<Vec<Outcome>> {
    let lines = positioned_lines(text);
    let mut rows: Vec<ScreenRow> = Vec::new();
    let known = |rows: &[ScreenRow], round: u64| rows.iter().any(|r| r.round == round);

    // 1. "20241125010123 | 5"
    for cap in PERIOD_AND_RESULT.captures_iter(text) {
        if let (Ok(round), Ok(value)) = (cap[1].parse::<u64>(), cap[2].parse::<u8>()) {
            let pos = cap.get(0).map_or(0, |m| m.start());
            rows.push(ScreenRow { pos, round, value });
        }
    }
    debug!(found = rows.len(), "ocr : motif période + résultat");

    // 2. Lignes avec un long numéro terminées par un chiffre
    if rows.len() < 5 {
        for &(pos, line) in lines.iter().filter(|(_, l)| LONG_NUMBER.is_match(l)) {
            if let Some(cap) = PERIOD_LINE.captures(line) {
                if let (Ok(round), Ok(value)) = (cap[1].parse::<u64>(), cap[2].parse::<u8>()) {
                    if !known(&rows, round) {
                        rows.push(ScreenRow { pos, round, value });
                    }
                }
            }
        }
        debug!(found = rows.len(), "ocr : lignes avec période");
    }

    // 3. Toute ligne terminée par un chiffre isolé
    if rows.len() < 5 {
        let digit_lines = lines.iter().filter(|(_, l)| TRAILING_DIGIT.is_match(l));
        for (idx, &(pos, line)) in digit_lines.enumerate() {
            let Some(cap) = TRAILING_DIGIT.captures(line) else {
                continue;
            };
            let Ok(value) = cap[1].parse::<u8>() else {
                continue;
            };
            let round = PERIOD
                .captures(line)
                .and_then(|p| p[1].parse::<u64>().ok())
                .unwrap_or_else(|| counter.saturating_sub(idx as u64));
            if !known(&rows, round) {
                rows.push(ScreenRow { pos, round, value });
            }
        }
        debug!(found = rows.len(), "ocr : lignes terminées par un chiffre");
    }

    // 4. Tous les chiffres isolés, heures et dates retirées
    if rows.len() < 3 {
        let cleaned = CLOCK.replace_all(text, "");
        let cleaned = DATE.replace_all(&cleaned, "");
        let loose: Vec<ScreenRow> = SINGLE_DIGIT
            .captures_iter(&cleaned)
            .filter_map(|c| {
                let pos = c.get(0).map_or(0, |m| m.start());
                c[1].parse::<u8>().ok().map(|value| (pos, value))
            })
            .take(MAX_LOOSE_DIGITS)
            .enumerate()
            .map(|(i, (pos, value))| ScreenRow {
                pos,
                round: counter.saturating_sub(i as u64),
                value,
            })
            .collect();
        if !loose.is_empty() {
            rows = loose;
        }
        debug!(found = rows.len(), "ocr : chiffres isolés");
    }

    if rows.is_empty() {
        bail!("Aucun chiffre (0-9) trouvé dans le texte. Recadrez la capture sur les résultats.");
    }

    // Même période lue deux fois : la dernière valeur l'emporte, à la place
    // de la première occurrence.
    let mut unique: Vec<ScreenRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match unique.iter_mut().find(|u| u.round == row.round) {
            Some(existing) => existing.value = row.value,
            None => unique.push(row),
        }
    }
    unique.sort_by_key(|r| r.pos);

    unique
        .iter()
        .rev()
        .map(|r| Outcome::classify(r.round, r.value, palette).map_err(anyhow::Error::from))
        .collect()
}

/// Compteur de repli dérivé de l'horloge, comme les identifiants de période.
pub fn fallback_counter() -> u64 {
    (chrono::Utc::now().timestamp_millis().unsigned_abs()) % 100_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn values(history: &[Outcome]) -> Vec<u8> {
        history.iter().map(|o| o.value).collect()
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_values("2,4, 6 8").unwrap(), vec![2, 4, 6, 8]);
        assert!(parse_values("").is_err());
        assert!(parse_values("1,x").is_err());
    }

    #[test]
    fn test_ocr_structured_periods() {
        let text = "20241125010127 | 3\n20241125010126 | 8\n20241125010125 | 0\n\
                    20241125010124 | 5\n20241125010123 | 1\n";
        let history = parse_ocr_text(text, &Palette::standard(), 1000).unwrap();
        assert_eq!(history.len(), 5);
        // trié du plus ancien au plus récent
        assert_eq!(history[0].sequence_id, 20241125010123);
        assert_eq!(values(&history), vec![1, 5, 0, 8, 3]);
    }

    #[test]
    fn test_ocr_period_line_fallback() {
        // Numéros de période de 9 chiffres : le motif 1 ne les voit pas
        let text = "Period Number Result\n202411251 Big 7\n202411250 Small 2\n202411249 Big 9\n";
        let history = parse_ocr_text(text, &Palette::standard(), 1000).unwrap();
        assert_eq!(values(&history), vec![9, 2, 7]);
        assert_eq!(history[2].sequence_id, 202411251);
    }

    #[test]
    fn test_ocr_trailing_digit_lines() {
        let text = "Résultat 4\nRésultat 6\nRésultat 1\n";
        let history = parse_ocr_text(text, &Palette::standard(), 500).unwrap();
        // ids synthétiques 500, 499, 498 : le premier affiché est le plus récent
        assert_eq!(history.iter().map(|o| o.sequence_id).collect::<Vec<_>>(), vec![498, 499, 500]);
        assert_eq!(values(&history), vec![1, 6, 4]);
    }

    #[test]
    fn test_ocr_loose_digits_strip_times_and_dates() {
        let text = "2024-11-25 12:30 3 7 1";
        let history = parse_ocr_text(text, &Palette::standard(), 100).unwrap();
        assert_eq!(values(&history), vec![1, 7, 3]);
    }

    #[test]
    fn test_ocr_misread_period_keeps_screen_order() {
        // La 2e ligne a un numéro de période abîmé (O au lieu de 0) : elle
        // reçoit un autre identifiant mais garde sa place à l'écran.
        let text = "20241125010127 | 3\n2O24112501O126 Small 8\n20241125010125 | 0\n20241125010124 | 6";
        let history = parse_ocr_text(text, &Palette::standard(), 1000).unwrap();
        assert_eq!(values(&history), vec![6, 0, 8, 3]);
        assert_eq!(history[3].sequence_id, 20241125010127);
    }

    #[test]
    fn test_ocr_synthetic_ids_do_not_reorder() {
        // Seule la ligne du milieu n'a pas de période lisible
        let text = "20241125010127 | 3\nrésultat 8\n20241125010125 | 0\n";
        let history = parse_ocr_text(text, &Palette::standard(), 500).unwrap();
        assert_eq!(values(&history), vec![0, 8, 3]);
    }

    #[test]
    fn test_ocr_duplicate_period_keeps_last_value() {
        let text = "20241125010127 | 3\n20241125010126 | 8\n20241125010127 | 5\n\
                    20241125010125 | 0\n20241125010124 | 6\n20241125010123 | 1\n";
        let history = parse_ocr_text(text, &Palette::standard(), 1000).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(values(&history), vec![1, 6, 0, 8, 5]);
        assert_eq!(history[4].sequence_id, 20241125010127);
    }

    #[test]
    fn test_ocr_nothing_found() {
        assert!(parse_ocr_text("aucun résultat", &Palette::standard(), 100).is_err());
    }

    #[test]
    fn test_import_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "round;value").unwrap();
        writeln!(file, "103;5").unwrap();
        writeln!(file, "101;2").unwrap();
        writeln!(file, "102;12").unwrap();
        writeln!(file, "101;7").unwrap();
        writeln!(file, "104;8").unwrap();
        let result = import_csv(file.path(), &Palette::standard()).unwrap();
        assert_eq!(result.total_records, 5);
        assert_eq!(result.errors, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(values(&result.history), vec![2, 5, 8]);
    }
}
