use std::io::{self, Write};

use anyhow::{Context, Result};

use wolf_core::Outcome;
use wolf_engine::refine::{refine_or_local, Refiner};
use wolf_engine::{Engine, PredictionResult};

use crate::display::{display_history, display_prediction};
use crate::import::parse_values;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Add,
    Predict,
    History,
    Undo,
    Clear,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "ajouter" | "add" | "a" => Some(InteractiveCommand::Add),
        "2" | "predire" | "prédire" | "predict" | "pred" => Some(InteractiveCommand::Predict),
        "3" | "historique" | "history" | "hist" => Some(InteractiveCommand::History),
        "4" | "annuler" | "undo" => Some(InteractiveCommand::Undo),
        "5" | "vider" | "clear" => Some(InteractiveCommand::Clear),
        "6" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu() {
    println!();
    println!("── Mode interactif ──");
    println!("  1. ajouter    Ajouter des tirages (ex: 3 8 0)");
    println!("  2. predire    Prédire le prochain tirage");
    println!("  3. historique Tirages de la session");
    println!("  4. annuler    Retirer le dernier tirage");
    println!("  5. vider      Repartir de zéro");
    println!("  6. quitter    Quitter");
    println!();
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        anyhow::bail!("Fin de l'entrée");
    }
    Ok(input.trim().to_string())
}

/// Historique en mémoire d'une session. Rien n'est sauvegardé.
struct Session<'a> {
    engine: &'a Engine,
    history: Vec<Outcome>,
    next_id: u64,
}

impl<'a> Session<'a> {
    fn new(engine: &'a Engine, history: Vec<Outcome>) -> Self {
        let next_id = history.last().map_or(1, |o| o.sequence_id + 1);
        Self {
            engine,
            history,
            next_id,
        }
    }

    fn add(&mut self, input: &str) -> Result<usize> {
        let values = parse_values(input)?;
        let palette = &self.engine.config().palette;
        // Validation complète avant d'ajouter quoi que ce soit
        let outcomes = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Outcome::classify(self.next_id + i as u64, v, palette))
            .collect::<Result<Vec<_>, _>>()?;
        self.next_id += outcomes.len() as u64;
        let added = outcomes.len();
        self.history.extend(outcomes);
        Ok(added)
    }

    fn undo(&mut self) -> Option<Outcome> {
        let removed = self.history.pop();
        if let Some(o) = &removed {
            self.next_id = o.sequence_id;
        }
        removed
    }

    fn clear(&mut self) {
        self.history.clear();
        self.next_id = 1;
    }

    fn predict(&self, refiner: Option<&dyn Refiner>) -> Result<PredictionResult> {
        let local = self.engine.predict(&self.history)?;
        Ok(match refiner {
            Some(r) => refine_or_local(r, self.engine.window(&self.history), local),
            None => local,
        })
    }
}

pub fn run_interactive(engine: &Engine, initial: Vec<Outcome>, refiner: Option<&dyn Refiner>) -> Result<()> {
    println!("Bienvenue dans le mode interactif de wolf !");
    let mut session = Session::new(engine, initial);
    if !session.history.is_empty() {
        println!("{} tirages chargés.", session.history.len());
    }

    loop {
        display_menu();
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Add) => {
                let values = match prompt("Valeurs (0-9, de la plus ancienne à la plus récente) : ") {
                    Ok(s) => s,
                    Err(_) => break,
                };
                match session.add(&values) {
                    Ok(n) => println!("{} tirage(s) ajouté(s), {} au total.", n, session.history.len()),
                    Err(e) => println!("Erreur: {e:#}"),
                }
            }
            Some(InteractiveCommand::Predict) => match session.predict(refiner) {
                Ok(result) => display_prediction(&result),
                Err(e) => println!("Erreur: {e:#}"),
            },
            Some(InteractiveCommand::History) => display_history(&session.history),
            Some(InteractiveCommand::Undo) => match session.undo() {
                Some(o) => println!("Tirage {} ({}) retiré.", o.sequence_id, o.value),
                None => println!("Historique vide."),
            },
            Some(InteractiveCommand::Clear) => {
                session.clear();
                println!("Historique vidé.");
            }
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro (1-6) ou un nom de commande.", input);
            }
        }
    }

    Ok(())
}
