/// Content Linter: checks a content directory against what the engine's
/// transition tables expect.
///
/// Usage: content_linter <content_dir> [--strict]

use clap::Parser;
use oscity_engine::config::EngineConfig;
use oscity_engine::core::content::{DialogueBook, QuestionBank};
use oscity_engine::core::engine::ProgressionEngine;
use oscity_engine::core::manifest::ContentManifest;
use oscity_engine::schema::journey::JourneyCatalog;
use oscity_engine::schema::player::Vars;
use oscity_engine::schema::region::WorldLayout;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "content_linter", about = "Validate OS City content files")]
struct Args {
    /// Directory holding dialogue.ron, questions.ron, world.ron and config.ron
    content_dir: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,
}

#[derive(Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    if !args.content_dir.is_dir() {
        eprintln!("ERROR: '{}' is not a directory", args.content_dir.display());
        process::exit(1);
    }

    let mut report = Report::default();
    let dialogue = load(&args.content_dir, "dialogue.ron", DialogueBook::load_from_ron, &mut report);
    let questions = load(&args.content_dir, "questions.ron", QuestionBank::load_from_ron, &mut report);
    let world = load(&args.content_dir, "world.ron", WorldLayout::load_from_ron, &mut report);
    let config_path = args.content_dir.join("config.ron");
    if config_path.exists() {
        if let Err(e) = EngineConfig::load_from_ron(&config_path) {
            report.errors.push(format!("config.ron: {}", e));
        }
    }

    if let Err(e) = ProgressionEngine::builder().content_dir(&args.content_dir).build() {
        report.errors.push(format!("engine does not build: {}", e));
    }

    let manifest = ContentManifest::build(&JourneyCatalog::standard());
    if let Some(dialogue) = &dialogue {
        println!("Loaded {} dialogue paths", dialogue.len());
        lint_dialogue(dialogue, &manifest, &mut report);
    }
    if let Some(questions) = &questions {
        println!("Loaded {} questions", questions.len());
        lint_questions(questions, &manifest, &mut report);
    }
    if let Some(world) = &world {
        println!("Loaded {} regions", world.regions.len());
        lint_world(world, &manifest, &mut report);
    }

    println!("\n=== Content Lint Report ===\n");
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }
    for error in &report.errors {
        println!("ERROR: {}", error);
    }
    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    let failed = !report.errors.is_empty() || (args.strict && !report.warnings.is_empty());
    process::exit(if failed { 1 } else { 0 });
}

fn load<T, E: std::fmt::Display>(
    dir: &Path,
    file: &str,
    loader: fn(&Path) -> Result<T, E>,
    report: &mut Report,
) -> Option<T> {
    let path = dir.join(file);
    if !path.exists() {
        report.errors.push(format!("{} is missing", file));
        return None;
    }
    match loader(&path) {
        Ok(value) => Some(value),
        Err(e) => {
            report.errors.push(format!("{}: {}", file, e));
            None
        }
    }
}

fn lint_dialogue(dialogue: &DialogueBook, manifest: &ContentManifest, report: &mut Report) {
    for path in &manifest.dialogue {
        if !dialogue.has_path(path) {
            report.errors.push(format!("dialogue path '{}' is missing", path));
        }
    }
    for path in &manifest.optional_dialogue {
        if !dialogue.has_path(path) {
            report
                .warnings
                .push(format!("dialogue path '{}' is missing; the guide falls back", path));
        }
    }

    let known: HashSet<&str> = manifest
        .dialogue
        .iter()
        .chain(&manifest.optional_dialogue)
        .map(String::as_str)
        .collect();
    let vars: HashSet<&str> = manifest.vars.iter().map(String::as_str).collect();

    let mut paths: Vec<&str> = dialogue.paths().collect();
    paths.sort_unstable();
    for path in paths {
        if !known.contains(path) {
            report.warnings.push(format!("dialogue path '{}' is never spoken", path));
        }
        let Some(lines) = dialogue.templates(path) else {
            continue;
        };
        if lines.is_empty() {
            report.warnings.push(format!("dialogue path '{}' has no lines", path));
        }
        for line in lines {
            for key in line.placeholders() {
                if !vars.contains(key) {
                    report
                        .errors
                        .push(format!("dialogue path '{}' uses unknown placeholder '{{{}}}'", path, key));
                }
            }
        }
    }
}

fn lint_questions(questions: &QuestionBank, manifest: &ContentManifest, report: &mut Report) {
    for path in &manifest.questions {
        if questions.get(path).is_none() {
            report.errors.push(format!("question '{}' is missing", path));
        }
    }

    let vars: HashSet<&str> = manifest.vars.iter().map(String::as_str).collect();
    let mut paths: Vec<&str> = questions.paths().collect();
    paths.sort_unstable();
    for path in paths {
        let Some(question) = questions.get(path) else {
            continue;
        };
        let templates = std::iter::once(&question.text)
            .chain(question.options.iter().map(|(_, t)| t))
            .chain([&question.correct, &question.wrong]);
        for template in templates {
            for key in template.placeholders() {
                if !vars.contains(key) {
                    report
                        .errors
                        .push(format!("question '{}' uses unknown placeholder '{{{}}}'", path, key));
                }
            }
        }
        if !question.options.is_empty() && question.correct.placeholders().next().is_none() {
            let expected = question.correct.render(&Vars::new());
            if !question
                .options
                .iter()
                .any(|(label, _)| label.eq_ignore_ascii_case(expected.trim()))
            {
                report
                    .warnings
                    .push(format!("question '{}' expects an answer that is not an option label", path));
            }
        }
    }
}

fn lint_world(world: &WorldLayout, manifest: &ContentManifest, report: &mut Report) {
    for title in &manifest.regions {
        if world.regions.by_title(title).is_none() {
            report.errors.push(format!("region '{}' is missing from the map", title));
        }
    }
    for region in world.regions.iter() {
        if !manifest.regions.contains(&region.title) {
            report
                .warnings
                .push(format!("region '{}' ({}) has no room rules", region.title, region.key));
        }
        if region.anchor.is_none() {
            report
                .warnings
                .push(format!("region '{}' has no guide anchor", region.title));
        }
    }

    let placed: HashSet<&str> = world.buttons.ids().collect();
    for button in &manifest.buttons {
        if !placed.contains(button.as_str()) {
            report.warnings.push(format!("button '{}' is not placed on the map", button));
        }
    }
    for button in &placed {
        if !manifest.buttons.iter().any(|b| b == button) {
            report.warnings.push(format!("button '{}' does nothing", button));
        }
    }

    for destination in &manifest.destinations {
        if !world.destinations.contains_key(destination) {
            report
                .errors
                .push(format!("teleport destination '{}' is missing", destination));
        }
    }
    for display in &manifest.displays {
        if !world.displays.contains_key(display) {
            report.warnings.push(format!("display '{}' is not placed on the map", display));
        }
    }
}
