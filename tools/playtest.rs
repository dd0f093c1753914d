/// Playtest: drive the engine from a terminal, one player, no front end.
///
/// Usage: playtest [--content <dir>] [--seed <n>] [--progress <file>]
///
/// Commands:
///   go <room>          enter a room by title or key (e.g. go ram)
///   walk <x> <y> <z>   stand at a block position
///   press <button>     press a button by id
///   say <text>         type a chat line
///   calc <text>        type into the calculator
///   guide              ask the guide for help
///   book               list journeys and what is unlocked
///   status             show phase, journey and pending prompt
///   help               list commands
///   quit               exit
///
/// Timers and teleports resolve instantly.

use clap::Parser;
use oscity_engine::config::EngineConfig;
use oscity_engine::core::engine::{PlayerSession, ProgressionEngine};
use oscity_engine::core::progress::{MemoryProgressStore, ProgressStore, RonFileProgressStore};
use oscity_engine::schema::event::{Effect, Trigger};
use oscity_engine::schema::player::PlayerId;
use oscity_engine::schema::region::BlockPos;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "playtest", about = "Play OS City journeys in the terminal")]
struct Args {
    /// Content directory
    #[arg(long, default_value = "content")]
    content: PathBuf,

    /// RNG seed; overrides config.ron
    #[arg(long)]
    seed: Option<u64>,

    /// Keep completions in this RON file between runs
    #[arg(long)]
    progress: Option<PathBuf>,

    /// Player id
    #[arg(long, default_value_t = 1)]
    player: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let mut builder = ProgressionEngine::builder().content_dir(&args.content);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let store: Box<dyn ProgressStore> = match &args.progress {
        Some(path) => match RonFileProgressStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => Box::new(MemoryProgressStore::new()),
    };

    let player = PlayerId(args.player);
    let completed = match store.load_completed(player) {
        Ok(completed) => completed,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("Loaded {} dialogue paths, {} questions, {} regions",
        engine.dialogue().len(),
        engine.questions().len(),
        engine.world().regions.len()
    );
    println!("Type 'help' for commands.\n");

    let mut shell = Shell {
        engine: &engine,
        store: store.as_ref(),
        session: engine.open_session(player, completed),
    };
    shell.run(Trigger::Joined);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{}]> ", shell.session.phase());
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "go" => match shell.find_room(rest) {
                Some(title) => shell.run(Trigger::RegionEntered(Some(title))),
                None => {
                    println!("Unknown room '{}'. Rooms:", rest);
                    for region in engine.world().regions.iter() {
                        println!("  {:<16} {}", region.key, region.title);
                    }
                }
            },
            "walk" => match parse_pos(rest) {
                Some(pos) => shell.run(Trigger::Moved(pos)),
                None => println!("Usage: walk <x> <y> <z>"),
            },
            "press" => {
                if rest.is_empty() {
                    println!("Usage: press <button>");
                    continue;
                }
                shell.run(Trigger::ButtonPressed(rest.to_string()));
            }
            "say" => {
                let reaction = engine.on_chat_line(&mut shell.session, rest);
                if !reaction.consumed {
                    println!("<you> {}", rest);
                }
                shell.apply(reaction.effects);
            }
            "calc" => shell.run(Trigger::CalculatorInput(rest.to_string())),
            "guide" => shell.run(Trigger::GuideRequested),
            "book" => shell.print_book(),
            "status" => shell.print_status(),
            _ => println!("Unknown command '{}'. Type 'help'.", cmd),
        }
    }
}

struct Shell<'a> {
    engine: &'a ProgressionEngine,
    store: &'a dyn ProgressStore,
    session: PlayerSession,
}

impl Shell<'_> {
    fn run(&mut self, trigger: Trigger) {
        let reaction = self.engine.handle(&mut self.session, &trigger);
        self.apply(reaction.effects);
    }

    /// Print effects; follow teleports and timers straight away.
    fn apply(&mut self, effects: Vec<Effect>) {
        let config = self.engine.config().clone();
        let mut follow_up: VecDeque<Trigger> = VecDeque::new();

        for effect in effects {
            print_effect(&config, &effect);
            match effect {
                Effect::Teleport { destination } => {
                    match self.engine.world().destinations.get(&destination) {
                        Some(&pos) => follow_up.push_back(Trigger::Moved(pos)),
                        None => println!("  (no map position for '{}')", destination),
                    }
                }
                Effect::MarkComplete { journey } => {
                    if let Err(e) = self.store.mark_complete(self.session.player, journey) {
                        println!("  (completion not saved: {})", e);
                    }
                }
                Effect::Schedule { delay, trigger } => {
                    println!("  ... {:.1}s later", delay.as_secs_f32());
                    follow_up.push_back(trigger);
                }
                _ => {}
            }
        }

        for trigger in follow_up {
            self.run(trigger);
        }
    }

    fn find_room(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let regions = &self.engine.world().regions;
        if let Some(region) = regions.by_key(query) {
            return Some(region.title.clone());
        }
        regions
            .iter()
            .find(|r| r.title.eq_ignore_ascii_case(query))
            .or_else(|| {
                let lower = query.to_lowercase();
                regions.iter().find(|r| r.title.to_lowercase().contains(&lower))
            })
            .map(|r| r.title.clone())
    }

    fn print_book(&self) {
        let progress = &self.session.progress;
        for journey in self.engine.catalog().iter() {
            let mark = if progress.is_complete(journey.id) {
                "done"
            } else if progress.is_unlocked(journey.id) {
                "open"
            } else {
                "locked"
            };
            println!("  {}. {:<32} [{}]", journey.id.0, journey.display_name, mark);
        }
    }

    fn print_status(&self) {
        let session = &self.session;
        println!("  player:   {}", session.player.0);
        println!("  session:  {}", session.session_id);
        println!("  phase:    {}", session.phase());
        match session.journey().and_then(|id| self.engine.catalog().get(id)) {
            Some(journey) => {
                println!("  journey:  {}. {}", journey.id.0, journey.display_name);
                println!("  address:  {} ({})", session.var("va"), session.var("vaBin"));
            }
            None => println!("  journey:  none"),
        }
        if let Some(pending) = session.pending() {
            println!("  waiting:  {:?}", pending.kind());
        }
        if let Some(clock) = session.clock() {
            println!("  clock:    round {}", clock.round());
        }
        if session.is_calculating() {
            println!("  calculator is working");
        }
        let summary = session.summary();
        println!(
            "  hints: {}  wrong answers: {}  completed: {:?}",
            summary.hints_used,
            summary.wrong_answers,
            summary.completed.iter().map(|j| j.0).collect::<Vec<_>>()
        );
    }
}

fn print_effect(config: &EngineConfig, effect: &Effect) {
    match effect {
        Effect::Dialogue { lines, .. } => {
            for line in lines {
                println!("{}{}", config.guide_prefix, line);
            }
        }
        Effect::Message { channel, text } => println!("{}{}", config.prefix(*channel), text),
        Effect::SetDisplay { display, lines } => {
            let shown: Vec<&str> = lines.iter().map(String::as_str).filter(|l| !l.is_empty()).collect();
            println!("  [{}] {}", display, shown.join(" | "));
        }
        Effect::SetIndicator { indicator, lit } => {
            println!("  [{}] {}", indicator, if *lit { "lit" } else { "dark" });
        }
        Effect::Teleport { destination } => println!("  ~ teleported to {}", destination),
        Effect::MarkComplete { journey } => println!("  * journey {} complete", journey.0),
        Effect::LogMiss { context } => println!("  (miss: {})", context),
        Effect::LogHint { context } => println!("  (hint: {})", context),
        Effect::InterruptDialogue | Effect::MoveGuide { .. } | Effect::Schedule { .. } => {}
    }
}

fn parse_pos(input: &str) -> Option<BlockPos> {
    let parts: Vec<i32> = input
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, z] => Some(BlockPos::new(*x, *y, *z)),
        _ => None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  go <room>          enter a room by title or key");
    println!("  walk <x> <y> <z>   stand at a block position");
    println!("  press <button>     press a button by id");
    println!("  say <text>         type a chat line");
    println!("  calc <text>        type into the calculator");
    println!("  guide              ask the guide for help");
    println!("  book               list journeys and what is unlocked");
    println!("  status             show phase, journey and pending prompt");
    println!("  help               this list");
    println!("  quit               exit");
}
