use chrono::Utc;
use pixmon::adventure::{Adventure, AdventureError, AdventureEvent, StepOutcome, Story};
use pixmon::game::constants::SYNC_SETTLE_TIMEOUT_MS;
use pixmon::game::level_progress_percent;
use pixmon::sync::{HttpBackend, MemoryBackend, StatsBackend, SyncEvent};
use pixmon::utils::{logging, Storage};
use pixmon::{AuthSession, ClientConfig, PlayerStats};
use std::io::{self, BufRead, Write};
use std::time::Duration;

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let storage = Storage::open_default()?;
    let config = ClientConfig::load(&storage);
    logging::init(&config.log_filter);

    match args.get(1).map(String::as_str) {
        None | Some("play") => {
            let session = require_session(&storage)?;
            run_adventure(HttpBackend::from_config(&config, session), &config)
        }
        Some("demo") => run_adventure(MemoryBackend::new(PlayerStats::default()), &config),
        Some("login") => match (args.get(2), args.get(3)) {
            (Some(user_id), Some(token)) => {
                AuthSession::new(user_id.clone(), token.clone()).save(&storage)?;
                println!("Logged in as user {}.", user_id);
                Ok(())
            }
            _ => {
                eprintln!("Usage: pixmon login <user-id> <token>");
                std::process::exit(1);
            }
        },
        Some("logout") => {
            AuthSession::clear(&storage)?;
            println!("Logged out.");
            Ok(())
        }
        Some("stats") => {
            let session = require_session(&storage)?;
            show_server_stats(&HttpBackend::from_config(&config, session))
        }
        Some("--version") | Some("-v") => {
            println!("pixmon {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'pixmon --help' for usage.");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Pixmon - adventure client\n");
    println!("Usage: pixmon [command]\n");
    println!("Commands:");
    println!("  play                      Start an adventure (default)");
    println!("  demo                      Play against an offline practice server");
    println!("  login <user-id> <token>   Store credentials from the website");
    println!("  logout                    Forget stored credentials");
    println!("  stats                     Show your stats from the server");
    println!("  --version                 Show version information");
    println!("  --help                    Show this help message");
}

fn print_commands() {
    println!("Commands: step (or Enter), stats, refresh, quit");
}

fn require_session(storage: &Storage) -> io::Result<AuthSession> {
    match AuthSession::load(storage)? {
        Some(session) => Ok(session),
        None => {
            eprintln!("Not logged in. Run 'pixmon login <user-id> <token>' first.");
            std::process::exit(1);
        }
    }
}

fn print_stats(stats: &PlayerStats) {
    println!(
        "Level {}  XP {}/{} ({:.0}%)  Gold {}  Diamonds {}",
        stats.level,
        stats.xp,
        stats.xp_cap(),
        level_progress_percent(stats.level, stats.xp),
        stats.gold,
        stats.diamonds
    );
}

fn show_server_stats(backend: &impl StatsBackend) -> io::Result<()> {
    match backend.fetch_stats() {
        Ok(patch) => {
            let mut stats = PlayerStats::default();
            stats.apply_patch(&patch);
            print_stats(&stats);
            Ok(())
        }
        Err(e) => {
            eprintln!("Could not fetch stats: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_adventure<B: StatsBackend>(backend: B, config: &ClientConfig) -> io::Result<()> {
    let settle_timeout = Duration::from_millis(SYNC_SETTLE_TIMEOUT_MS);

    let mut adventure = match Adventure::start(backend, config) {
        Ok(adventure) => adventure,
        Err(e) => {
            eprintln!("Could not start adventure: {}", e);
            std::process::exit(1);
        }
    };
    match adventure.wait_until_loaded(settle_timeout, Utc::now()) {
        Ok(stats) => print_stats(&stats),
        Err(e) => {
            eprintln!("Could not load your stats: {}", e);
            std::process::exit(1);
        }
    }
    if adventure.cooldown_remaining(Utc::now()) > 0 {
        rest(&mut adventure, config)?;
    }
    print_commands();

    let mut rng = rand::thread_rng();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        report(adventure.pump(Utc::now()));

        match line.trim() {
            "" | "step" | "s" => {
                match adventure.step(&mut rng, Utc::now()) {
                    Ok(StepOutcome::Reward {
                        reward, leveled_up, ..
                    }) => {
                        if reward.is_empty() {
                            println!("You wander on. Nothing here.");
                        } else {
                            println!("You found {} XP and {} gold.", reward.xp, reward.gold);
                        }
                        if leveled_up {
                            println!("Level up! You reached level {}.", adventure.stats().level);
                        }
                    }
                    Ok(StepOutcome::Story { story, .. }) => tell_story(story, &mut lines)?,
                    Err(AdventureError::OnCooldown { remaining_secs }) => {
                        println!("Still resting, {}s left.", remaining_secs);
                        continue;
                    }
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                }
                rest(&mut adventure, config)?;
            }
            "stats" => {
                print_stats(adventure.stats());
                if let Some(error) = adventure.last_error() {
                    println!("(not saved yet: {})", error);
                }
            }
            "refresh" => {
                if let Err(e) = adventure.refresh() {
                    println!("{}", e);
                }
                report(adventure.settle(settle_timeout, Utc::now()));
                print_stats(adventure.stats());
            }
            "quit" | "q" | "exit" => break,
            "help" | "?" => print_commands(),
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }

    Ok(())
}

/// Shows the cooldown countdown until the next step is allowed.
fn rest(adventure: &mut Adventure, config: &ClientConfig) -> io::Result<()> {
    let mut stdout = io::stdout();
    while adventure.cooldown_remaining(Utc::now()) > 0 {
        for event in adventure.wait(config.cooldown_tick()) {
            match event {
                AdventureEvent::CooldownRemaining(secs) => {
                    print!("\rResting... {}s ", secs);
                    stdout.flush()?;
                }
                AdventureEvent::CooldownFinished => {}
                AdventureEvent::Sync(event) => report_sync(&event),
            }
        }
    }
    println!("\rReady for the next step.");
    Ok(())
}

fn report(events: Vec<AdventureEvent>) {
    for event in events {
        if let AdventureEvent::Sync(event) = event {
            report_sync(&event);
        }
    }
}

fn report_sync(event: &SyncEvent) {
    match event {
        SyncEvent::Failed { error, .. } => {
            println!("\nCould not save progress: {}. Playing on with local stats.", error);
        }
        SyncEvent::Confirmed {
            level_up: true,
            stats,
            ..
        } => {
            println!("\nLevel {} confirmed by the server.", stats.level);
        }
        _ => {}
    }
}

fn tell_story(
    story: &Story,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> io::Result<()> {
    println!("\n~ {} ~\n{}\n\n{}", story.title, story.text, story.question);
    for (i, choice) in story.choices.iter().enumerate() {
        println!("  {}) {}", i + 1, choice);
    }
    print!("Your answer: ");
    io::stdout().flush()?;

    let answer = match lines.next() {
        Some(line) => line?,
        None => return Ok(()),
    };
    let choice = answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1));
    match choice {
        Some(choice) if story.is_correct(choice) => println!("Correct!"),
        _ => println!("Not quite. The answer is: {}", story.correct_choice()),
    }
    Ok(())
}
