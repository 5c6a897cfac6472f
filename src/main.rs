use rollcall::{import_file, RollEngine, RosterConfig, RosterStore, Settings, Toggle};
use std::process::ExitCode;
use std::thread;
use tracing_subscriber::{fmt, EnvFilter};

const SETTINGS_FILE: &str = "config.json";
const HISTORY_SHOWN: usize = 5;

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = RosterConfig::beside_executable().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Cannot locate executable, using ./data");
        RosterConfig::default()
    });

    // A store that cannot be opened leaves nothing to run
    let store = match RosterStore::open_or_create(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Cannot open roster store");
            eprintln!("Cannot open roster store: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = std::env::args().nth(1) {
        match import_file(&store, &path) {
            Ok(added) => println!("Imported {added} new names from {path}"),
            Err(e) => {
                eprintln!("Import from {path} failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let settings = Settings::load_or_default(SETTINGS_FILE);
    let mut engine = match RollEngine::new(settings.random.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut delay = match engine.toggle(&store) {
        Ok(Toggle::Started { first_delay }) => first_delay,
        Ok(Toggle::Stopped) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}. Pass a .txt or .csv roster file to import one.");
            return ExitCode::FAILURE;
        }
    };

    loop {
        thread::sleep(delay);
        let Some(tick) = engine.advance(&store) else {
            eprintln!("Roll stopped: the roster is empty");
            break;
        };

        match tick.next_delay {
            Some(next) => {
                println!("  {}", tick.name);
                delay = next;
            }
            None => {
                println!("-> {}", tick.name);
                break;
            }
        }
    }

    println!("\nRecent calls:");
    for record in store.get_history(HISTORY_SHOWN) {
        println!("  {}  {}", record.called_at, record.name);
    }

    ExitCode::SUCCESS
}
