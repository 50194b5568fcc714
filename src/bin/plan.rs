use std::path::PathBuf;

use pit_strategy::api_computations::{saved_from_strategy, validate_laps, validate_tyres};
use pit_strategy::env_config;
use pit_strategy::history::HistoryStore;
use pit_strategy::predictions::{PredictionQuery, PredictionSource, PredictionTable};
use pit_strategy::storage::{load_prediction_file, PredictionFile};
use pit_strategy::strategy_search::compute_strategies_with_policy;
use pit_strategy::types::{PredictionSet, RaceStrategy, SearchPolicy};

struct Args {
    laps: i64,
    predictions: PathBuf,
    circuit: String,
    air_temp: f64,
    track_temp: f64,
    policy: SearchPolicy,
    json: bool,
    save: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    let Some(raw) = value else {
        eprintln!("Missing value for {}", flag);
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {} value: {}", flag, raw);
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: pit-strategy-plan --laps N [options]");
    println!();
    println!("Options:");
    println!("  --laps N            Race length in laps (required)");
    println!("  --predictions FILE  Prediction table or tyre list (default: $PIT_STRATEGY_PREDICTIONS)");
    println!("  --circuit NAME      Circuit to look up in a prediction table (default: Bahrain Grand Prix)");
    println!("  --air-temp T        Air temperature in °C (default: 30.0)");
    println!("  --track-temp T      Track temperature in °C (default: 45.0)");
    println!("  --min-stint N       Shortest stint considered (default: 5)");
    println!("  --step N            Stint length increment (default: 1)");
    println!("  --top K             Strategies to report (default: 3)");
    println!("  --dedup SECS        Dedup bucket width in seconds (default: 1.0)");
    println!("  --json              Print strategies as JSON");
    println!("  --save              Archive the best strategy in the history file");
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut laps: Option<i64> = None;
    let mut predictions = env_config::predictions_path();
    let mut circuit = "Bahrain Grand Prix".to_string();
    let mut air_temp = 30.0f64;
    let mut track_temp = 45.0f64;
    let mut policy = env_config::search_policy_from_env().unwrap_or_else(|e| {
        eprintln!("Invalid search policy: {}", e);
        std::process::exit(1);
    });
    let mut json = false;
    let mut save = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--laps" => {
                i += 1;
                laps = Some(parse_value(flag, args.get(i)));
            }
            "--predictions" => {
                i += 1;
                predictions = PathBuf::from(parse_value::<String>(flag, args.get(i)));
            }
            "--circuit" => {
                i += 1;
                circuit = parse_value(flag, args.get(i));
            }
            "--air-temp" => {
                i += 1;
                air_temp = parse_value(flag, args.get(i));
            }
            "--track-temp" => {
                i += 1;
                track_temp = parse_value(flag, args.get(i));
            }
            "--min-stint" => {
                i += 1;
                policy.min_stint_laps = parse_value(flag, args.get(i));
            }
            "--step" => {
                i += 1;
                policy.stint_step = parse_value(flag, args.get(i));
            }
            "--top" => {
                i += 1;
                policy.max_strategies = parse_value(flag, args.get(i));
            }
            "--dedup" => {
                i += 1;
                policy.dedup_resolution = parse_value(flag, args.get(i));
            }
            "--json" => json = true,
            "--save" => save = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(laps) = laps else {
        eprintln!("--laps is required");
        print_usage();
        std::process::exit(1);
    };
    if let Err(e) = policy.validate() {
        eprintln!("Invalid search policy: {}", e);
        std::process::exit(1);
    }

    Args {
        laps,
        predictions,
        circuit,
        air_temp,
        track_temp,
        policy,
        json,
        save,
    }
}

fn resolve_predictions(args: &Args) -> PredictionSet {
    let file = load_prediction_file(&args.predictions).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    match file {
        PredictionFile::Tyres(predictions) => PredictionSet {
            circuit: args.circuit.clone(),
            predictions,
        },
        PredictionFile::Table(rows) => {
            let query = PredictionQuery {
                circuit: args.circuit.clone(),
                air_temp: args.air_temp,
                track_temp: args.track_temp,
            };
            PredictionTable::new(rows).predict(&query).unwrap_or_else(|| {
                eprintln!("No predictions for {}", args.circuit);
                std::process::exit(1);
            })
        }
    }
}

fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    format!("{}:{:06.3}", minutes as u64, seconds - minutes * 60.0)
}

fn print_table(set: &PredictionSet, laps: u32, strategies: &[RaceStrategy]) {
    println!("{}, {} laps", set.circuit, laps);
    for p in &set.predictions {
        println!(
            "  {:<8} base {:>8.3}s  deg {:>6.4}s/lap",
            p.compound, p.base_time, p.degradation_rate
        );
    }
    println!();
    if strategies.is_empty() {
        println!("No legal strategy found (at least two compounds are required).");
        return;
    }
    let best = strategies[0].total_time;
    for (rank, s) in strategies.iter().enumerate() {
        let gap = if rank == 0 {
            String::new()
        } else {
            format!("  (+{:.3}s)", s.total_time - best)
        };
        println!(
            "#{} {}  {} stop(s){}",
            rank + 1,
            format_time(s.total_time),
            s.pit_stop_count,
            gap
        );
        for stint in &s.stints {
            println!(
                "    {:<8} laps {:>3}-{:<3} ({} laps)",
                stint.compound, stint.start_lap, stint.end_lap, stint.lap_count
            );
        }
    }
}

fn main() {
    env_config::init_tracing();
    let args = parse_args();
    env_config::init_rayon_threads();

    let laps = validate_laps(args.laps).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let set = resolve_predictions(&args);
    if let Err(e) = validate_tyres(&set.predictions) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let strategies = compute_strategies_with_policy(laps, &set.predictions, &args.policy);

    if args.json {
        match serde_json::to_string_pretty(&strategies) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize strategies: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_table(&set, laps, &strategies);
    }

    if args.save {
        let Some(best) = strategies.first() else {
            eprintln!("Nothing to save");
            std::process::exit(1);
        };
        let store = HistoryStore::open(env_config::history_path()).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        });
        let saved = store.save(saved_from_strategy(&set.circuit, best));
        println!("Saved as #{} ({})", saved.id, saved.created_at);
    }
}
