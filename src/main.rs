mod utils;
mod logger;
mod history;
mod clicks;
mod bidder_config;
mod estimator;
mod slots;
mod pacing;
mod bidder;
mod bidders;
mod gsp;
mod simulationrun;
mod scenarios;
mod charts;

use logger::{Logger, LogEvent, ConsoleReceiver, FileReceiver, sanitize_filename};
use std::path::PathBuf;

use scenarios::get_scenario_catalog;
use utils::{RAND_SEED, TOTAL_SIMULATION_RUNS};
use std::sync::atomic::Ordering;

/// Scenario run when no arguments are given
const DEFAULT_SCENARIO: &str = "variant_comparison";

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --verbose and --fastbreak arguments
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if i + 1 < raw_args.len() && raw_args[i + 1] == "auction" {
                utils::VERBOSE_AUCTION.store(true, Ordering::Relaxed);
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        args.push(arg.clone());
    }

    if args.len() > 1 && args[1] == "charts" {
        match charts::generate_all_charts() {
            Ok(()) => {
                println!("All chart generation completed successfully.");
            }
            Err(e) => {
                eprintln!("Error generating charts: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.len() <= 1 {
        let mut logger = Logger::new();
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Variant, LogEvent::Scenario]));
        let default = get_scenario_catalog().into_iter().find(|s| s.short_name == DEFAULT_SCENARIO);
        let result = match default {
            Some(scenario) => (scenario.run)(scenario.short_name, &mut logger),
            None => Err(format!("Scenario '{}' not registered", DEFAULT_SCENARIO).into()),
        };
        if let Err(e) = result {
            eprintln!("Error running scenario: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let scenario_arg = &args[1];

    let iterations = if args.len() > 2 {
        match args[2].parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: Invalid iterations parameter '{}'. Expected a number.", args[2]);
                std::process::exit(1);
            }
        }
    } else {
        1
    };

    // Seed of the first iteration
    let start_iteration = if args.len() > 3 {
        match args[3].parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: Invalid start iteration parameter '{}'. Expected a number.", args[3]);
                std::process::exit(1);
            }
        }
    } else {
        0
    };

    let all_scenarios = get_scenario_catalog();
    let scenarios: Vec<_> = if scenario_arg == "all" {
        all_scenarios.clone()
    } else {
        match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
            Some(scenario) => vec![scenario.clone()],
            None => {
                eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                eprintln!("Available scenarios:");
                for s in &all_scenarios {
                    eprintln!("  - {}", s.short_name);
                }
                std::process::exit(1);
            }
        }
    };

    // Individual validations are shown only for a single scenario run once
    let mut logger = Logger::new();
    if scenario_arg != "all" && iterations == 1 {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
    } else {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
    }

    let summary_receiver = match FileReceiver::new(&PathBuf::from("log/summary.log"), vec![LogEvent::Validation]) {
        Ok(receiver) => receiver,
        Err(e) => {
            eprintln!("Error opening log/summary.log: {}", e);
            std::process::exit(1);
        }
    };
    let summary_receiver_id = logger.add_receiver(summary_receiver);

    TOTAL_SIMULATION_RUNS.store(0, Ordering::Relaxed);

    if scenario_arg == "all" {
        if iterations > 1 {
            logln!(&mut logger, LogEvent::Validation, "Running all scenarios {} times...\n", iterations);
        } else {
            logln!(&mut logger, LogEvent::Validation, "Running all scenarios...\n");
        }
    } else if iterations > 1 {
        logln!(&mut logger, LogEvent::Validation, "Running scenario '{}' {} times...\n", scenario_arg, iterations);
    } else {
        logln!(&mut logger, LogEvent::Validation, "Running scenario '{}'...\n", scenario_arg);
    }

    'scenarios: for scenario in &scenarios {
        log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

        let scenario_log = PathBuf::from(format!("log/{}/scenario.log", sanitize_filename(scenario.short_name)));
        let scenario_receiver_id = match FileReceiver::new(&scenario_log, vec![LogEvent::Scenario]) {
            Ok(receiver) => logger.add_receiver(receiver),
            Err(e) => {
                eprintln!("Error opening {}: {}", scenario_log.display(), e);
                std::process::exit(1);
            }
        };

        for i in start_iteration..(start_iteration + iterations) {
            if iterations > 1 {
                log!(&mut logger, LogEvent::Validation, "[{}/{}] ", i - start_iteration + 1, iterations);
            }

            RAND_SEED.store(i, Ordering::Relaxed);

            match (scenario.run)(scenario.short_name, &mut logger) {
                Ok(()) => {
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✓");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                    }
                }
                Err(e) => {
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✗");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                    }

                    if fastbreak {
                        logger.remove_receiver(scenario_receiver_id);
                        logln!(&mut logger, LogEvent::Validation, "\nStopping scenario execution due to failure (--fastbreak enabled)");
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "Error at iteration {}/{} (seed {}): {}", i - start_iteration + 1, iterations, i, e);
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "Error: {}", e);
                        }
                        break 'scenarios;
                    }
                }
            }

            let _ = logger.flush();
        }

        logger.remove_receiver(scenario_receiver_id);
    }

    let final_count = TOTAL_SIMULATION_RUNS.load(Ordering::Relaxed);
    logln!(&mut logger, LogEvent::Validation, "\nTotal simulation runs completed: {}", final_count);

    logger.remove_receiver(summary_receiver_id);
}
