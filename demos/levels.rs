#[macro_use]
extern crate log;

use std::error::Error;
use plangraph::{Context, Contextual, GraphOptions, Logger, PlanningGraph, Problem};

#[derive(Debug)]
struct App {
    name:        String,
    log_dir:     Option<String>,
    verbosity:   u32,
    path:        Option<String>,
    show_layers: bool,
}

impl App {
    fn new<S: AsRef<str>>(name: S) -> Self {
        let name = name.as_ref().into();
        let mut log_dir = None;
        let mut verbosity = 0;
        let mut path = None;
        let mut show_layers = false;

        for (prev_arg, next_arg) in std::env::args().zip(std::env::args().skip(1)) {
            match next_arg.as_str() {
                "-v" => verbosity += 1,
                "-vv" => verbosity += 2,
                "-vvv" => verbosity += 3,
                "-l" | "--layers" => show_layers = true,
                "--log-dir" => {}
                arg => {
                    if arg.starts_with('-') {
                        panic!("ERROR: Invalid CLI option \"{}\"", arg)
                    } else if prev_arg == "--log-dir" {
                        log_dir = Some(arg.into());
                    } else {
                        path = Some(arg.into());
                    }
                }
            }
        }

        App { name, log_dir, verbosity, path, show_layers }
    }
}

const DEFAULT_PROBLEM: &str = include_str!("air_cargo.yaml");

fn main() -> Result<(), Box<dyn Error>> {
    let app = App::new("Levels");

    let log_level = match app.verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut logger = Logger::new(&app.name).with_console(log_level);

    if let Some(ref log_dir) = app.log_dir {
        logger = logger.with_explicit_directory(log_dir);
    }

    if logger.get_directory().is_some() {
        logger = logger.with_file("levels.log", log_level);
    }

    logger.apply();

    let ctx = Context::new_handle();
    let problem = match app.path {
        Some(ref path) => Problem::from_file(ctx, path)?,
        None => Problem::from_str(ctx, DEFAULT_PROBLEM)?,
    };
    let options = problem.get_options().unwrap_or_default();
    let mut graph = PlanningGraph::new(&problem, problem.get_initial_state(), options)?;

    info!("Problem: {}", problem.get_name().unwrap_or("(unnamed)"));
    info!("Goal: {}", graph.get_goal().to_vec().format(problem.get_context())?);

    for (label, result) in vec![
        ("level-sum", graph.h_levelsum()),
        ("max-level", graph.h_maxlevel()),
        ("set-level", graph.h_setlevel()),
    ] {
        match result {
            Ok(value) => info!("{}: {}", label, value),
            Err(err) if err.is_unreachable() => info!("{}: unreachable ({})", label, err),
            Err(err) => return Err(err.into()),
        }
    }

    if app.show_layers {
        graph.fill(None);
        println!("{}", graph.format(problem.get_context())?);
    }

    let relaxed = GraphOptions::default().with_serialize(false).with_ignore_mutexes(true);
    let mut relaxed_graph = PlanningGraph::new(&problem, problem.get_initial_state(), relaxed)?;

    match relaxed_graph.h_setlevel() {
        Ok(value) => info!("set-level without dynamic mutexes or serialization: {}", value),
        Err(err) => info!("set-level without dynamic mutexes or serialization: {}", err),
    }

    Ok(())
}
