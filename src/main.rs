use std::{
    fs,
    io::{self, BufRead, Write},
};

use anyhow::{Context, Result};
use clap::{Arg, Command};
use flatsql::{
    config::Config,
    export::{dump_database, render_erd},
    sql::{
        engine::{Session, StoreEngine, Transaction},
        executor::ResultSet,
    },
    storage::file::FileStore,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Entry point for the flatsql command line.
///
/// - `flatsql [--config FILE] [--data DIR]` reads statements from stdin, one per line
/// - `flatsql export <database>` writes `<data>/<database>_dump.sql`
/// - `flatsql erd <database>` writes `<data>/<database>_ERD.txt`
fn main() -> Result<()> {
    let database_arg = || {
        Arg::new("database")
            .required(true)
            .value_name("DATABASE")
            .help("Database to render")
    };
    let matches = Command::new("flatsql")
        .about("File-backed relational store with a SQL-like command language")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .value_name("DIR")
                .help("Data directory, overrides data_dir from the config"),
        )
        .subcommand(
            Command::new("export")
                .about("Write a SQL dump of a database")
                .arg(database_arg()),
        )
        .subcommand(
            Command::new("erd")
                .about("Write an entity-relationship diagram of a database")
                .arg(database_arg()),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = matches.get_one::<String>("data") {
        config.data_dir = dir.into();
    }

    // stdout carries query results, logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let store = FileStore::new(&config.data_dir).with_context(|| {
        format!("cannot create data directory {}", config.data_dir.display())
    })?;
    let engine = StoreEngine::new(store)?;

    match matches.subcommand() {
        Some(("export", args)) => {
            let name = args.get_one::<String>("database").context("database is required")?;
            let dump = dump_database(&engine, name)?;
            write_report(&config, &format!("{}_dump.sql", name), &dump)
        }
        Some(("erd", args)) => {
            let name = args.get_one::<String>("database").context("database is required")?;
            let erd = render_erd(engine.get_database(name)?);
            write_report(&config, &format!("{}_ERD.txt", name), &erd)
        }
        _ => repl(&config, Session::new(engine)),
    }
}

fn write_report(config: &Config, file_name: &str, content: &str) -> Result<()> {
    let path = config.data_dir.join(file_name);
    fs::write(&path, content).with_context(|| format!("cannot write {}", path.display()))?;
    info!("wrote {}", path.display());
    print!("{}", content);
    Ok(())
}

/// Reads statements until `exit` or end of input. Statement errors are reported
/// and the loop continues.
fn repl(config: &Config, mut session: Session<StoreEngine<FileStore>>) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "{}", config.prompt)?;
        stdout.flush()?;
        let Some(line) = lines.next() else {
            writeln!(stdout)?;
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match session.execute(&line) {
            Ok(ResultSet::Exit) => break,
            Ok(result) => writeln!(stdout, "{}", result.render(config.max_column_width))?,
            Err(err) => {
                debug!("statement failed: {}", err);
                writeln!(stdout, "Error: {}", err)?;
            }
        }
    }

    if !session.transaction().auto_commit() {
        warn!("exiting with auto-commit off, uncommitted changes are discarded");
    }
    Ok(())
}
