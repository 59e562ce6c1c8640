extern crate clap;
extern crate chrono;
extern crate serde_json;
extern crate strided_npy;

#[macro_use]
extern crate log;
extern crate fern;
#[macro_use]
extern crate serde_derive;

mod sample;
mod settings;

use clap::{Arg, App, ArgMatches, SubCommand};
use std::error::Error;
use strided_npy::build_header;

fn main() {
    let matches = get_matches();

    let verbosity = matches.occurrences_of("v") as u8;
    let mut settings = match settings::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("invalid environment: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(log_file) = matches.value_of("log_file") {
        settings.log_file = log_file.to_owned();
    }

    if let Err(e) = prepare_logger(verbosity, &settings.log_file) {
        eprintln!("unable to set up logging: {}", e);
        std::process::exit(2);
    }

    let ret = match matches.subcommand() {
        ("header", Some(m)) => run_header(m),
        ("sample", Some(m)) => run_sample(m, settings),
        _ => {
            println!("{}", matches.usage());
            Ok(())
        }
    };

    if let Err(e) = ret {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_header(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let dtype = matches.value_of("dtype").unwrap_or("f4");
    let shape = matches.value_of("shape").unwrap_or("1");

    let mut chars = dtype.trim_start_matches('<').chars();
    let tag = chars.next().ok_or("empty dtype")?;
    let width = chars.as_str().parse::<usize>()?;
    let dims = shape
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<u64>())
        .collect::<Result<Vec<u64>, _>>()?;

    let header = build_header(tag, width, &dims)?;
    println!("{}", header.dict().trim_end());
    println!("header_len: {} (dict {}), payload offset aligned: {}",
        header.len(), header.dict_len(), header.len() % strided_npy::npy::ALIGNMENT == 0);
    Ok(())
}

fn run_sample(matches: &ArgMatches, mut settings: settings::Settings) -> Result<(), Box<dyn Error>> {
    if let Some(folder) = matches.value_of("folder") {
        settings.folder = folder.to_owned();
    }
    if let Some(count) = matches.value_of("count") {
        settings.sample_count = count.parse::<usize>()?;
    }
    let transposed = matches.is_present("transposed");

    let entries = sample::run(&settings.folder, settings.sample_count, transposed)?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn prepare_logger(verbosity: u8, log_file: &str) -> Result<(), Box<dyn Error>> {
    let level = match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::max(),
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S:%f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_file)?)
        .apply()?;
    Ok(())
}

fn get_matches<'a>() -> ArgMatches<'a> {
    App::new("npytool")
    .version("0.1.0")
    .author("Ricky Han <tectonic@rickyhan.com>")
    .about("writes tensors as .npy files")
    .arg(Arg::with_name("v")
        .short("v")
        .multiple(true)
        .help("Sets the level of verbosity"))
    .arg(Arg::with_name("log_file")
        .short("l")
        .long("log_file")
        .value_name("LOG_FILE")
        .takes_value(true)
        .help("Sets the log file to write to (default $NPY_LOG_FILE or npytool.log)"))
    .subcommand(SubCommand::with_name("header")
        .about("Prints the npy header for a dtype and shape, e.g. `npytool header -d f4 -s 2,3`")
        .arg(Arg::with_name("dtype")
            .short("d")
            .long("dtype")
            .value_name("DTYPE")
            .takes_value(true)
            .help("type class and width, e.g. f4, i2 (default f4)"))
        .arg(Arg::with_name("shape")
            .short("s")
            .long("shape")
            .value_name("SHAPE")
            .takes_value(true)
            .help("comma separated extents, outermost first (default 1)")))
    .subcommand(SubCommand::with_name("sample")
        .about("Writes deterministic sample f32 tensors and prints a JSON manifest")
        .arg(Arg::with_name("folder")
            .short("f")
            .long("folder")
            .value_name("FOLDER")
            .takes_value(true)
            .help("Sets the output folder (default $NPY_FOLDER or npy)"))
        .arg(Arg::with_name("count")
            .short("n")
            .long("count")
            .value_name("COUNT")
            .takes_value(true)
            .help("Sets the number of tensors (default $NPY_SAMPLE_COUNT or 10)"))
        .arg(Arg::with_name("transposed")
            .short("t")
            .long("transposed")
            .help("Writes each tensor with its axes reversed, straight from the original layout")))
    .get_matches()
}
