use std::env;
use std::process;

use color_eyre::eyre::{eyre, Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::Machine;

const USAGE: &str = "usage: ls8 <program.ls8> [--verbose] [--trace] [--max-cycles N]";

/// Options taken from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    program: String,
    level: LevelFilter,
    max_cycles: Option<u64>,
}

impl Options {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut program = None;
        let mut level = LevelFilter::Warn;
        let mut max_cycles = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => level = level.max(LevelFilter::Debug),
                "--trace" => level = LevelFilter::Trace,
                "--max-cycles" => {
                    let value = args
                        .next()
                        .ok_or_else(|| eyre!("`--max-cycles` needs a value"))?;
                    let value = value
                        .parse::<u64>()
                        .wrap_err_with(|| format!("Invalid cycle count: `{}`", value))?;
                    max_cycles = Some(value);
                }
                _ if arg.starts_with('-') => return Err(eyre!("Unknown option `{}`", arg)),
                _ if program.is_none() => program = Some(arg),
                _ => return Err(eyre!("Unexpected argument `{}`", arg)),
            }
        }

        Ok(Self {
            program: program.ok_or_else(|| eyre!("No program given"))?,
            level,
            max_cycles,
        })
    }
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling

    let options = match Options::parse(env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}\n{}", err, USAGE);
            process::exit(2);
        }
    };

    SimpleLogger::new()
        .with_level(options.level)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?; // logging

    let mut machine = Machine::new().with_cycle_limit(options.max_cycles);
    machine
        .load_file(&options.program)
        .wrap_err_with(|| format!("Failed to load `{}`", options.program))?;
    machine
        .run()
        .wrap_err_with(|| format!("Machine stopped at 0x{:02X}", machine.pc()))?;

    Ok(())
}
