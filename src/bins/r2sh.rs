use std::path::PathBuf;

use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{BasicHistory, Input};
use tracing::{debug, error};

use r2kit::addr::{Addr, Location};
use r2kit::api::R2;
use r2kit::errors::{R2Error, Result};
use r2kit::pipe::{R2Process, Transport};
use r2kit::record::RecordList;

/// Interactive shell over a radare2 session
///
/// Spawns radare2 on the given target and offers typed built-ins (prefixed
/// with `:`) on top of raw command passthrough. Anything not starting with
/// `:` goes to radare2 verbatim.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The file to load into radare2
    target: PathBuf,

    /// Spawn in debug mode (radare2 -d)
    #[clap(short, long)]
    debug: bool,

    /// Open the target writeable (radare2 -w)
    #[clap(short, long)]
    writeable: bool,

    /// Use this radare2 binary instead of searching PATH
    #[clap(long)]
    r2: Option<PathBuf>,

    /// Print listing built-ins as pretty JSON
    #[clap(short, long)]
    json: bool,

    /// Log command traffic
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    human_panic::setup_panic!();

    let args = Args::parse();
    setup_logger(args.verbose);
    debug!("set up the logger");

    let mut flags: Vec<String> = Vec::new();
    if args.debug {
        flags.push("-d".to_string());
    }
    if args.writeable {
        flags.push("-w".to_string());
    }

    let transport = match &args.r2 {
        Some(bin) => R2Process::spawn_binary(bin, &args.target, &flags)?,
        None => R2Process::spawn_with_flags(&args.target, &flags)?,
    };
    let mut r2 = R2::new(transport);

    let mut history = BasicHistory::new().max_entries(64).no_duplicates(true);
    loop {
        let line: String = match Input::with_theme(&ColorfulTheme::default())
            .with_prompt("r2sh")
            .history_with(&mut history)
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                // Input dies when stdin closes; treat that as a quit.
                debug!("input channel closed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":q" || line == ":quit" {
            break;
        }

        let outcome = match line.strip_prefix(':') {
            Some(rest) => builtin(&mut r2, rest, args.json),
            None => passthrough(&mut r2, line),
        };
        if let Err(e) = outcome {
            match e {
                R2Error::PipeClosed => {
                    error!("radare2 is gone: {e}");
                    return Err(e);
                }
                other => error!("{other}"),
            }
        }
    }

    r2.quit()?;
    Ok(())
}

fn passthrough<T: Transport>(r2: &mut R2<T>, line: &str) -> Result<()> {
    let out = r2.cmd(line)?;
    if !out.is_empty() {
        println!("{out}");
    }
    Ok(())
}

fn builtin<T: Transport>(r2: &mut R2<T>, rest: &str, json: bool) -> Result<()> {
    let words = match shlex::split(rest) {
        Some(words) if !words.is_empty() => words,
        _ => {
            help();
            return Ok(());
        }
    };
    let argv: Vec<&str> = words.iter().map(String::as_str).collect();

    match argv.as_slice() {
        ["i"] => {
            let info = r2.info()?;
            println!("{}", serde_json::to_string_pretty(&info).unwrap());
        }
        ["f"] => {
            for f in r2.functions()? {
                let name = match r2.function(f).name() {
                    Ok(Some(name)) => name,
                    _ => String::new(),
                };
                println!("{}  {name}", f.offset);
            }
        }
        ["r"] => {
            let regs = r2.cpu().all()?;
            if regs.is_empty() {
                println!("no registers (not debugging?)");
            } else if json {
                println!("{}", serde_json::to_string_pretty(&regs).unwrap());
            } else {
                for name in regs.fields() {
                    if let Some(v) = regs.get_u64(name) {
                        println!("{name} = {v:#x}");
                    }
                }
            }
        }
        ["rs", name, value] => match parse_u64(value) {
            Some(value) => r2.cpu().set(name, value)?,
            None => println!("not a number: {value}"),
        },
        ["db", loc] => r2.debugger().set_breakpoint(parse_loc(loc))?,
        ["db-", loc] => r2.debugger().delete_breakpoint(parse_loc(loc))?,
        ["bl"] => print_records(&r2.debugger().breakpoints()?, json),
        ["dc"] => report(r2.debugger().cont()?),
        ["dcc"] => report(r2.debugger().until_call().cont()?),
        ["dccu"] => report(r2.debugger().until_unknown_call().cont()?),
        ["dcr"] => report(r2.debugger().until_ret().cont()?),
        ["ds"] => report(r2.debugger().step()?),
        ["dm"] => print_records(&r2.debugger().memory_maps()?, json),
        ["bt"] => print_records(&r2.debugger().backtrace()?, json),
        ["px", n] => match parse_usize(n) {
            Some(n) => println!("{}", r2.print().hexdump(n)?),
            None => println!("not a number: {n}"),
        },
        ["px", n, loc] => match parse_usize(n) {
            Some(n) => println!("{}", r2.print().at(parse_loc(loc)).hexdump(n)?),
            None => println!("not a number: {n}"),
        },
        ["s", loc] => r2.seek(parse_loc(loc))?,
        _ => help(),
    }
    Ok(())
}

fn print_records(list: &RecordList, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(list).unwrap());
    } else {
        for rec in list {
            println!("{}", serde_json::to_string(rec).unwrap());
        }
    }
}

fn report(out: String) {
    if !out.is_empty() {
        println!("{out}");
    }
}

/// Accepts `0x…` hex or plain decimal, everything else becomes a symbol
/// expression for radare2 to resolve
fn parse_loc(s: &str) -> Location {
    s.parse::<Addr>()
        .map(Location::Addr)
        .unwrap_or_else(|_| Location::from(s))
}

fn parse_u64(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn parse_usize(s: &str) -> Option<usize> {
    parse_u64(s).map(|v| v as usize)
}

fn help() {
    println!(
        "built-ins:
  :i             target info
  :f             list functions
  :r             dump registers
  :rs NAME VAL   set a register
  :db LOC        set breakpoint
  :db- LOC       delete breakpoint
  :bl            list breakpoints
  :dc            continue
  :dcc/:dccu     continue until (unknown) call
  :dcr           continue until return
  :ds            step one instruction
  :dm            memory maps
  :bt            backtrace
  :px N [LOC]    hexdump N bytes
  :s LOC         seek
  :q             quit
anything else is sent to radare2 verbatim"
    );
}

fn setup_logger(verbose: bool) {
    let level = if verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    // construct a subscriber that prints formatted traces to stdout
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .with_file(false)
        .with_target(false)
        .finish();
    // use that subscriber to process traces emitted after this point
    tracing::subscriber::set_global_default(subscriber).expect("could not setup logger");
}
