use std::fs::File;
use std::io::BufWriter;
use std::io::stdout;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use log::info;
use log::warn;
use rustc_hash::FxHashMap;

use wfst_fst::Fst;
use wfst_fst::Semiring;
use wfst_fst::Sentinels;
use wfst_fst::State;
use wfst_fst::Transition;
use wfst_fst::acceptor;
use wfst_fst::compose;
use wfst_fst::log_add_exp;
use wfst_fst::ngram_skeleton;
use wfst_fst::sort_topological;
use wfst_fst::train_joint;
use wfst_fst::write_dot;
use wfst_io::read_corpus;
use wfst_io::read_lines;
use wfst_metrics::cer_lines;
use wfst_utilities::WfstError;

mod verbosity;

use verbosity::VerbosityFlag;

/// The start marker of the histories of the n-gram models.
const START_MARKER: char = '\u{2}';

#[derive(clap::Parser, Debug)]
#[command(
    name = "wfst",
    version,
    about = "A command line tool for weighted finite state transducers"
)]
struct Cli {
    #[command(flatten)]
    verbosity: VerbosityFlag,

    #[command(subcommand)]
    commands: Option<Commands>,
}

/// Defines the subcommands for this tool.
#[derive(Debug, Subcommand)]
enum Commands {
    Train(TrainArgs),
    Cer(CerArgs),
    Acceptor(AcceptorArgs),
}

#[derive(clap::Args, Debug)]
#[command(about = "Trains a character n-gram model on the given corpus")]
struct TrainArgs {
    /// The order of the n-gram model.
    order: usize,

    /// The training corpus, one sequence per line.
    corpus: String,

    #[arg(long, help = "Write the trained model in DOT format to the given file")]
    dot: Option<String>,
}

#[derive(clap::Args, Debug)]
#[command(about = "Computes the character error rate of the hypotheses against the references")]
struct CerArgs {
    reference: String,
    hypothesis: String,
}

#[derive(clap::Args, Debug)]
#[command(about = "Prints the acceptor of the given word in DOT format")]
struct AcceptorArgs {
    word: String,

    #[arg(long, help = "Compose the acceptor with the n-gram model trained on this corpus")]
    corpus: Option<String>,

    #[arg(long, default_value_t = 2, help = "The order of the n-gram model")]
    order: usize,

    output: Option<String>,
}

fn main() -> Result<ExitCode, WfstError> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    if let Some(command) = cli.commands {
        match command {
            Commands::Train(args) => {
                let fst = train(args.order, &args.corpus)?;
                println!("{fst}");

                for state in fst.iter_states() {
                    let total: f64 = fst.outgoing_transitions(state).filter_map(|t| fst.weight(t)).sum();
                    if total != 0.0 && (total - 1.0).abs() > 1e-9 {
                        warn!("Outgoing weights of state {state:?} sum to {total}");
                    }
                }

                if let Some(file) = args.dot {
                    let mut writer = BufWriter::new(File::create(file)?);
                    write_dot(&mut writer, &fst)?;
                }
            }
            Commands::Cer(args) => {
                let references = read_lines(File::open(&args.reference)?)?;
                let hypotheses = read_lines(File::open(&args.hypothesis)?)?;

                println!("{}", cer_lines(&references, &hypotheses)?);
            }
            Commands::Acceptor(args) => {
                let word = acceptor(args.word.chars(), Sentinels::default());

                if let Some(corpus) = args.corpus {
                    let model = train(args.order, &corpus)?;
                    let composed = compose(&word, &model)?;
                    info!("{}", composed.fst());

                    let value = composed.compose_values(
                        |t| word.weight(t).unwrap_or(0.0).ln(),
                        |t| model.weight(t).unwrap_or(0.0).ln(),
                        Semiring::LogSum,
                    );
                    eprintln!("Log probability: {}", forward_log_value(composed.fst(), value)?);

                    write_output(args.output, composed.fst())?;
                } else {
                    write_output(args.output, &word)?;
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Trains a character n-gram model of the given order on the corpus in the given file.
fn train(order: usize, corpus: &str) -> Result<Fst<Vec<char>, char>, WfstError> {
    let corpus = read_corpus(File::open(corpus)?)?;

    let mut alphabet: Vec<char> = corpus.iter().flatten().copied().collect();
    alphabet.sort_unstable();
    alphabet.dedup();
    info!("Training {order}-gram model over {} symbols", alphabet.len());

    let mut fst = ngram_skeleton(order, alphabet, START_MARKER, Sentinels::default())?;
    train_joint(&mut fst, &corpus)?;
    Ok(fst)
}

/// Returns the logarithm of the total value of all paths from the start state
/// to the accept state of an acyclic transducer.
fn forward_log_value<S: State>(
    fst: &Fst<S, char>,
    value: impl Fn(&Transition<S, char>) -> f64,
) -> Result<f64, WfstError> {
    let order = sort_topological(fst)?;

    let mut forward: FxHashMap<S, f64> = FxHashMap::default();
    if let Some(start) = order.first() {
        forward.insert(start.clone(), 0.0);
    }

    for state in &order {
        let current = forward.get(state).copied().unwrap_or(f64::NEG_INFINITY);
        for transition in fst.outgoing_transitions(state) {
            let next = forward.entry(transition.to.clone()).or_insert(f64::NEG_INFINITY);
            *next = log_add_exp(*next, current + value(transition));
        }
    }

    let accept = fst.accept().ok_or("The transducer has no accept state")?;
    Ok(forward.get(accept).copied().unwrap_or(f64::NEG_INFINITY))
}

/// Writes the transducer in DOT format to the given file, or to stdout.
fn write_output<S: State>(output: Option<String>, fst: &Fst<S, char>) -> Result<(), WfstError> {
    if let Some(file) = output {
        let mut writer = BufWriter::new(File::create(file)?);
        write_dot(&mut writer, fst)?;
    } else {
        write_dot(&mut stdout(), fst)?;
    }

    Ok(())
}
