extern crate getopts;
use getopts::Options;
use std::env;
extern crate symbolic_learning;
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;
use std::time::{Duration, SystemTime};
use symbolic_learning::interval_algebra::{IntervalAlgebra, IntervalPred};
use symbolic_learning::learning;
use symbolic_learning::learning::{LearnError, LearnerConfig};
use symbolic_learning::oracle::{SfaOracle, SymbolicOracle};
use symbolic_learning::reader;
use symbolic_learning::sfa::Sfa;

pub struct ArgOption {
    sfafile: String,
    valfile: Option<String>,
    timeout: Option<usize>,
    limit: Option<usize>,
    debug: bool,
    outfile: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct ResultFile {
    states: usize,
    transitions: usize,
    num_membership: usize,
    num_equivalence: usize,
    num_conjectures: usize,
    conjecture_sizes: Vec<usize>,
    elapsed_secs: u64,
    finished_at: String,
    accuracy: f64,
    warnings: Vec<String>,
    error: Vec<String>,
    sfa: String,
}
impl ResultFile {
    fn new() -> Self {
        ResultFile {
            states: 0,
            transitions: 0,
            num_membership: 0,
            num_equivalence: 0,
            num_conjectures: 0,
            conjecture_sizes: vec![],
            elapsed_secs: 0,
            finished_at: String::new(),
            accuracy: -1.0,
            warnings: vec![],
            error: vec![],
            sfa: String::new(),
        }
    }
}

fn check_performance(
    rfile: &mut ResultFile,
    valfile: &str,
    target: &Sfa<IntervalPred<char>>,
    learned: &Sfa<IntervalPred<char>>,
    ba: &IntervalAlgebra<char>,
) {
    let words = match reader::read_file_as_words(valfile) {
        Ok(words) => words,
        Err(e) => {
            rfile.error.push(format!("ValCheck: failed to read the validation file: {:?}", e));
            return;
        }
    };
    if words.is_empty() {
        return;
    }
    let mut num_correct = 0;
    for w in &words {
        let exp = target.accepts(w.iter().cloned(), ba);
        let res = learned.accepts(w.iter().cloned(), ba);
        if exp == res {
            num_correct += 1;
        } else {
            let s: String = w.iter().collect();
            rfile.error.push(format!("ValCheck: disagreement on {} found!", &s));
        }
    }
    rfile.accuracy = (num_correct as f64) / (words.len() as f64);
}

fn run_experiment(opts: &ArgOption) -> String {
    let raw = reader::read_file_as_sfa(&opts.sfafile).expect("cannot read the target sfa");
    let target = reader::convert_into_proper_sfa(&raw);
    let ba = IntervalAlgebra::<char>::new();
    let mut oracle = SfaOracle::new(target.clone(), ba.clone());
    if let Some(secs) = opts.timeout {
        oracle = oracle.with_timeout(Duration::new(secs as u64, 0));
    }
    let lopt = LearnerConfig {
        debug_output: opts.debug,
        max_equivalence_queries: opts.limit,
    };
    let start_time = SystemTime::now();
    let res = learning::learn(&mut oracle, &ba, &lopt);
    let elapsed = start_time.elapsed();
    let mut rfile = ResultFile::new();
    rfile.num_membership = oracle.num_membership();
    rfile.num_equivalence = oracle.num_equivalence();
    rfile.elapsed_secs = elapsed.unwrap_or(Duration::new(0, 0)).as_secs();
    rfile.finished_at = Local::now().to_rfc3339();
    match res {
        Ok((learned, stats)) => {
            rfile.states = learned.state_count();
            rfile.transitions = learned.transition_count();
            rfile.num_conjectures = stats.num_conjectures;
            rfile.conjecture_sizes = stats.conjecture_sizes.clone();
            rfile.warnings = stats.warnings.clone();
            rfile.sfa = serde_json::to_string(&learned).expect("failed to serialize the learned sfa");
            if let Some(valfile) = &opts.valfile {
                check_performance(&mut rfile, valfile, &target, &learned, &ba);
            }
        }
        Err(LearnError::LimitExceeded(partial)) => {
            rfile.states = partial.state_count();
            rfile.transitions = partial.transition_count();
            rfile.sfa = serde_json::to_string(&partial).expect("failed to serialize the partial sfa");
            rfile.error.push("equivalence query limit exceeded".to_string());
        }
        Err(LearnError::Oracle(e)) => {
            rfile.error.push(format!("benchmark aborted, oracle unavailable: {}", e));
        }
        Err(LearnError::Invariant(msg)) => {
            rfile.error.push(format!("internal logic error: {}", msg));
        }
    }
    return serde_json::to_string_pretty(&rfile).expect("failed to serialize the result");
}

fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();
    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("", "debug", "print the observation table and counterexamples");
    opts.optopt("", "sfa", "target sfa file in json", "SFAJSON");
    opts.optopt("", "val", "validation word file, one word per line", "VALFILE");
    opts.optopt("", "timeout", "oracle timeout (secs).  Disabled if 0 is specified.", "TIMEOUT");
    opts.optopt("", "limit", "equivalence query limit.  Disabled if 0 is specified.", "LIMIT");
    opts.optopt("", "out", "output file for the result json", "OUTFILE");
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => panic!("{}", f.to_string()),
    };
    if matches.opt_present("h") {
        print_usage(&program, opts);
        return;
    }
    let sfafile = matches.opt_str("sfa").expect("--sfa is required");
    let timeout: usize = match matches.opt_str("timeout") {
        None => 0,
        Some(s) => s.parse().expect("--timeout must be a number"),
    };
    let limit: usize = match matches.opt_str("limit") {
        None => 0,
        Some(s) => s.parse().expect("--limit must be a number"),
    };
    let argopt = ArgOption {
        sfafile,
        valfile: matches.opt_str("val"),
        timeout: if timeout == 0 { None } else { Some(timeout) },
        limit: if limit == 0 { None } else { Some(limit) },
        debug: matches.opt_present("debug"),
        outfile: matches.opt_str("out").unwrap_or_else(|| "result.json".to_string()),
    };
    let res = run_experiment(&argopt);
    let mut f = File::create(&argopt.outfile).expect("cannot open the output file");
    write!(f, "{}", res).expect("failed to write the result");
    println!("Completed successfully!");
}
