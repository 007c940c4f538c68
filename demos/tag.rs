use std::{
    fs::File,
    io::{stdin, stdout, Read, Write},
    path::PathBuf,
    time::Instant,
};

use clap::Parser;
use hmmtag::{DecodeOpt, Evaluation, Model, StringTable, Tagger};

/// Assign suitable tags to the sentences in the data set given by a file (FILE)
/// If the argument DATA is omitted or '-', this utility reads a data from STDIN
/// Evaluate the performance of the model on tagged sentences (with -t option)
#[derive(Debug, Parser)]
struct Argv {
    /// read a model from a file (MODEL)
    #[arg(short, long, required = true, value_name = "MODEL")]
    model: PathBuf,
    /// report the performance of the model on the data
    #[arg(short = 't', long = "test")]
    evaluate: bool,
    /// output the reference tags in the input data
    #[arg(short, long)]
    reference: bool,
    /// output the probability of the observation sequences
    #[arg(short, long)]
    probability: bool,
    /// output the trellis of every sequence
    #[arg(short = 'l', long)]
    trellis: bool,
    /// suppress tagging results (useful for test mode)
    #[arg(short, long)]
    quiet: bool,
    /// assign suitable tags to the sentences in the data set given by a file (FILE)
    #[arg(value_name = "FILE")]
    datasets: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("{:?}", argv);
    let model = Model::from_path(&argv.model).expect("failed to load model");

    let mut ds = model.dataset();
    if argv.datasets.is_empty() || argv.datasets.iter().any(|p| p.as_os_str() == "-") {
        let mut buf = String::new();
        stdin().read_to_string(&mut buf).expect("failed to read STDIN");
        ds.read(buf.as_bytes()).expect("failed to read data");
    }
    for fpath in argv.datasets.iter().filter(|p| p.as_os_str() != "-") {
        let f = File::open(fpath).expect("failed to open the stream for the input data");
        ds.read_file(f).expect("failed to read data");
    }

    let mut opt = DecodeOpt::empty();
    opt.set(DecodeOpt::CUMULATIVE, argv.probability);
    let mut tagger = model.tagger(opt);
    let mut evaluation = Evaluation::new(ds.tags().clone());
    let mut prediction = Vec::new();
    let out = &mut stdout().lock();
    let begin = Instant::now();
    for seq in ds.seqs() {
        tagger.set_seq(&seq.items).expect("failed to tag");
        tagger.viterbi(&mut prediction);
        if argv.evaluate {
            evaluation.accumulate(&seq.labels, &prediction);
        }
        if argv.trellis {
            write!(out, "{}", tagger.trellis()).expect("failed to write");
        }
        if !argv.quiet {
            if let Some(p) = tagger.cumulative_probability() {
                writeln!(out, "@probability\t{p:.6}").expect("failed to write");
            }
            for (i, (&word, &tag)) in seq.items.iter().zip(&prediction).enumerate() {
                let word = ds.words().to_str(word).unwrap_or("N/A");
                let tag = ds.tags().to_str(tag).unwrap_or("N/A");
                if argv.reference {
                    let gold = ds.tags().to_str(seq.labels[i]).unwrap_or("");
                    writeln!(out, "{word}\t{gold}\t{tag}").expect("failed to write");
                } else {
                    writeln!(out, "{word}\t{tag}").expect("failed to write");
                }
            }
            writeln!(out).expect("failed to write");
        }
    }
    if argv.evaluate {
        evaluation.evaluate();
        writeln!(out, "{}", evaluation).expect("failed to write");
        let sec = begin.elapsed().as_secs_f64();
        writeln!(out, "Elapsed time: {sec:.6} [sec] ({:.1} [instance/sec])", ds.len() as f64 / sec)
            .expect("failed to write");
    }
}
