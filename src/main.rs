use std::{io::stdout, path::PathBuf, time::Instant};

use clap::Parser;
use hmmtag::{DecodeOpt, Dataset, Evaluator, Model};

/// Fit an HMM tagger on a training corpus and evaluate it on held-out data
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// training corpus (word<TAB>tag per line, blank line between sentences)
    #[arg(long, value_name = "FILE")]
    train: PathBuf,
    /// tagged development corpus to report accuracy on
    #[arg(long, value_name = "FILE")]
    dev: Option<PathBuf>,
    /// corpus to tag; tags in the file are optional
    #[arg(long, value_name = "FILE")]
    test: Option<PathBuf>,
    /// also report accuracy on the training corpus
    #[arg(long)]
    eval_train: bool,
    /// print every token with its predicted tag
    #[arg(long)]
    print_pred: bool,
    /// print the trellis of every sentence
    #[arg(long)]
    trellis: bool,
    /// compute the cumulative observation probability of every sentence
    #[arg(long)]
    cumulative: bool,
    /// write the trained model to a file (MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<PathBuf>,
}

impl Argv {
    fn decode_opt(&self) -> DecodeOpt {
        let mut opt = DecodeOpt::empty();
        opt.set(DecodeOpt::PREDICTIONS, self.print_pred);
        opt.set(DecodeOpt::TRELLIS, self.trellis);
        opt.set(DecodeOpt::CUMULATIVE, self.cumulative);
        opt
    }
}

fn report(name: &str, model: &Model, ds: &Dataset, opt: DecodeOpt) {
    eprintln!("{name} dataset:");
    let begin = Instant::now();
    let evaluation = Evaluator::new(&model.hmm, opt)
        .evaluate(ds, &mut stdout().lock())
        .expect("failed to evaluate");
    match evaluation.item_accuracy() {
        Some(acc) => eprintln!("- Accuracy: {:.2}%", acc * 100.0),
        None => eprintln!("- Accuracy: N/A (empty dataset)"),
    }
    log::info!("{name} took: {:?}", begin.elapsed());
}

fn main() {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    let opt = argv.decode_opt();

    eprintln!("Loading data");
    let data_train = Dataset::from_path(&argv.train).expect("failed to read training data");
    eprintln!("Fitting the model");
    let begin = Instant::now();
    let model = Model::train(&data_train).expect("failed to train");
    log::info!("training took: {:?}", begin.elapsed());
    if let Some(path) = &argv.model {
        model.save(path).expect("failed to write model");
    }

    if argv.eval_train {
        report("Train", &model, &data_train, opt);
    }
    if let Some(path) = &argv.dev {
        let data_eval = Dataset::from_path_extending(&data_train, path).expect("failed to read dev data");
        report("Dev", &model, &data_eval, opt);
    }
    if let Some(path) = &argv.test {
        let data_test = Dataset::from_path_extending(&data_train, path).expect("failed to read test data");
        eprintln!("Test dataset:");
        Evaluator::new(&model.hmm, opt | DecodeOpt::PREDICTIONS)
            .evaluate(&data_test, &mut stdout().lock())
            .expect("failed to tag test data");
    }
}
