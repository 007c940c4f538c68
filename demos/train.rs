use std::path::PathBuf;

use clap::Parser;
use hmmtag::{Dataset, Model, TrainOpt, Trainer, SCALE_FACTOR};

/// Train an HMM tagger on the data sets (DATA) and write it to a file (MODEL)
#[derive(Debug, Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Argv {
    #[arg(short, long, value_name = "MODEL")]
    model: PathBuf,
    /// value every row of the trained tables sums to
    #[arg(short, long, default_value_t = SCALE_FACTOR)]
    scale: f64,
    #[arg(required = true, value_name = "DATA")]
    datasets: Vec<PathBuf>,
}

fn main() {
    env_logger::init();

    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);
    let mut ds = Dataset::default();
    for fpath in &argv.datasets {
        let f = std::fs::File::open(fpath).expect("failed to open data set");
        ds.read_file(f).expect("failed to read data set");
    }
    log::info!("read {} sentences, {} items", ds.len(), ds.total_items());
    let trainer = Trainer::new(TrainOpt { scale_factor: argv.scale });
    let model = Model::train_with(&trainer, &ds).expect("failed to train");
    model.save(&argv.model).expect("failed to write model");
}
