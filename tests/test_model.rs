use std::fs::File;
use std::io::Write;

use hmmtag::{evaluate, Dataset, Model, TrainOpt, Trainer};

const TRAIN: &str = "Der\tART\nHund\tNN\nläuft\tVVFIN\n.\t$.\n\nDie\tART\nKatze\tNN\nschläft\tVVFIN\n.\t$.\n\nDer\tART\nHund\tNN\nschläft\tVVFIN\n.\t$.\n";

#[test]
fn save_and_load() {
    env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init().ok();
    let ds = Dataset::try_from(TRAIN).unwrap();
    let model = Model::train(&ds).unwrap();

    let fpath = std::env::temp_dir().join(format!("hmmtag-{}.json", std::process::id()));
    model.save(&fpath).unwrap();
    let loaded = Model::from_path(&fpath).unwrap();
    std::fs::remove_file(&fpath).ok();

    assert_eq!(loaded.hmm, model.hmm);
    assert_eq!(loaded.words, model.words);
    assert_eq!(loaded.tags, model.tags);
    let e = evaluate(&loaded.hmm, &ds).unwrap();
    assert_eq!(e.item_accuracy(), Some(1.0));
}

#[test]
fn tag_held_out_file() {
    let ds = Dataset::try_from(TRAIN).unwrap();
    let model = Model::train(&ds).unwrap();

    let fpath = std::env::temp_dir().join(format!("hmmtag-dev-{}.tt", std::process::id()));
    let mut f = File::create(&fpath).unwrap();
    write!(f, "Die\tART\nKatze\tNN\nläuft\tVVFIN\n.\t$.\n\n\nEin\tART\nHund\tNN\n").unwrap();
    drop(f);
    let dev = Dataset::from_path_extending(&ds, &fpath).unwrap();
    std::fs::remove_file(&fpath).ok();

    assert_eq!(dev.len(), 2);
    assert_eq!(dev.words().count(), Some(8));
    assert_eq!(ds.words().count(), Some(7));
    // "Ein" is unseen, the start distribution still picks ART
    let e = evaluate(&model.hmm, &dev).unwrap();
    assert_eq!(e.item_accuracy(), Some(1.0));
}

#[test]
fn custom_scale() {
    let ds = Dataset::try_from(TRAIN).unwrap();
    let hmm = Trainer::new(TrainOpt { scale_factor: 1.0 }).train(&ds).unwrap();
    assert!((hmm.start().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    let scaled = Trainer::default().train(&ds).unwrap();
    assert_eq!(hmm.decode(&[0, 1, 2, 3]).unwrap(), scaled.decode(&[0, 1, 2, 3]).unwrap());
}

#[test]
fn missing_file() {
    assert!(matches!(
        Dataset::from_path("tests/does-not-exist.tt"),
        Err(hmmtag::Error::Io(..))
    ));
    assert!(matches!(Model::from_path("tests/does-not-exist.json"), Err(hmmtag::Error::Io(..))));
}

#[test]
fn malformed_model_file() {
    let fpath = std::env::temp_dir().join(format!("hmmtag-bad-{}.json", std::process::id()));
    std::fs::write(
        &fpath,
        r#"{"hmm":{"num_states":2,"num_obs":2,"start":[1.0],"trans":[1.0],"emiss":[1.0]},"words":["a","b"],"tags":["X","Y"]}"#,
    )
    .unwrap();
    let loaded = Model::from_path(&fpath);
    std::fs::remove_file(&fpath).ok();
    assert!(matches!(loaded, Err(hmmtag::Error::Json(..))));
}
