use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bitstep::config::Library;
use bitstep::engine::{AudioClock, NoteSink};
use bitstep::error::ExportError;
use bitstep::export::Exporter;
use bitstep::profile::BitMode;
use bitstep::sequencing::NoteEvent;
use bitstep::session::{Notification, Session};

const RATE: u32 = 8_000;

struct Idle;

impl AudioClock for Idle {
    fn now(&self) -> f64 {
        0.0
    }
}

impl NoteSink for Idle {
    fn schedule(&mut self, _event: NoteEvent) {}
    fn set_bit_mode(&mut self, _mode: BitMode) {}
    fn silence(&mut self) {}
}

fn session(style: &str) -> Session<Idle, Idle> {
    let mut session = Session::new(Library::builtin(), Arc::new(Idle), Idle, 1234);
    session.set_exporter(Exporter::new(RATE));
    session.generate(style);
    session
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bitstep-{}-{name}.wav", std::process::id()))
}

#[test]
fn exported_file_reads_back() {
    let path = scratch("readback");
    let mut session = session("overworld");
    session.set_tempo(150.0).unwrap();
    let summary = session.export_now(&path, Some(3.25)).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(u64::from(reader.duration()), summary.frames);
    assert_eq!(summary.frames, 26_000);

    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len() as u64, summary.frames * 2);
    assert!(samples.iter().any(|&s| s != 0), "export is silent");
    std::fs::remove_file(&path).ok();
}

#[test]
fn every_era_exports() {
    for tier in [8, 16, 32] {
        let path = scratch(&format!("era{tier}"));
        let mut session = session("boss");
        session.set_bit_mode(tier);
        let summary = session.export_now(&path, Some(1.0)).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(u64::from(reader.duration()), summary.frames);
        std::fs::remove_file(&path).ok();
    }
}

#[test]
fn cleared_pattern_exports_silence() {
    let path = scratch("silence");
    let mut session = session("town");
    session.clear();
    session.export_now(&path, None).unwrap();
    let reader = hound::WavReader::open(&path).unwrap();
    assert!(reader.into_samples::<i16>().all(|s| s.unwrap() == 0));
    std::fs::remove_file(&path).ok();
}

#[test]
fn background_export_notifies() {
    let path = scratch("background");
    let session = session("space");
    let notifications = session.notifications();
    let handle = session.export_to(path.clone(), Some(0.5)).unwrap();
    handle.join().unwrap();

    match notifications.recv_timeout(Duration::from_secs(5)).unwrap() {
        Notification::ExportComplete { path: done, summary } => {
            assert_eq!(done, path);
            assert_eq!(summary.frames, 4_000);
        }
        other => panic!("unexpected notification {other:?}"),
    }
    std::fs::remove_file(&path).ok();
}

#[test]
fn bad_requests_fail_synchronously() {
    let mut session = session("duel");
    assert!(matches!(
        session.export_to(scratch("never"), Some(-1.0)),
        Err(ExportError::InvalidDuration(_))
    ));
    assert!(session.set_tempo(0.0).is_err());
    assert!(!scratch("never").exists());
}
