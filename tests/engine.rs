//! Scheduler and session behavior over scripted sources and sinks.

mod common;

use common::{CountingSource, fake_session};
use pmodecode::{BufferSink, ChunkSource, CycleOutcome, DecodeScheduler, SessionPhase};

#[test]
fn persistent_underrun_is_not_an_error() {
    let (session, state) = fake_session(44_100, 4);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = ChunkSource::new();
    let mut sink = BufferSink::new(1 << 16);

    for _ in 0..5 {
        assert_eq!(scheduler.cycle(&mut source, &mut sink), CycleOutcome::Stepped);
        assert_eq!(scheduler.phase(), SessionPhase::Underrun);
    }

    let flags = state.borrow().flags;
    assert!(flags.is_underrun());
    assert!(!flags.is_error());
    assert!(!flags.is_end_of_stream());
}

#[test]
fn underrun_recovers_once_data_arrives() {
    let (session, _state) = fake_session(44_100, 4);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = ChunkSource::new();
    let mut sink = BufferSink::new(1 << 16);

    assert_eq!(scheduler.cycle(&mut source, &mut sink), CycleOutcome::Stepped);
    assert_eq!(scheduler.phase(), SessionPhase::Underrun);

    source.push(&[100, 100, 100, 100]);
    assert_eq!(scheduler.cycle(&mut source, &mut sink), CycleOutcome::Stepped);
    assert_eq!(scheduler.phase(), SessionPhase::Running);

    // mono 16-bit input lands duplicated and scaled on both channels
    let frames = sink.take_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].stereo(), &[[100 << 16, 100 << 16]; 4]);
    assert_eq!(frames[0].sample_rate(), 44_100);
}

#[test]
fn drained_source_ends_the_session_without_error() {
    let (session, state) = fake_session(44_100, 4);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = ChunkSource::with_bytes(&[1, 2, 3, 4, 5, 6]);
    source.finish();
    let mut sink = BufferSink::new(1 << 16);

    let mut cycles = 0;
    loop {
        cycles += 1;
        assert!(cycles < 32, "session never terminated");
        if scheduler.cycle(&mut source, &mut sink) == CycleOutcome::Terminal {
            break;
        }
    }

    assert_eq!(scheduler.phase(), SessionPhase::EndOfStream);
    assert!(!state.borrow().flags.is_error());

    let decoded: usize = sink.frames().iter().map(|f| f.len()).sum();
    assert_eq!(decoded, 6);
}

#[test]
fn backpressure_skips_the_cycle_entirely() {
    let (session, state) = fake_session(44_100, 4);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = CountingSource::new(ChunkSource::with_bytes(&[1; 64]));
    let mut sink = BufferSink::new(0);

    let flags_before = state.borrow().flags;
    for _ in 0..10 {
        assert_eq!(
            scheduler.cycle(&mut source, &mut sink),
            CycleOutcome::Backpressure
        );
    }

    assert_eq!(source.reads, 0);
    assert_eq!(state.borrow().steps, 0);
    assert_eq!(state.borrow().flags, flags_before);
    assert_eq!(scheduler.phase(), SessionPhase::Started);
}

#[test]
fn sink_is_never_overrun() {
    let (session, _state) = fake_session(44_100, 4);
    // room for exactly two 4-pair frames
    let budget = 2 * 4 * pmodecode::STEREO_FRAME_BYTES;
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = ChunkSource::with_bytes(&[7; 64]);
    let mut sink = BufferSink::new(budget);

    for _ in 0..10 {
        scheduler.cycle(&mut source, &mut sink);
        assert!(sink.buffered_bytes() <= budget);
    }

    assert_eq!(sink.frames().len(), 2);
    assert_eq!(
        scheduler.cycle(&mut source, &mut sink),
        CycleOutcome::Backpressure
    );
}

#[test]
fn error_is_sticky_and_halts_stepping() {
    let (session, state) = fake_session(44_100, 4);
    state.borrow_mut().fail_on_step = Some(2);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = CountingSource::new(ChunkSource::with_bytes(&[1; 64]));
    let mut sink = BufferSink::new(1 << 16);

    assert_eq!(scheduler.cycle(&mut source, &mut sink), CycleOutcome::Stepped);
    assert_eq!(scheduler.phase(), SessionPhase::Running);

    // the failing step still returns true; the flag is observed next
    assert_eq!(scheduler.cycle(&mut source, &mut sink), CycleOutcome::Stepped);
    assert_eq!(scheduler.phase(), SessionPhase::Error);

    let reads_after_error = source.reads;
    for _ in 0..3 {
        assert_eq!(
            scheduler.cycle(&mut source, &mut sink),
            CycleOutcome::Terminal
        );
    }
    assert_eq!(state.borrow().steps, 2);
    assert_eq!(source.reads, reads_after_error);
    assert!(state.borrow().flags.is_error());
}

#[test]
fn rediscovered_rate_shortens_the_period() {
    let (session, state) = fake_session(44_100, 4);
    let scheduler = DecodeScheduler::new(Box::new(session));
    assert_eq!(scheduler.preferred_period(), 8);

    // stream metadata mid-session reveals a high-rate stream
    state.borrow_mut().sample_rate = 96_000;
    assert_eq!(scheduler.preferred_period(), 4);
    assert_eq!(scheduler.session().sample_rate(), 96_000);
}

#[test]
fn stop_is_idempotent() {
    let (session, state) = fake_session(44_100, 4);
    let mut scheduler = DecodeScheduler::new(Box::new(session));
    let mut source = ChunkSource::new();
    let mut sink = BufferSink::new(1 << 16);

    scheduler.stop();
    scheduler.stop();
    assert_eq!(scheduler.phase(), SessionPhase::Stopped);
    assert_eq!(state.borrow().stops, 2);
    assert_eq!(
        scheduler.cycle(&mut source, &mut sink),
        CycleOutcome::Terminal
    );
    assert_eq!(state.borrow().steps, 0);
}
