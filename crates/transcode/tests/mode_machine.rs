//! Mode machine and failure isolation.
//!
//! This suite covers:
//! 1. Direction locking on first use
//! 2. Every operation on a closed stream
//! 3. Codec failures at each stage and the panicked mode
//! 4. Finalization accounting on close and drop

use std::io::Read;

use test_support::{BoundedWriter, Call, Doubling, FailAt, Failing, Recording};
use transcode::{Direction, Error, Mode, StreamConfig, TranscodingStream};

fn assert_protocol(result: Result<impl std::fmt::Debug, Error>, expected: Mode) {
    match result {
        Err(Error::Protocol { mode, .. }) => assert_eq!(mode, expected),
        other => panic!("expected a protocol error in {expected} mode, got {other:?}"),
    }
}

fn assert_broken(result: Result<impl std::fmt::Debug, Error>) {
    match result {
        Err(Error::Broken(error)) => assert!(error.to_string().contains("failed")),
        other => panic!("expected a broken stream, got {other:?}"),
    }
}

// =============================================================================
// SECTION 1: Direction locking
// =============================================================================

#[test]
fn fresh_stream_is_idle_and_open() {
    let stream = TranscodingStream::new(Doubling, &b"abc"[..]).expect("stream");
    assert_eq!(stream.mode(), Mode::Idle);
    assert!(stream.is_open());
}

#[test]
fn writing_stream_rejects_reads() {
    let mut stream = TranscodingStream::new(Doubling, Vec::new()).expect("stream");
    stream.try_write(b"a").expect("write");
    assert_eq!(stream.mode(), Mode::Writing);

    assert_protocol(stream.try_read(&mut [0u8; 4]), Mode::Writing);
    assert_protocol(stream.unread(b"x"), Mode::Writing);
    assert_protocol(stream.skip(1), Mode::Writing);
    assert_protocol(stream.is_eof(), Mode::Writing);
}

#[test]
fn reading_stream_rejects_writes() {
    let mut stream = TranscodingStream::new(Doubling, &b"abc"[..]).expect("stream");
    stream.try_read(&mut [0u8; 1]).expect("read");
    assert_eq!(stream.mode(), Mode::Reading);

    assert_protocol(stream.try_write(b"x"), Mode::Reading);
    assert_protocol(stream.write_end(), Mode::Reading);
    stream.try_flush().expect("flushing a reader does nothing");
}

#[test]
fn closing_an_idle_stream_never_starts_the_codec() {
    let codec = Recording::new(Doubling);
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, BoundedWriter::new(8)).expect("stream");
    stream.close().expect("close");
    assert_eq!(log.calls(), [Call::Initialize, Call::Finalize]);
    assert!(stream.get_ref().is_closed());
}

// =============================================================================
// SECTION 2: Closed streams
// =============================================================================

#[test]
fn every_operation_on_a_closed_stream_is_a_protocol_error() {
    let mut stream = TranscodingStream::new(Doubling, &b"abc"[..]).expect("stream");
    stream.close().expect("close");
    assert_eq!(stream.mode(), Mode::Closed);
    assert!(!stream.is_open());

    assert_protocol(stream.try_read(&mut [0u8; 4]), Mode::Closed);
    assert_protocol(stream.read_up_to(&mut [0u8; 4]), Mode::Closed);
    assert_protocol(stream.unread(b"x"), Mode::Closed);
    assert_protocol(stream.skip(1), Mode::Closed);
    assert_protocol(stream.is_eof(), Mode::Closed);
    assert_protocol(stream.try_write(b"x"), Mode::Closed);
    assert_protocol(stream.write_end(), Mode::Closed);
    assert_protocol(stream.try_flush(), Mode::Closed);
}

#[test]
fn closing_twice_is_harmless() {
    let codec = Recording::new(Doubling);
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, Vec::new()).expect("stream");
    stream.try_write(b"abc").expect("write");
    stream.close().expect("first close");
    stream.close().expect("second close");
    assert_eq!(log.finalized(), 1);
    drop(stream);
    assert_eq!(log.finalized(), 1);
}

#[test]
fn io_read_on_a_closed_stream_carries_the_protocol_error() {
    let mut stream = TranscodingStream::new(Doubling, &b"abc"[..]).expect("stream");
    stream.close().expect("close");
    let err = stream.read(&mut [0u8; 4]).expect_err("closed");
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::Protocol {
            mode: Mode::Closed,
            ..
        })
    ));
}

// =============================================================================
// SECTION 3: Codec failures
// =============================================================================

#[test]
fn failed_initialize_never_builds_a_stream() {
    let codec = Failing::new(FailAt::Initialize);
    let log = codec.log();
    let err = TranscodingStream::new(codec, Vec::new()).expect_err("initialize fails");
    assert!(matches!(err, Error::Initialize(_)));
    assert_eq!(log.calls(), [Call::Initialize]);
}

#[test]
fn failed_start_panics_the_stream() {
    let codec = Failing::new(FailAt::Start);
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, Vec::new()).expect("stream");

    let err = stream.try_write(b"abc").expect_err("start fails");
    assert!(matches!(err, Error::Codec(_)));
    assert_eq!(stream.mode(), Mode::Panicked);
    assert!(stream.is_open());
    assert_eq!(
        log.calls(),
        [Call::Initialize, Call::Start(Direction::Write), Call::Finalize]
    );
}

#[test]
fn failed_read_step_panics_the_stream() {
    let codec = Failing::new(FailAt::Process(0));
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, &b"payload"[..]).expect("stream");

    let err = stream.try_read(&mut [0u8; 8]).expect_err("process fails");
    match err {
        Error::Codec(error) => assert_eq!(error.to_string(), "process call 0 failed"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(stream.mode(), Mode::Panicked);
    assert_eq!(
        stream.error().map(ToString::to_string).as_deref(),
        Some("process call 0 failed")
    );
    assert_eq!(log.finalized(), 1);
    assert_eq!(log.processed(), 1);

    stream.close().expect("close");
    assert_eq!(log.processed(), 1);
    assert_eq!(log.finalized(), 1);
}

#[test]
fn panicked_stream_reports_broken_for_every_operation() {
    let codec = Failing::new(FailAt::Process(0));
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, &b"payload"[..]).expect("stream");
    stream.try_read(&mut [0u8; 8]).expect_err("process fails");
    let processed = log.processed();

    assert_broken(stream.try_read(&mut [0u8; 4]));
    assert_broken(stream.unread(b"x"));
    assert_broken(stream.skip(1));
    assert_broken(stream.is_eof());
    assert_broken(stream.try_write(b"x"));
    assert_broken(stream.write_end());
    assert_broken(stream.try_flush());

    stream.close().expect("close a panicked stream");
    assert_eq!(stream.mode(), Mode::Closed);
    assert_eq!(log.processed(), processed);
}

#[test]
fn write_failure_surfaces_on_close_and_still_closes() {
    let codec = Failing::new(FailAt::Process(0));
    let log = codec.log();
    let mut sink = BoundedWriter::new(16);
    let mut stream = TranscodingStream::new(codec, &mut sink).expect("stream");

    stream.try_write(b"buffered").expect("write only buffers");
    let err = stream.close().expect_err("encoding fails");
    assert!(matches!(err, Error::Codec(_)));
    assert_eq!(stream.mode(), Mode::Closed);
    assert_eq!(log.finalized(), 1);
    drop(stream);
    assert!(sink.is_closed());
    assert!(sink.data().is_empty());
}

#[test]
fn later_write_step_failure_keeps_earlier_output() {
    let config = StreamConfig::new().buffer_size(2);
    let mut sink = Vec::new();
    let mut stream =
        TranscodingStream::with_config(Failing::new(FailAt::Process(2)), &mut sink, config)
            .expect("stream");

    let err = stream.try_write(b"abcdefgh").expect_err("third step fails");
    assert!(matches!(err, Error::Codec(_)));
    assert_eq!(stream.mode(), Mode::Panicked);
    stream.close().expect("close");
    drop(stream);
    assert!(sink.starts_with(b"ab"));
}

#[test]
fn failed_finalize_is_reported_by_close() {
    let codec = Failing::new(FailAt::Finalize);
    let log = codec.log();
    let mut sink = BoundedWriter::new(16);
    let mut stream = TranscodingStream::new(codec, &mut sink).expect("stream");

    stream.try_write(b"kept").expect("write");
    let err = stream.close().expect_err("finalize fails");
    assert!(matches!(err, Error::Finalize(_)));
    assert_eq!(stream.mode(), Mode::Closed);
    stream.close().expect("already closed");
    drop(stream);

    assert_eq!(log.finalized(), 1);
    assert_eq!(sink.data(), b"kept");
    assert!(sink.is_closed());
}

// =============================================================================
// SECTION 4: Finalization on drop
// =============================================================================

#[test]
fn dropping_finalizes_once_and_discards_unflushed_data() {
    let codec = Recording::new(Doubling);
    let log = codec.log();
    let mut sink = Vec::new();
    {
        let mut stream = TranscodingStream::new(codec, &mut sink).expect("stream");
        stream.try_write(b"lost").expect("write");
    }
    assert_eq!(log.finalized(), 1);
    assert!(sink.is_empty());
}

#[test]
fn dropping_a_panicked_stream_does_not_finalize_again() {
    let codec = Failing::new(FailAt::Start);
    let log = codec.log();
    {
        let mut stream = TranscodingStream::new(codec, &b"abc"[..]).expect("stream");
        stream.try_read(&mut [0u8; 1]).expect_err("start fails");
    }
    assert_eq!(log.finalized(), 1);
}

#[test]
fn into_inner_after_finish_returns_the_resource() {
    let codec = Recording::new(Doubling);
    let log = codec.log();
    let mut stream = TranscodingStream::new(codec, BoundedWriter::new(4)).expect("stream");
    stream.try_write(b"ok").expect("write");
    stream.finish().expect("finish");
    assert_eq!(stream.mode(), Mode::Closed);

    let sink = stream.into_inner();
    assert_eq!(sink.data(), b"ookk");
    assert!(!sink.is_closed());
    assert_eq!(log.finalized(), 1);
}
