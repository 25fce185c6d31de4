//! Real codecs driven through transcoding streams.
//!
//! This suite covers:
//! 1. Reader and writer round trips for every algorithm
//! 2. Small buffers and trickling resources
//! 3. Chained codecs
//! 4. Concatenated members and corrupt input

use std::io::{Read, Write};

use codecs::base64::{Base64Decoder, Base64Encoder};
use codecs::zlib::{ZlibCompression, ZlibDecompression};
use codecs::{CompressionAlgorithm, CompressionLevel, compress_to_vec, decompress_to_vec};
use proptest::prelude::*;
use test_support::{BoundedWriter, TrickleReader};
use transcode::{Codec, Error, Mode, StreamConfig, TranscodingStream};

/// Text with enough repetition to compress well.
fn corpus(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    pattern.iter().cycle().take(size).copied().collect()
}

/// Deterministic low-redundancy bytes.
fn noise(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (state >> 56) as u8
        })
        .collect()
}

fn encode_with_writer<C: Codec>(codec: C, data: &[u8], config: StreamConfig) -> Vec<u8> {
    let mut stream = TranscodingStream::with_config(codec, Vec::new(), config).expect("writer");
    stream.write_all(data).expect("write");
    stream.finish().expect("finish");
    stream.into_inner()
}

fn decode_with_reader<C: Codec>(codec: C, data: &[u8], config: StreamConfig) -> Vec<u8> {
    let mut stream = TranscodingStream::with_config(codec, data, config).expect("reader");
    let mut out = Vec::new();
    stream.read_to_end(&mut out).expect("read");
    stream.close().expect("close");
    out
}

// =============================================================================
// SECTION 1: Round trips
// =============================================================================

#[test]
fn writer_then_reader_round_trips_every_algorithm() {
    let data = corpus(20_000);
    let config = StreamConfig::default();
    for &algorithm in CompressionAlgorithm::available() {
        let encoded = encode_with_writer(algorithm.encoder(CompressionLevel::Default), &data, config);
        let decoded = decode_with_reader(algorithm.decoder(), &encoded, config);
        assert_eq!(decoded, data, "{algorithm}");
    }
}

#[test]
fn stream_output_matches_one_shot_helpers() {
    let data = noise(3000, 7);
    for &algorithm in CompressionAlgorithm::available() {
        let streamed = encode_with_writer(
            algorithm.encoder(CompressionLevel::Fast),
            &data,
            StreamConfig::new().buffer_size(128),
        );
        assert_eq!(
            decompress_to_vec(&streamed, algorithm).expect("decode"),
            data,
            "{algorithm}"
        );
        let one_shot =
            compress_to_vec(&data, algorithm, CompressionLevel::Fast).expect("encode");
        assert_eq!(
            decode_with_reader(algorithm.decoder(), &one_shot, StreamConfig::default()),
            data,
            "{algorithm}"
        );
    }
}

#[test]
fn base64_writer_emits_padded_text() {
    let encoded = encode_with_writer(Base64Encoder::new(), b"fooba", StreamConfig::default());
    assert_eq!(encoded, b"Zm9vYmE=");
}

#[test]
fn compression_levels_all_round_trip() {
    let data = corpus(8192);
    for numeric in 1..=9 {
        let level = CompressionLevel::from_numeric(numeric).expect("level");
        let encoded = compress_to_vec(&data, CompressionAlgorithm::Zlib, level).expect("encode");
        assert!(encoded.len() < data.len());
        assert_eq!(
            decompress_to_vec(&encoded, CompressionAlgorithm::Zlib).expect("decode"),
            data
        );
    }
}

// =============================================================================
// SECTION 2: Small buffers and trickling resources
// =============================================================================

#[test]
fn decoders_cope_with_one_byte_reads_and_tiny_buffers() {
    let data = noise(2048, 11);
    let config = StreamConfig::new().buffer_size(1);
    for &algorithm in CompressionAlgorithm::available() {
        let encoded =
            compress_to_vec(&data, algorithm, CompressionLevel::Default).expect("encode");
        let mut stream = TranscodingStream::with_config(
            algorithm.decoder(),
            TrickleReader::new(encoded, 1),
            config,
        )
        .expect("reader");
        let mut out = Vec::new();
        stream.read_to_end(&mut out).expect("read");
        assert_eq!(out, data, "{algorithm}");
    }
}

#[test]
fn encoders_cope_with_one_byte_writes() {
    let data = corpus(5000);
    for &algorithm in CompressionAlgorithm::available() {
        let mut sink = BoundedWriter::new(1);
        let mut stream = TranscodingStream::with_config(
            algorithm.encoder(CompressionLevel::Default),
            &mut sink,
            StreamConfig::new().buffer_size(16),
        )
        .expect("writer");
        for chunk in data.chunks(7) {
            stream.write_all(chunk).expect("write");
        }
        stream.close().expect("close");
        drop(stream);
        assert!(sink.is_closed());
        assert_eq!(
            decompress_to_vec(sink.data(), algorithm).expect("decode"),
            data,
            "{algorithm}"
        );
    }
}

// =============================================================================
// SECTION 3: Chained codecs
// =============================================================================

#[test]
fn zlib_inside_base64_round_trips_through_chains() {
    let data = corpus(10_000);
    for share in [true, false] {
        let config = StreamConfig::new().buffer_size(64).share_buffers(share);

        let mut text = Vec::new();
        let base64 =
            TranscodingStream::with_config(Base64Encoder::new(), &mut text, config).expect("base64");
        let mut zlib = TranscodingStream::with_config(
            ZlibCompression::new(CompressionLevel::Best),
            base64,
            config,
        )
        .expect("zlib");
        zlib.write_all(&data).expect("write");
        zlib.close().expect("close");
        drop(zlib);
        assert!(text.iter().all(|byte| byte.is_ascii_alphanumeric() || b"+/=".contains(byte)));

        let base64 =
            TranscodingStream::with_config(Base64Decoder::new(), &text[..], config).expect("base64");
        let mut zlib =
            TranscodingStream::with_config(ZlibDecompression::new(), base64, config).expect("zlib");
        let mut decoded = Vec::new();
        zlib.read_to_end(&mut decoded).expect("read");
        assert_eq!(decoded, data, "share_buffers = {share}");
    }
}

// =============================================================================
// SECTION 4: Members and corrupt input
// =============================================================================

#[test]
fn concatenated_zlib_members_need_the_option() {
    let first = compress_to_vec(b"first ", CompressionAlgorithm::Zlib, CompressionLevel::Fast)
        .expect("encode");
    let second = compress_to_vec(b"second", CompressionAlgorithm::Zlib, CompressionLevel::Fast)
        .expect("encode");
    let joined = [first, second].concat();

    let all = decode_with_reader(
        ZlibDecompression::new(),
        &joined,
        StreamConfig::new().concatenated(true),
    );
    assert_eq!(all, b"first second");

    let only_first = decode_with_reader(ZlibDecompression::new(), &joined, StreamConfig::default());
    assert_eq!(only_first, b"first ");
}

#[cfg(feature = "zstd")]
#[test]
fn concatenated_zstd_frames_decode_as_one_stream() {
    let frames: Vec<u8> = [&b"alpha "[..], b"beta ", b"gamma"]
        .iter()
        .flat_map(|part| {
            compress_to_vec(part, CompressionAlgorithm::Zstd, CompressionLevel::Default)
                .expect("encode")
        })
        .collect();
    let decoded = decode_with_reader(
        CompressionAlgorithm::Zstd.decoder(),
        &frames,
        StreamConfig::new().buffer_size(8).concatenated(true),
    );
    assert_eq!(decoded, b"alpha beta gamma");
}

#[test]
fn end_token_closes_a_zlib_member_per_block() {
    let mut stream =
        TranscodingStream::new(ZlibCompression::new(CompressionLevel::Default), Vec::new())
            .expect("writer");
    stream.try_write(b"block one;").expect("write");
    stream.write_end().expect("end");
    stream.try_write(b"block two").expect("write");
    stream.finish().expect("finish");
    let encoded = stream.into_inner();

    let decoded =
        decode_with_reader(ZlibDecompression::new(), &encoded, StreamConfig::new().concatenated(true));
    assert_eq!(decoded, b"block one;block two");
}

#[test]
fn corrupt_input_panics_the_reader() {
    let mut encoded = compress_to_vec(&corpus(4096), CompressionAlgorithm::Zlib, CompressionLevel::Default)
        .expect("encode");
    let middle = encoded.len() / 2;
    encoded[middle] ^= 0xff;
    encoded[middle + 1] ^= 0xff;

    let mut stream =
        TranscodingStream::new(ZlibDecompression::new(), &encoded[..]).expect("reader");
    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).expect_err("corrupt");
    assert!(
        matches!(Error::from_io(&err), Some(Error::Codec(_))),
        "unexpected error {err:?}"
    );
    assert_eq!(stream.mode(), Mode::Panicked);
    stream.close().expect("close");
}

#[test]
fn truncated_input_is_reported_at_end_of_data() {
    let encoded = compress_to_vec(&corpus(1000), CompressionAlgorithm::Deflate, CompressionLevel::Default)
        .expect("encode");
    let mut stream =
        TranscodingStream::new(ZlibDecompression::deflate(), &encoded[..encoded.len() / 2])
            .expect("reader");
    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).expect_err("truncated");
    let error = Error::from_io(&err).expect("stream error");
    assert_eq!(
        error.codec_error().map(ToString::to_string).as_deref(),
        Some("compressed stream is truncated")
    );
}

proptest! {
    #[test]
    fn every_algorithm_round_trips_at_any_buffer_size(
        data in proptest::collection::vec(any::<u8>(), 0..=2048),
        buffer_size in 1usize..=256,
        index in any::<prop::sample::Index>(),
    ) {
        let algorithms = CompressionAlgorithm::available();
        let algorithm = algorithms[index.index(algorithms.len())];
        let config = StreamConfig::new().buffer_size(buffer_size);
        let encoded = encode_with_writer(algorithm.encoder(CompressionLevel::Fast), &data, config);
        let decoded = decode_with_reader(algorithm.decoder(), &encoded, config);
        prop_assert_eq!(decoded, data);
    }
}
