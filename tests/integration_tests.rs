//! Integration Tests
//!
//! End-to-end renders from dump files on disk to a FLAC file, verified by
//! decoding the output with an independent decoder.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tempfile::{tempdir, TempDir};

use aymix::engine::{dump_path, output_path, render_pcm, Channel, ChannelDumps};
use aymix::{render, AymixError};

/// Decoded stream: channel count, sample rate and interleaved samples
struct Decoded {
    channels: usize,
    sample_rate: u32,
    samples: Vec<i32>,
}

fn write_dumps(dir: &TempDir, name: &str, dumps: &ChannelDumps) -> PathBuf {
    let base = dir.path().join(name);
    for channel in Channel::ALL {
        let bytes: Vec<u8> = dumps
            .channel(channel)
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        fs::write(dump_path(&base, channel), bytes).unwrap();
    }
    base
}

fn decode_flac(path: &Path) -> Decoded {
    let file = File::open(path).unwrap();
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("flac");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .unwrap();
    let mut format = probed.format;

    let track = format.default_track().unwrap();
    let track_id = track.id;
    let channels = track.codec_params.channels.unwrap().count();
    let sample_rate = track.codec_params.sample_rate.unwrap();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .unwrap();

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => panic!("Failed to read packet: {}", e),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).unwrap();
        let mut buffer = SampleBuffer::<i32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    Decoded {
        channels,
        sample_rate,
        samples,
    }
}

/// Decoded samples must equal the rendered PCM, in either native 16-bit
/// or left-aligned 32-bit representation
fn assert_lossless(decoded: &Decoded, left: &[i16], right: &[i16]) {
    let expected: Vec<i32> = left
        .iter()
        .zip(right.iter())
        .flat_map(|(&l, &r)| [i32::from(l), i32::from(r)])
        .collect();

    assert_eq!(decoded.samples.len(), expected.len());
    if decoded.samples != expected {
        let aligned: Vec<i32> = expected.iter().map(|&s| s << 16).collect();
        assert!(
            decoded.samples == aligned,
            "decoded samples differ from rendered PCM"
        );
    }
}

fn square_wave(len: usize, half_period: usize, high: u16) -> Vec<u16> {
    (0..len)
        .map(|i| if (i / half_period) % 2 == 0 { high } else { 0 })
        .collect()
}

// === Full Pipeline Tests ===

#[test]
fn test_render_constant_channel() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(vec![65535; 875], vec![0; 875], vec![0; 875]);
    let base = write_dumps(&dir, "tune", &dumps);

    let report = render(&base).unwrap();
    assert_eq!(report.output, output_path(&base));
    assert_eq!(report.source_lengths, [875, 875, 875]);
    assert_eq!(report.frames, 192);
    assert!(report.peak > 0.0);
    assert_eq!(report.encoded_bytes as u64, fs::metadata(&report.output).unwrap().len());

    let decoded = decode_flac(&report.output);
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.sample_rate, 48_000);
    assert_eq!(decoded.samples.len(), 192 * 2);

    let pcm = render_pcm(&dumps).unwrap();
    assert_lossless(&decoded, &pcm.left, &pcm.right);
    assert_eq!(pcm.sha256(), report.pcm_sha256);
}

#[test]
fn test_render_multi_frame_tone() {
    let dir = tempdir().unwrap();
    let len = 875 * 60;
    let dumps = ChannelDumps::new(
        square_wave(len, 248, 30_000),
        square_wave(len, 331, 18_000),
        square_wave(len, 497, 45_000),
    );
    let base = write_dumps(&dir, "chord", &dumps);

    let report = render(&base).unwrap();
    assert_eq!(report.frames, 11_520);

    let decoded = decode_flac(&report.output);
    let pcm = render_pcm(&dumps).unwrap();
    assert_lossless(&decoded, &pcm.left, &pcm.right);

    // Normalized to full scale
    let loudest = pcm
        .left
        .iter()
        .chain(pcm.right.iter())
        .map(|s| s.unsigned_abs())
        .max()
        .unwrap();
    assert_eq!(loudest, 32767);

    // A is louder on the left and C on the right, so the channels differ
    assert!(pcm.left != pcm.right);
}

#[test]
fn test_render_silence() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(vec![0; 8750], vec![0; 8750], vec![0; 8750]);
    let base = write_dumps(&dir, "quiet", &dumps);

    let report = render(&base).unwrap();
    assert_eq!(report.peak, 0.0);
    assert_eq!(report.frames, 1920);

    let decoded = decode_flac(&report.output);
    assert_eq!(decoded.samples.len(), 1920 * 2);
    assert!(decoded.samples.iter().all(|&s| s == 0));
}

#[test]
fn test_ragged_dumps_truncate_to_shortest() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(
        square_wave(4000, 100, 20_000),
        square_wave(1750, 100, 20_000),
        square_wave(9000, 100, 20_000),
    );
    let base = write_dumps(&dir, "ragged", &dumps);

    let report = render(&base).unwrap();
    assert_eq!(report.source_lengths, [4000, 1750, 9000]);
    assert_eq!(report.frames, 384);
    assert_eq!(decode_flac(&report.output).samples.len(), 384 * 2);
}

#[test]
fn test_render_is_deterministic() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(
        square_wave(20_000, 300, 50_000),
        vec![10_000; 20_000],
        square_wave(20_000, 77, 5_000),
    );
    let base = write_dumps(&dir, "again", &dumps);

    let first_report = render(&base).unwrap();
    let first = fs::read(&first_report.output).unwrap();
    let second_report = render(&base).unwrap();
    let second = fs::read(&second_report.output).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

// === Failure Tests ===

#[test]
fn test_missing_dump_writes_nothing() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("partial");
    fs::write(dump_path(&base, Channel::A), [0u8; 64]).unwrap();
    fs::write(dump_path(&base, Channel::B), [0u8; 64]).unwrap();

    let err = render(&base).unwrap_err();
    match err {
        AymixError::InputNotFound { ref path, .. } => {
            assert_eq!(path, &dump_path(&base, Channel::C));
        }
        ref other => panic!("Expected InputNotFound, got {:?}", other),
    }
    assert!(!output_path(&base).exists());
}

#[test]
fn test_empty_dump_writes_nothing() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(vec![1; 1000], vec![1; 1000], Vec::new());
    let base = write_dumps(&dir, "empty", &dumps);

    let err = render(&base).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_INPUT");
    assert!(!output_path(&base).exists());
    // Only the three dumps remain
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[test]
fn test_failed_render_keeps_previous_output() {
    let dir = tempdir().unwrap();
    let dumps = ChannelDumps::new(vec![100; 875], vec![200; 875], vec![300; 875]);
    let base = write_dumps(&dir, "keep", &dumps);
    let report = render(&base).unwrap();
    let previous = fs::read(&report.output).unwrap();

    fs::remove_file(dump_path(&base, Channel::B)).unwrap();
    assert!(render(&base).is_err());
    assert_eq!(fs::read(output_path(&base)).unwrap(), previous);
}
