//! WAV codec tests against files written by hound

mod helpers;

use ebits_player::audio::{wav, AudioFormat};
use helpers::{generate_ramp_wav, generate_silent_wav, TestWav};
use tempfile::TempDir;

#[test]
fn test_decode_hound_silence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silent.wav");
    generate_silent_wav(&path, TestWav::mono16(), 1000).unwrap();

    let decoded = wav::decode(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(decoded.format, AudioFormat::new(1, 8000, 16));
    assert_eq!(decoded.fmt.byte_rate, 16000);
    assert_eq!(decoded.fmt.block_align, 2);
    assert_eq!(decoded.pcm.len(), 16000);
    assert!(decoded.pcm.iter().all(|&b| b == 0));
}

#[test]
fn test_decode_hound_stereo_ramp() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ramp.wav");
    let shape = TestWav {
        channels: 2,
        sample_rate: 22050,
        bits_per_sample: 16,
    };
    generate_ramp_wav(&path, shape, 10, -100).unwrap();

    let decoded = wav::decode(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(decoded.format, AudioFormat::new(2, 22050, 16));
    let samples: Vec<i16> = decoded
        .pcm
        .chunks_exact(2)
        .map(|p| i16::from_le_bytes([p[0], p[1]]))
        .collect();
    // 22050 Hz * 10 ms = 220 frames
    assert_eq!(samples.len(), 440);
    assert_eq!(&samples[..3], &[-100, -99, -98]);
}

#[test]
fn test_encoded_buffer_reads_back_with_hound() {
    let format = AudioFormat::new(2, 44100, 16);
    let pcm: Vec<u8> = [1i16, -1, 300, -300]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let bytes = wav::encode(&pcm, format).unwrap();

    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, -1, 300, -300]);
}

#[test]
fn test_round_trip_preserves_pcm_and_format() {
    let cases = [
        (AudioFormat::new(1, 8000, 8), vec![0u8, 127, 128, 255, 1]),
        (AudioFormat::new(2, 48000, 16), (0..64u8).collect::<Vec<u8>>()),
        (AudioFormat::new(1, 8000, 16), Vec::new()),
    ];
    for (format, pcm) in cases {
        let decoded = wav::decode(&wav::encode(&pcm, format).unwrap()).unwrap();
        assert_eq!(decoded.format, format);
        assert_eq!(decoded.pcm, pcm);
    }
}
