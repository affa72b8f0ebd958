use fskwave_core::{
    apply_noise, bits_to_bytes, bytes_to_bits, read_wav, write_wav, CarrierPair, ChannelNoise,
    Comparison, Decoder, Encoder, FrequencyBand, FskDemodulator, FskModulator, ModemConfig,
    ModemError, NoiseLevel, SymbolTiming,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config(sample_rate: u32, bitrate: f64, carriers: CarrierPair) -> ModemConfig {
    ModemConfig {
        sample_rate,
        bitrate,
        carriers,
        band: FrequencyBand::around(&carriers),
        ..ModemConfig::default()
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn round_trip(config: &ModemConfig, data: &[u8]) -> Vec<u8> {
    init_logging();
    let waveform = Encoder::new(config).expect("encoder").encode(data);
    Decoder::new(config)
        .expect("decoder")
        .decode(&waveform)
        .expect("decode")
        .bytes
}

#[test]
fn test_letter_a_at_9600_hz() {
    let config = config(9600, 1200.0, CarrierPair::BELL_202);
    let bits = bytes_to_bits(&[0x41]);
    assert_eq!(bits.as_str(), "01000001");

    let timing = SymbolTiming::from_bitrate(9600, 1200.0);
    let modulator = FskModulator::new(timing, CarrierPair::BELL_202).unwrap();
    let demodulator =
        FskDemodulator::new(timing, CarrierPair::BELL_202, FrequencyBand::BELL_202).unwrap();

    let waveform = modulator.modulate(&bits);
    assert_eq!(waveform.len(), 64);

    let decoded = demodulator.demodulate_bits(&waveform.samples);
    assert_eq!(decoded.as_str(), "01000001");
    assert_eq!(bits_to_bytes(decoded.as_str()), vec![0x41]);
    assert_eq!(round_trip(&config, &[0x41]), vec![0x41]);
}

#[test]
fn test_clean_round_trip_across_configurations() {
    let configs = [
        config(9600, 1200.0, CarrierPair::BELL_202),
        config(44100, 1200.0, CarrierPair::BELL_202),
        config(44100, 300.0, CarrierPair::BELL_202),
        config(8000, 100.0, CarrierPair::LEGACY),
        config(16000, 100.0, CarrierPair::LEGACY),
    ];
    let payloads: [&[u8]; 4] = [b"Hello, Audio Modem!", &[0x00, 0xFF, 0xAA, 0x55], b"", &[0x41]];

    for config in &configs {
        for payload in payloads {
            assert_eq!(
                round_trip(config, payload),
                payload,
                "round trip failed at {} Hz / {} bit/s",
                config.sample_rate,
                config.bitrate
            );
        }
    }
}

#[test]
fn test_clean_round_trip_random_bytes() {
    let config = ModemConfig::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let data: Vec<u8> = (0..64).map(|_| rng.gen()).collect();
    assert_eq!(round_trip(&config, &data), data);
}

#[test]
fn test_utf8_text_round_trip() {
    let config = ModemConfig::default();
    let waveform = Encoder::new(&config).unwrap().encode_text("こんにちは");
    let decoded = Decoder::new(&config).unwrap().decode(&waveform).unwrap();
    assert_eq!(decoded.text().unwrap(), "こんにちは");
}

#[test]
fn test_window_count_matches_ceiling() {
    let timing = SymbolTiming::from_bitrate(9600, 1200.0);
    let demodulator =
        FskDemodulator::new(timing, CarrierPair::BELL_202, FrequencyBand::BELL_202).unwrap();
    let per_symbol = timing.samples_per_symbol();

    for len in [0usize, 1, 7, 8, 9, 63, 64, 65, 100] {
        let samples = vec![0i16; len];
        let expected = (len + per_symbol - 1) / per_symbol;
        assert_eq!(demodulator.demodulate(&samples).len(), expected, "len {}", len);
    }
}

#[test]
fn test_low_noise_still_decodes() {
    let config = ModemConfig {
        noise_level: NoiseLevel::new(1).unwrap(),
        ..config(44100, 300.0, CarrierPair::BELL_202)
    };
    let data = b"noise tolerant";
    let waveform = Encoder::new(&config).unwrap().encode_noisy(data, Some(99));
    let decoded = Decoder::new(&config).unwrap().decode(&waveform).unwrap();
    assert_eq!(decoded.bytes, data);
}

#[test]
fn test_top_severities_complete_with_same_length() {
    init_logging();
    let base = config(9600, 1200.0, CarrierPair::BELL_202);
    let clean = Encoder::new(&base).unwrap().encode(&[0x41]);

    for level in [NoiseLevel::BAND_NOISE_THRESHOLD, NoiseLevel::MAX] {
        let level = NoiseLevel::new(level).unwrap();
        let mut noise = ChannelNoise::with_seed(level, base.band, 17);
        let noisy = noise.apply(&clean);
        assert_eq!(noisy.len(), clean.len());

        let decoded = Decoder::new(&base).unwrap().decode(&noisy).unwrap();
        assert_eq!(decoded.bits.len(), 8, "level {}", level);
        assert!(decoded.bits.is_binary());

        let comparison = Comparison::new(&[0x41], &decoded.bytes);
        assert!(comparison.bit_errors <= 8);
    }
}

#[test]
fn test_level_zero_noise_is_identity() {
    let config = ModemConfig::default();
    let clean = Encoder::new(&config).unwrap().encode(b"identity");
    let mut rng = StdRng::seed_from_u64(0);
    let out = apply_noise(
        &clean.samples,
        clean.sample_rate,
        NoiseLevel::NONE,
        &config.band,
        &mut rng,
    );
    assert_eq!(out, clean.samples);
}

#[test]
fn test_wav_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("message.wav");
    let config = ModemConfig::default();

    let waveform = Encoder::new(&config).unwrap().encode(b"file round trip");
    write_wav(&path, &waveform).unwrap();
    assert_eq!(read_wav(&path).unwrap(), waveform);

    let decoded = Decoder::new(&config).unwrap().decode_file(&path).unwrap();
    assert_eq!(decoded.bytes, b"file round trip");
}

#[test]
fn test_decode_missing_file_is_hard_failure() {
    let dir = tempfile::tempdir().unwrap();
    let decoder = Decoder::new(&ModemConfig::default()).unwrap();
    let result = decoder.decode_file(dir.path().join("nope.wav"));
    assert!(matches!(result, Err(ModemError::ResourceNotFound(_))));
}

#[test]
fn test_band_missing_carriers_is_rejected() {
    let config = ModemConfig {
        band: FrequencyBand::BELL_202,
        ..config(8000, 100.0, CarrierPair::LEGACY)
    };
    assert!(matches!(config.validate(), Err(ModemError::InvalidConfig(_))));
    assert!(Encoder::new(&config).is_err());
    assert!(Decoder::new(&config).is_err());
}
