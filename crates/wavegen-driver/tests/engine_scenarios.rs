//! End-to-end engine behaviour over the software model
//!
//! Every scenario drives the public API only and checks the register
//! traffic the model recorded.

use std::time::Duration;

use wavegen_driver::backends::SoftwareBackend;
use wavegen_driver::{
    regs, wait_for_reconfig, Channel, ChannelParameters, ErrorKind, Lane, PackedField,
    PollConfig, Preset, Register, Request, Wavegen, WaveformMode, MAX_ARB_SAMPLES,
};

fn engine() -> Wavegen<SoftwareBackend> {
    Wavegen::new(SoftwareBackend::new())
}

fn model(wg: &Wavegen<SoftwareBackend>) -> &SoftwareBackend {
    wg.backend().expect("backend attached")
}

fn sine_1khz() -> ChannelParameters {
    ChannelParameters {
        mode: WaveformMode::Sine,
        frequency: 10_000_000,
        amplitude: 32_767,
        offset: 0,
        duty_cycle: 32_768,
        phase_offset: 0,
        cycles: 0,
    }
}

#[test]
fn test_configure_and_start_channel_a() {
    let mut wg = engine();
    wg.configure(Channel::A, &sine_1khz()).unwrap();
    wg.start(Channel::A).unwrap();

    let m = model(&wg);
    let mode = m.active(Register::Mode);
    assert_eq!(PackedField::MODE.unpack(mode, Lane::A), 1);
    assert_eq!(m.active(Register::FrequencyA), 10_000_000);
    assert_eq!(m.active(Register::Amplitude) & 0xFFFF, 32_767);
    assert_eq!(m.run_bits() & 1, 1);
    assert_eq!(m.writes_to(regs::TRIGGER), vec![0b01]);

    // Channel B untouched
    assert_eq!(PackedField::MODE.unpack(mode, Lane::B), 0);
    assert_eq!(m.active(Register::FrequencyB), 0);
    for reg in [Register::Amplitude, Register::Offset, Register::DutyCycle, Register::Phase, Register::Cycles] {
        assert_eq!(PackedField::HALF_WORD.unpack(m.active(reg), Lane::B), 0, "{}", reg.name());
    }
    assert_eq!(m.run_bits() & 0b10, 0);
    assert!(m.is_running(Lane::A));
    assert!(!m.is_running(Lane::B));
}

#[test]
fn test_configure_write_order() {
    let mut wg = engine();
    wg.configure(Channel::B, &sine_1khz()).unwrap();
    let offsets: Vec<usize> = model(&wg).writes().iter().map(|&(o, _)| o).collect();
    assert_eq!(
        offsets,
        vec![
            regs::MODE,
            regs::FREQ_B,
            regs::AMPLITUDE,
            regs::OFFSET,
            regs::DUTY_CYCLE,
            regs::PHASE,
            regs::CYCLES,
            regs::RECONFIG,
        ]
    );
}

#[test]
fn test_staged_values_are_not_active_until_apply() {
    let mut wg = engine();
    wg.set_mode(Channel::A, WaveformMode::Triangle).unwrap();
    wg.set_frequency(Channel::A, 5_000).unwrap();
    wg.set_amplitude(Channel::A, 1_000).unwrap();

    let m = model(&wg);
    assert_eq!(m.active(Register::Mode), 0);
    assert_eq!(m.active(Register::FrequencyA), 0);
    assert_eq!(m.active(Register::Amplitude), 0);
    assert_eq!(m.shadow(Register::FrequencyA), 5_000);
    assert_eq!(m.reconfig_count(), 0);

    wg.apply().unwrap();
    let m = model(&wg);
    assert_eq!(m.active(Register::Mode), 3);
    assert_eq!(m.active(Register::FrequencyA), 5_000);
    assert_eq!(m.active(Register::Amplitude), 1_000);
    assert_eq!(m.reconfig_count(), 1);
}

#[test]
fn test_both_equals_a_then_b() {
    let mut both = engine();
    both.set_frequency(Channel::Both, 123_456).unwrap();
    both.set_phase_offset(Channel::Both, -4_500).unwrap();

    let mut split = engine();
    split.set_frequency(Channel::A, 123_456).unwrap();
    split.set_frequency(Channel::B, 123_456).unwrap();
    split.set_phase_offset(Channel::A, -4_500).unwrap();
    split.set_phase_offset(Channel::B, -4_500).unwrap();

    assert_eq!(model(&both).writes(), model(&split).writes());
    assert_eq!(both.shadow(Lane::A), split.shadow(Lane::A));
    assert_eq!(both.shadow(Lane::B), split.shadow(Lane::B));
}

#[test]
fn test_packing_leaves_sibling_field_intact() {
    let mut wg = engine();
    wg.set_duty_cycle(Channel::B, 0xBEEF).unwrap();
    wg.set_duty_cycle(Channel::A, 0x1234).unwrap();
    wg.set_duty_cycle(Channel::A, 0x0042).unwrap();
    let raw = model(&wg).shadow(Register::DutyCycle);
    assert_eq!(PackedField::HALF_WORD.unpack(raw, Lane::A), 0x0042);
    assert_eq!(PackedField::HALF_WORD.unpack(raw, Lane::B), 0xBEEF);
}

#[test]
fn test_phase_boundaries() {
    let mut wg = engine();
    wg.set_phase_offset(Channel::A, 18_000).unwrap();
    wg.set_phase_offset(Channel::A, -18_000).unwrap();
    assert_eq!(
        wg.set_phase_offset(Channel::A, 18_001).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert_eq!(
        wg.set_phase_offset(Channel::A, -18_001).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    let raw = model(&wg).shadow(Register::Phase);
    assert_eq!(PackedField::HALF_WORD.unpack_signed(raw, Lane::A), -18_000);
}

#[test]
fn test_mode_boundaries() {
    let mut wg = engine();
    wg.set_mode_raw(Channel::B, 5).unwrap();
    assert_eq!(
        wg.set_mode_raw(Channel::B, 6).unwrap_err().kind(),
        ErrorKind::InvalidParameter
    );
    assert_eq!(wg.shadow(Lane::B).mode, WaveformMode::Arbitrary);
}

#[test]
fn test_bulk_load_limits() {
    let mut wg = engine();
    assert_eq!(wg.load_waveform(&[], 0).unwrap_err().kind(), ErrorKind::InvalidParameter);

    let too_many = vec![1u16; MAX_ARB_SAMPLES + 1];
    assert_eq!(wg.load_waveform(&too_many, 0).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert!(model(&wg).writes().is_empty());

    let full: Vec<u16> = (0..4096u16).collect();
    wg.load_waveform(&full, 0).unwrap();
    let m = model(&wg);
    assert_eq!(m.arb_depth(), 4096);
    assert_eq!(&m.samples()[..4096], full.as_slice());

    let indices: Vec<usize> = m.writes()[..4096].iter().map(|&(o, _)| o).collect();
    let expected: Vec<usize> = (0..4096).map(regs::arb_sample_offset).collect();
    assert_eq!(indices, expected);
    assert_eq!(m.writes()[4096], (regs::ARB_DEPTH, 4096));
}

#[test]
fn test_generated_sine_loads_into_arb_memory() {
    let mut wg = engine();
    let samples = wavegen_driver::waveform::sine_samples(256, 20_000);
    wg.load_waveform(&samples, 0).unwrap();
    wg.set_mode(Channel::Both, WaveformMode::Arbitrary).unwrap();
    wg.apply().unwrap();
    assert_eq!(model(&wg).active(Register::Mode), 0x55);
    assert_eq!(model(&wg).arb_depth(), 256);
}

#[test]
fn test_configure_stops_at_first_failure() {
    let mut wg = engine();
    // mode, frequency and amplitude succeed; offset write fails
    wg.backend_mut().unwrap().fail_after_writes(3);
    let err = wg.configure(Channel::A, &sine_1khz()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);

    let m = model(&wg);
    assert_eq!(m.reconfig_count(), 0);
    assert!(m.writes_to(regs::DUTY_CYCLE).is_empty());
    assert_eq!(m.shadow(Register::FrequencyA), 10_000_000);
    assert_eq!(wg.shadow(Lane::A).amplitude, 32_767);
    assert_eq!(wg.applied(Lane::A).frequency, 0);
}

#[test]
fn test_operations_fail_after_close() {
    let mut wg = engine();
    wg.apply_preset(Channel::A, Preset::Square1k).unwrap();
    assert!(wg.close().is_some());

    assert_eq!(wg.trigger(Channel::A).unwrap_err().kind(), ErrorKind::NotInitialized);
    assert_eq!(wg.load_waveform(&[1], 0).unwrap_err().kind(), ErrorKind::NotInitialized);
    assert_eq!(wg.get_status().unwrap_err().kind(), ErrorKind::NotInitialized);
    assert!(wg.close().is_none());
}

#[test]
fn test_wait_for_reconfig_after_apply() {
    let mut wg = Wavegen::new(SoftwareBackend::new().with_reconfig_latency(4));
    wg.apply_preset(Channel::Both, Preset::Triangle1k).unwrap();
    assert!(wg.get_status().unwrap().reconfig_busy);

    let poll = PollConfig {
        max_attempts: 10,
        interval: Duration::ZERO,
    };
    let status = wait_for_reconfig(&wg, &poll).unwrap();
    assert!(!status.reconfig_busy);
}

#[test]
fn test_request_sequence_matches_direct_calls() {
    let mut via_requests = engine();
    for req in [
        Request::SetMode { channel: 0, mode: 4 },
        Request::SetDutyCycle { channel: 0, duty_cycle: 16_384 },
        Request::Apply,
        Request::Enable { channel: 2, on: true },
        Request::Trigger { channel: 2 },
    ] {
        req.execute(&mut via_requests).unwrap();
    }

    let mut direct = engine();
    direct.set_mode(Channel::A, WaveformMode::Square).unwrap();
    direct.set_duty_cycle(Channel::A, 16_384).unwrap();
    direct.apply().unwrap();
    direct.start(Channel::Both).unwrap();

    assert_eq!(model(&via_requests).writes(), model(&direct).writes());
}

#[test]
fn test_boxed_backend_drives_engine() {
    let backend = wavegen_driver::select_backend(
        wavegen_driver::BackendSelection::Software,
        &wavegen_driver::DriverConfig::default(),
    )
    .unwrap();
    let mut wg = Wavegen::new(backend);
    wg.apply_preset(Channel::B, Preset::Sawtooth1k).unwrap();
    wg.start(Channel::B).unwrap();
    assert!(wg.get_status().unwrap().channel_b_running);
}
