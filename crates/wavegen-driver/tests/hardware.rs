//! Register-level checks against real hardware
//!
//! Run on the target with `cargo test -- --ignored`.

use wavegen_driver::backends::{KernelBackend, MmapBackend};
use wavegen_driver::{
    select_backend, BackendSelection, Channel, DriverConfig, Preset, RegisterBackend, Wavegen,
};

#[test]
#[ignore] // Requires hardware
fn test_kernel_backend_status() {
    let wg: Wavegen<KernelBackend> =
        Wavegen::open(&DriverConfig::default()).expect("Kernel backend init");
    let status = wg.get_status().expect("status read");
    assert!(status.ready);
    println!("Kernel backend: {status}");
}

#[test]
#[ignore] // Requires hardware
fn test_mmap_backend_status() {
    let wg: Wavegen<MmapBackend> =
        Wavegen::open(&DriverConfig::default()).expect("Mmap backend init");
    assert!(wg.get_status().expect("status read").ready);
}

#[test]
#[ignore] // Requires hardware
fn test_backend_parity_after_preset() {
    let config = DriverConfig::default();
    let mut wg = Wavegen::new(select_backend(BackendSelection::Kernel, &config).expect("kernel"));
    wg.apply_preset(Channel::A, Preset::Sine1k).expect("preset");
    let via_kernel = wg.backend().unwrap().read_register(wavegen_driver::regs::FREQ_A).unwrap();

    let mmap = MmapBackend::open(&config).expect("mmap");
    let via_mmap = mmap.read_register(wavegen_driver::regs::FREQ_A).unwrap();
    assert_eq!(via_kernel, via_mmap, "Frequency readback mismatch");
}
