//! Configure channel A for a 1 kHz sine and start it
//!
//! Uses the backend named by `WAVEGEN_BACKEND` (default: auto).

use wavegen_driver::{
    select_backend, wait_for_reconfig, Channel, DriverConfig, Preset, RegisterBackend, Result,
    Wavegen,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("wavegen_driver=debug")
        .init();

    let config = DriverConfig::from_env()?;
    let backend = select_backend(config.backend, &config)?;
    println!("Backend: {}", backend.backend_type());

    let mut wg = Wavegen::new(backend);
    wg.apply_preset(Channel::A, Preset::Sine1k)?;
    let status = wait_for_reconfig(&wg, &config.poll)?;
    println!("Applied: {status}");

    wg.start(Channel::A)?;
    println!("Running: {}", wg.get_status()?);
    Ok(())
}
