use std::env;

const DEFAULT_MCU_FREQ_HZ: &str = "16000000";

fn main() {
    println!("cargo:rerun-if-env-changed=MCU_FREQ_HZ");

    // Pass CPU frequency for tick-rate calculations
    let freq = env::var("MCU_FREQ_HZ").unwrap_or_else(|_| DEFAULT_MCU_FREQ_HZ.to_owned());
    if freq.parse::<u32>().is_err() {
        panic!("MCU_FREQ_HZ must be an integer frequency in Hz, got {:?}", freq);
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", freq);

    // Host builds only run the unit and integration tests
    let target = env::var("TARGET").unwrap();
    if !target.contains("avr") {
        return;
    }

    println!("cargo:rustc-link-arg=-mmcu=atmega328p");
    println!("cargo:warning=Building for ATmega328P at {}Hz", freq);
}
