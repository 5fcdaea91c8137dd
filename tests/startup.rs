use std::net::{Ipv4Addr, TcpListener};
use std::process::{Command, Output};

/// A free port: bind to 0, read it back, release it.
fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
    listener.local_addr().expect("addr").port()
}

fn run_relay(vars: &[(&str, &str)], port: u16) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_server"));
    cmd.env_clear()
        .current_dir(std::env::temp_dir())
        .env("CONFIG_PATH", "/nonexistent-config-for-tests.toml")
        .env("SERVER_HOST", "127.0.0.1")
        .env("PORT", port.to_string());
    for (k, v) in vars {
        cmd.env(k, v);
    }
    cmd.output().expect("spawn relay binary")
}

fn assert_refused(vars: &[(&str, &str)], missing: &str) {
    let port = free_port();
    let out = run_relay(vars, port);
    assert!(!out.status.success(), "relay started without {missing}");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(missing), "stderr did not name {missing}: {stderr}");
    // Port is still free: the relay never bound it.
    assert!(TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok());
}

#[test]
fn refuses_to_start_without_weather_key() {
    assert_refused(&[("UNSPLASH_API_KEY", "p")], "OPENWEATHER_API_KEY");
}

#[test]
fn refuses_to_start_without_photo_key() {
    assert_refused(&[("OPENWEATHER_API_KEY", "w")], "UNSPLASH_API_KEY");
}

#[test]
fn refuses_to_start_with_blank_key() {
    assert_refused(&[("OPENWEATHER_API_KEY", "w"), ("UNSPLASH_API_KEY", "")], "UNSPLASH_API_KEY");
}
