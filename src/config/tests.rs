use super::*;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_committee_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("COMMITTEE_PORT");
        env::remove_var("COMMITTEE_BIND_ADDR");
        env::remove_var("COMMITTEE_BACKENDS");
        env::remove_var("COMMITTEE_API_KEY_OPENAI");
        env::remove_var("COMMITTEE_API_KEY_LOCAL_LLM");
        env::remove_var("COMMITTEE_SCORER_TIMEOUT_SECS");
        env::remove_var("COMMITTEE_MAX_OUTPUT_TOKENS");
        env::remove_var("COMMITTEE_PRICING_PATH");
        env::remove_var("COMMITTEE_RUBRICS_PATH");
        env::remove_var("COMMITTEE_RECORDER_CAPACITY");
        env::remove_var("COMMITTEE_CACHE_CAPACITY");
        env::remove_var("COMMITTEE_CACHE_SWEEP_SECS");
        env::remove_var("COMMITTEE_HIGH_DISAGREEMENT");
        env::remove_var("COMMITTEE_UNANIMOUS_BELOW");
        env::remove_var("COMMITTEE_SLOW_PROCESSING_MS");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.backends.len(), 1);
    assert_eq!(config.backends[0].name, "openai");
    assert_eq!(config.scorer_timeout, Duration::from_secs(45));
    assert_eq!(config.max_output_tokens, 2000);
    assert!(config.pricing_path.is_none());
    assert!(config.rubrics_path.is_none());
    assert_eq!(config.recorder_capacity, 10_000);
    assert_eq!(config.cache_capacity, 10_000);
    assert_eq!(config.cache_sweep_interval, Duration::from_secs(300));
    assert_eq!(config.qc_thresholds.high_disagreement, 0.2);
    assert_eq!(config.qc_thresholds.unanimous_below, 0.1);
    assert_eq!(config.qc_thresholds.slow_processing_ms, 30_000);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_committee_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 8080);
    assert_eq!(config.backends[0].base_url, "https://api.openai.com/v1");
    assert!(config.backends[0].api_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_committee_env();

    with_env_vars(&[("COMMITTEE_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_from_env_ipv6_bind_addr() {
    clear_committee_env();

    with_env_vars(&[("COMMITTEE_BIND_ADDR", "::1")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(
            config.bind_addr,
            IpAddr::V6(std::net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    });
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_committee_env();

    with_env_vars(&[("COMMITTEE_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_committee_env();

    with_env_vars(&[("COMMITTEE_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_committee_env();

    with_env_vars(&[("COMMITTEE_BIND_ADDR", "not.an.ip.address")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
    });
}

#[test]
#[serial]
fn test_from_env_backends_with_api_keys() {
    clear_committee_env();

    with_env_vars(
        &[
            (
                "COMMITTEE_BACKENDS",
                "openai=https://api.openai.com/v1/, local-llm=http://localhost:11434/v1",
            ),
            ("COMMITTEE_API_KEY_OPENAI", "sk-test"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.backends.len(), 2);
            assert_eq!(config.backends[0].name, "openai");
            assert_eq!(config.backends[0].base_url, "https://api.openai.com/v1");
            assert_eq!(config.backends[0].api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.backends[1].name, "local-llm");
            assert_eq!(config.backends[1].base_url, "http://localhost:11434/v1");
            assert!(config.backends[1].api_key.is_none());
        },
    );
}

#[test]
fn test_api_key_var_names() {
    assert_eq!(Config::api_key_var("openai"), "COMMITTEE_API_KEY_OPENAI");
    assert_eq!(Config::api_key_var("local-llm"), "COMMITTEE_API_KEY_LOCAL_LLM");
}

#[test]
#[serial]
fn test_invalid_backends() {
    clear_committee_env();

    for raw in [
        "openai",
        "=https://api.openai.com/v1",
        "openai=not a url",
        "openai=ftp://example.com",
        "a=http://x.test,a=http://y.test",
    ] {
        let err = Config::parse_backends(raw).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidBackend { .. }),
            "{} -> {:?}",
            raw,
            err
        );
    }

    assert!(matches!(
        Config::parse_backends(" , "),
        Err(ConfigError::NoBackends)
    ));
}

#[test]
#[serial]
fn test_from_env_numeric_overrides() {
    clear_committee_env();

    with_env_vars(
        &[
            ("COMMITTEE_SCORER_TIMEOUT_SECS", "10"),
            ("COMMITTEE_MAX_OUTPUT_TOKENS", "512"),
            ("COMMITTEE_RECORDER_CAPACITY", "50"),
            ("COMMITTEE_CACHE_CAPACITY", "2500"),
            ("COMMITTEE_CACHE_SWEEP_SECS", "60"),
            ("COMMITTEE_HIGH_DISAGREEMENT", "0.35"),
            ("COMMITTEE_UNANIMOUS_BELOW", "0.05"),
            ("COMMITTEE_SLOW_PROCESSING_MS", "12000"),
        ],
        || {
            let config = Config::from_env().expect("should parse");

            assert_eq!(config.scorer_timeout, Duration::from_secs(10));
            assert_eq!(config.max_output_tokens, 512);
            assert_eq!(config.recorder_capacity, 50);
            assert_eq!(config.cache_capacity, 2500);
            assert_eq!(config.cache_sweep_interval, Duration::from_secs(60));
            assert_eq!(config.qc_thresholds.high_disagreement, 0.35);
            assert_eq!(config.qc_thresholds.unanimous_below, 0.05);
            assert_eq!(config.qc_thresholds.slow_processing_ms, 12_000);
        },
    );
}

#[test]
#[serial]
fn test_from_env_invalid_numbers_use_defaults() {
    clear_committee_env();

    with_env_vars(
        &[
            ("COMMITTEE_RECORDER_CAPACITY", "lots"),
            ("COMMITTEE_HIGH_DISAGREEMENT", "high"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.recorder_capacity, 10_000);
            assert_eq!(config.qc_thresholds.high_disagreement, 0.2);
        },
    );
}

#[test]
fn test_validate_rejects_zero_values() {
    let config = Config {
        scorer_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            name: "COMMITTEE_SCORER_TIMEOUT_SECS",
            ..
        })
    ));

    let config = Config {
        recorder_capacity: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let config = Config {
        cache_capacity: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            name: "COMMITTEE_CACHE_CAPACITY",
            ..
        })
    ));

    let config = Config {
        backends: Vec::new(),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NoBackends)));
}

#[test]
fn test_validate_rejects_negative_thresholds() {
    let mut config = Config::default();
    config.qc_thresholds.high_disagreement = -0.1;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("COMMITTEE_HIGH_DISAGREEMENT"));
}

#[test]
fn test_validate_file_paths() {
    let dir = tempfile::tempdir().unwrap();

    let config = Config {
        pricing_path: Some(dir.path().join("missing.json")),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));

    let config = Config {
        rubrics_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NotAFile { .. })));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[]").unwrap();
    let config = Config {
        rubrics_path: Some(PathBuf::from(file.path())),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_backend_debug_redacts_key() {
    let backend = BackendConfig {
        name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key: Some("sk-secret".into()),
    };
    let debug = format!("{:?}", backend);
    assert!(!debug.contains("sk-secret"));
    assert!(debug.contains("redacted"));
}
