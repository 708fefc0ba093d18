use crate::configuration::*;

use std::convert::TryFrom;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;
use tempfile::TempDir;

use tokio_serial::DataBits;
use tokio_serial::FlowControl;
use tokio_serial::Parity;
use tokio_serial::StopBits;

use tracing_subscriber::filter::EnvFilter;

fn write(content: &str) -> Result<(PathBuf, TempDir), io::Error> {
    let dir = tempdir()?;
    let path = dir.path().join("ppk_logger.toml");

    let mut file = fs::File::create(path.clone())?;

    file.write_all(content.as_bytes())?;

    Ok((path, dir))
}

fn receiver(framing: Option<&str>, flow_control: Option<&str>) -> ReceiverConfig {
    ReceiverConfig {
        device: "/dev/ttyAMA4".to_string(),
        baud_rate: None,
        framing: framing.map(String::from),
        flow_control: flow_control.map(String::from),
        timeout: None,
    }
}

#[test]
fn test_config() {
    let (path, _dir) = write(
        r#"
log_filter = "ppk_logger=debug"

[receiver]
device = "/dev/ttyAMA4"
baud_rate = 230400

[caster]
host = "192.168.1.213"
mountpoint = "sheep"
username = "user"
password = "secret"

[output]
directory = "/tmp/gps"

[prometheus]
bind_address = "0.0.0.0:9948"
    "#,
    )
    .unwrap();

    let config = Configuration::load(path).unwrap();

    let expected = Configuration {
        log_filter: Some("ppk_logger=debug".to_string()),
        receiver: ReceiverConfig {
            device: "/dev/ttyAMA4".to_string(),
            baud_rate: Some(230_400),
            framing: None,
            flow_control: None,
            timeout: None,
        },
        caster: Some(CasterConfig {
            host: "192.168.1.213".to_string(),
            port: None,
            mountpoint: "sheep".to_string(),
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            timeout: None,
        }),
        output: OutputConfig {
            directory: Some("/tmp/gps".to_string()),
            prefix: None,
            status_interval: None,
        },
        prometheus: Some(PrometheusConfig {
            bind_address: "0.0.0.0:9948".to_string(),
        }),
    };

    assert_eq!(expected, config);

    let caster = config.caster.unwrap();
    assert_eq!(2101, caster.port());
    assert_eq!(Some(("user", "secret")), caster.credentials());
    assert_eq!("192.168.1.213:2101/sheep", caster.to_string());
    assert!(!format!("{:?}", caster).contains("secret"));
}

#[test]
fn test_config_minimal() {
    let (path, _dir) = write(
        r#"
[receiver]
device = "/dev/ttyACM0"
    "#,
    )
    .unwrap();

    let config = Configuration::load(path).unwrap();

    assert_eq!(None, config.caster);
    assert_eq!(None, config.prometheus);
    assert_eq!(PathBuf::from("/opt/gps/data"), config.output.directory());
    assert_eq!("gps_log", config.output.prefix());
    assert_eq!(Duration::from_secs(2), config.output.status_interval());
}

#[test]
fn test_config_missing_receiver() {
    let (path, _dir) = write("log_filter = \"info\"\n").unwrap();

    assert!(matches!(
        Configuration::load(path),
        Err(ConfigurationError::De(_))
    ));
}

#[test]
fn test_config_missing_file() {
    let dir = tempdir().unwrap();

    assert!(matches!(
        Configuration::load(dir.path().join("missing.toml")),
        Err(ConfigurationError::Io(_))
    ));
}

#[test]
fn test_credentials_require_both() {
    let mut caster = CasterConfig {
        host: "caster".to_string(),
        port: Some(2102),
        mountpoint: "MOUNT".to_string(),
        username: Some("user".to_string()),
        password: Some(String::new()),
        timeout: None,
    };

    assert_eq!(None, caster.credentials());

    caster.password = None;
    assert_eq!(None, caster.credentials());
}

#[test]
fn test_try_from_receiver_config() {
    let receiver = ReceiverConfig {
        device: "/dev/ttyAMA4".to_string(),
        baud_rate: Some(115_200),
        framing: Some("7O2".to_string()),
        flow_control: Some("H".to_string()),
        timeout: Some(250),
    };

    let settings = SerialSettings::try_from(&receiver).unwrap();

    let expected = SerialSettings {
        device: "/dev/ttyAMA4".to_string(),
        baud_rate: 115_200,
        data_bits: DataBits::Seven,
        flow_control: FlowControl::Hardware,
        parity: Parity::Odd,
        stop_bits: StopBits::Two,
        timeout: Duration::from_millis(250),
    };

    assert_eq!(expected, settings);
}

#[test]
fn test_try_from_receiver_config_defaults() {
    let settings = SerialSettings::try_from(&receiver(None, None)).unwrap();

    assert_eq!(460_800, settings.baud_rate);
    assert_eq!(DataBits::Eight, settings.data_bits);
    assert_eq!(Parity::None, settings.parity);
    assert_eq!(StopBits::One, settings.stop_bits);
    assert_eq!(FlowControl::None, settings.flow_control);
    assert_eq!(Duration::from_secs(1), settings.timeout);
}

#[test]
fn test_try_from_receiver_config_errors() {
    let error = |framing, flow_control| {
        SerialSettings::try_from(&receiver(framing, flow_control))
            .unwrap_err()
            .to_string()
    };

    assert_eq!(
        "framing 8N must be three characters, data bits, parity, stop bits",
        error(Some("8N"), None)
    );
    assert_eq!(
        "data bits 9 must be 8, 7, 6, or 5",
        error(Some("9N1"), None)
    );
    assert_eq!(
        "parity X must be N(one), O(dd), or E(ven)",
        error(Some("8X1"), None)
    );
    assert_eq!("stop bits 3 must be 1 or 2", error(Some("8N3"), None));
    assert_eq!(
        "flow control Q must be H(ardware), S(oftware), or N(one)",
        error(None, Some("Q"))
    );
}

#[test]
fn test_env_filter() {
    let (path, _dir) = write(
        r#"
log_filter = "ppk_logger=loud"

[receiver]
device = "/dev/ttyAMA4"
    "#,
    )
    .unwrap();

    let config = Configuration::load(path).unwrap();

    assert!(matches!(
        EnvFilter::try_from(&config),
        Err(ConfigurationError::InvalidLogFilter(_, _))
    ));
}
