use crate::configuration::ConfigurationError;

use serde::Deserialize;

use std::convert::TryFrom;
use std::time::Duration;

use tokio_serial::DataBits;
use tokio_serial::FlowControl;
use tokio_serial::Parity;
use tokio_serial::SerialPortBuilder;
use tokio_serial::StopBits;

pub const DEFAULT_BAUD_RATE: u32 = 460_800;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ReceiverConfig {
    pub device: String,
    pub baud_rate: Option<u32>,
    pub framing: Option<String>,
    pub flow_control: Option<String>,
    /// read timeout in milliseconds
    pub timeout: Option<u64>,
}

/// Validated serial line settings for the receiver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerialSettings {
    pub device: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub flow_control: FlowControl,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn builder(&self) -> SerialPortBuilder {
        tokio_serial::new(self.device.clone(), self.baud_rate)
            .data_bits(self.data_bits)
            .flow_control(self.flow_control)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .timeout(self.timeout)
    }
}

impl TryFrom<&ReceiverConfig> for SerialSettings {
    type Error = ConfigurationError;

    fn try_from(receiver: &ReceiverConfig) -> Result<SerialSettings, ConfigurationError> {
        let mut data_bits = DataBits::Eight;
        let mut flow_control = FlowControl::None;
        let mut parity = Parity::None;
        let mut stop_bits = StopBits::One;

        if let Some(f) = &receiver.framing {
            let framing: Vec<char> = f.chars().collect();

            let (d, p, s) = match framing[..] {
                [d, p, s] => (d, p, s),
                _ => return Err(ConfigurationError::InvalidFraming(f.clone())),
            };

            data_bits = match d {
                '8' => DataBits::Eight,
                '7' => DataBits::Seven,
                '6' => DataBits::Six,
                '5' => DataBits::Five,
                _ => return Err(ConfigurationError::InvalidDataBits(d)),
            };

            parity = match p {
                'N' => Parity::None,
                'O' => Parity::Odd,
                'E' => Parity::Even,
                _ => return Err(ConfigurationError::InvalidParity(p)),
            };

            stop_bits = match s {
                '1' => StopBits::One,
                '2' => StopBits::Two,
                _ => return Err(ConfigurationError::InvalidStopBits(s)),
            };
        }

        if let Some(f) = &receiver.flow_control {
            flow_control = match f.as_str() {
                "H" => FlowControl::Hardware,
                "S" => FlowControl::Software,
                "N" => FlowControl::None,
                _ => return Err(ConfigurationError::InvalidFlowControl(f.clone())),
            };
        }

        Ok(SerialSettings {
            device: receiver.device.clone(),
            baud_rate: receiver.baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
            data_bits,
            flow_control,
            parity,
            stop_bits,
            timeout: Duration::from_millis(receiver.timeout.unwrap_or(1_000)),
        })
    }
}
