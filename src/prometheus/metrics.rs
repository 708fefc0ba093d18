use crate::acquisition::AcquisitionStats;
use crate::ubx::CarrierSolution;
use crate::ubx::FixType;

use prometheus::Gauge;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;

/// Gauges mirroring the merged acquisition statistics.
#[derive(Clone)]
pub struct Metrics {
    messages_logged: IntGauge,
    bytes_logged: IntGauge,
    correction_bytes: IntGauge,
    parse_errors: IntGauge,
    samples_written: IntGauge,
    satellites: IntGauge,
    fix_type: IntGauge,
    carrier_solution: IntGauge,
    time_offset: Gauge,
    caster_connected: IntGauge,
}

fn int_gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    let gauge = IntGauge::with_opts(Opts::new(name, help).namespace("ppk_logger"))?;
    registry.register(Box::new(gauge.clone()))?;

    Ok(gauge)
}

impl Metrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let time_offset = Gauge::with_opts(
            Opts::new("time_offset_seconds", "System clock minus receiver time")
                .namespace("ppk_logger"),
        )?;
        registry.register(Box::new(time_offset.clone()))?;

        Ok(Metrics {
            messages_logged: int_gauge(registry, "messages_logged", "UBX frames logged")?,
            bytes_logged: int_gauge(registry, "bytes_logged", "Bytes written to the UBX log")?,
            correction_bytes: int_gauge(
                registry,
                "correction_bytes_relayed",
                "RTCM bytes written to the receiver",
            )?,
            parse_errors: int_gauge(registry, "parse_errors", "Frames with undecodable payloads")?,
            samples_written: int_gauge(
                registry,
                "time_samples_written",
                "Rows written to the time correlation log",
            )?,
            satellites: int_gauge(registry, "satellites", "Satellites used in the latest fix")?,
            fix_type: int_gauge(registry, "fix_type", "Fix type of the latest fix")?,
            carrier_solution: int_gauge(
                registry,
                "carrier_solution",
                "Carrier solution of the latest fix, 0 none, 1 float, 2 fixed",
            )?,
            time_offset,
            caster_connected: int_gauge(
                registry,
                "caster_connected",
                "1 while the correction stream is connected",
            )?,
        })
    }

    pub fn update(&self, stats: &AcquisitionStats) {
        self.messages_logged.set(stats.messages_logged as i64);
        self.bytes_logged.set(stats.bytes_logged as i64);
        self.correction_bytes.set(stats.correction_bytes_relayed as i64);
        self.parse_errors.set(stats.parse_errors as i64);
        self.samples_written.set(stats.samples_written as i64);
        self.caster_connected.set(stats.caster_connected as i64);

        if let Some(offset) = stats.time_offset {
            self.time_offset.set(offset);
        }

        if let Some(fix) = &stats.latest_fix {
            self.satellites.set(fix.num_satellites.into());
            self.fix_type.set(fix_type_value(fix.fix_type));
            self.carrier_solution.set(carrier_value(fix.carrier_solution));
        }
    }
}

fn fix_type_value(fix_type: FixType) -> i64 {
    match fix_type {
        FixType::NoFix => 0,
        FixType::DeadReckoning => 1,
        FixType::Fix2D => 2,
        FixType::Fix3D => 3,
        FixType::GnssPlusDeadReckoning => 4,
        FixType::TimeOnly => 5,
        FixType::Unknown(u) => u.into(),
    }
}

fn carrier_value(carrier: CarrierSolution) -> i64 {
    match carrier {
        CarrierSolution::None => 0,
        CarrierSolution::Float => 1,
        CarrierSolution::Fixed => 2,
        CarrierSolution::Unknown(u) => u.into(),
    }
}
